//! Judge verdict parsing. Decides between the simple and the complex path

use serde::{Deserialize, Serialize};

/// Which path a run takes after the judge has spoken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// One general agent answers directly
    Simple,
    /// Fan out to the expert panel, then summarize
    Complex,
}

#[derive(Deserialize)]
struct JudgeOutput {
    #[serde(alias = "is_simple")]
    simple: bool,
}

/// Two-character prefixes (lowercased) that read as an affirmative "true"
const AFFIRMATIVE_PREFIXES: &[&str] = &["tr", "'t", "\"t", " t"];

impl Route {
    /// Classify judge output.
    ///
    /// A JSON object with a boolean `simple` (or `is_simple`) field decides
    /// directly. Anything else falls back to prefix matching: the text after
    /// the last `:` is simple when its first two characters read as the start
    /// of `true`, bare or quoted.
    pub fn from_judge_output(output: &str) -> Self {
        if let Ok(parsed) = serde_json::from_str::<JudgeOutput>(output.trim()) {
            return Self::from_flag(parsed.simple);
        }

        let tail = output.rsplit(':').next().unwrap_or(output);
        let prefix: String = tail.chars().take(2).collect::<String>().to_lowercase();
        Self::from_flag(AFFIRMATIVE_PREFIXES.contains(&prefix.as_str()))
    }

    fn from_flag(simple: bool) -> Self {
        if simple { Self::Simple } else { Self::Complex }
    }

    pub fn is_simple(&self) -> bool {
        matches!(self, Self::Simple)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::Simple => "simple",
            Self::Complex => "complex",
        })
    }
}
