//! Agent specs and the declarative panel definition they are loaded from

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PanelError, Result};
use crate::providers::{ProviderKind, ResponseFormat};

/// Immutable description of one panel agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub model_id: String,
    pub system_prompt: String,
    pub provider: ProviderKind,
    pub response_format: ResponseFormat,
}

/// One entry of a panel file, keyed by agent name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelEntry {
    pub model_name: String,
    pub prompt: String,
    pub api_provider: ProviderKind,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl PanelEntry {
    pub fn into_spec(self, name: impl Into<String>) -> AgentSpec {
        AgentSpec {
            name: name.into(),
            model_id: self.model_name,
            system_prompt: self.prompt,
            provider: self.api_provider,
            response_format: self.response_format,
        }
    }
}

/// Mapping of agent name to its entry.
///
/// Accepts the JSON shape
/// `{"Judge": {"model_name": ..., "prompt": ..., "api_provider": ..., "response_format": ...}}`
/// or the equivalent TOML tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelDefinition {
    entries: BTreeMap<String, PanelEntry>,
}

impl PanelDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, name: impl Into<String>, entry: PanelEntry) -> Self {
        self.entries.insert(name.into(), entry);
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| PanelError::Panel(format!("invalid panel JSON: {}", e)))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| PanelError::Panel(format!("invalid panel TOML: {}", e)))
    }

    /// Load a panel file; `.toml` files are parsed as TOML, everything else as JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PanelError::Panel(format!("failed to read panel file {}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PanelEntry> {
        self.entries.get(name)
    }

    /// Providers referenced by at least one entry, deduplicated and sorted
    pub fn providers(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<ProviderKind> =
            self.entries.values().map(|e| e.api_provider).collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// Specs in name order
    pub fn into_specs(self) -> Vec<AgentSpec> {
        self.entries
            .into_iter()
            .map(|(name, entry)| entry.into_spec(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PANEL_JSON: &str = r#"{
        "Judge": {
            "model_name": "gpt-4o-mini",
            "prompt": "Decide if the question is simple.",
            "api_provider": "openai",
            "response_format": "json_object"
        },
        "Friend": {
            "model_name": "claude-3-5-sonnet-20240620",
            "prompt": "Be a friend.",
            "api_provider": "Anthropic",
            "response_format": "text"
        }
    }"#;

    #[test]
    fn test_from_json_str() {
        let panel = PanelDefinition::from_json_str(PANEL_JSON).unwrap();
        assert_eq!(panel.len(), 2);
        let judge = panel.get("Judge").unwrap();
        assert_eq!(judge.api_provider, ProviderKind::OpenAi);
        assert_eq!(judge.response_format, ResponseFormat::Json);
        assert_eq!(panel.get("Friend").unwrap().api_provider, ProviderKind::Anthropic);
    }

    #[test]
    fn test_response_format_defaults_to_text() {
        let panel = PanelDefinition::from_json_str(
            r#"{"General Agent": {"model_name": "m", "prompt": "p", "api_provider": "google"}}"#,
        )
        .unwrap();
        assert_eq!(panel.get("General Agent").unwrap().response_format, ResponseFormat::Text);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = PanelDefinition::from_json_str(
            r#"{"A": {"model_name": "m", "prompt": "p", "api_provider": "cohere"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PanelError::Panel(_)));
    }

    #[test]
    fn test_from_toml_str() {
        let panel = PanelDefinition::from_toml_str(
            r#"
            ["Career Advisor"]
            model_name = "gemini-1.5-flash"
            prompt = "Advise on careers."
            api_provider = "google"
            "#,
        )
        .unwrap();
        let spec = panel.into_specs().remove(0);
        assert_eq!(spec.name, "Career Advisor");
        assert_eq!(spec.model_id, "gemini-1.5-flash");
        assert_eq!(spec.provider, ProviderKind::Google);
    }

    #[test]
    fn test_providers_deduplicated() {
        let panel = PanelDefinition::from_json_str(PANEL_JSON)
            .unwrap()
            .with_entry(
                "Other",
                PanelEntry {
                    model_name: "gpt-4o".into(),
                    prompt: "p".into(),
                    api_provider: ProviderKind::OpenAi,
                    response_format: ResponseFormat::Text,
                },
            );
        assert_eq!(panel.providers(), vec![ProviderKind::OpenAi, ProviderKind::Anthropic]);
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("agents.json");
        std::fs::File::create(&json_path)
            .unwrap()
            .write_all(PANEL_JSON.as_bytes())
            .unwrap();
        assert_eq!(PanelDefinition::load(&json_path).unwrap().len(), 2);

        let toml_path = dir.path().join("agents.toml");
        std::fs::write(
            &toml_path,
            "[Judge]\nmodel_name = \"m\"\nprompt = \"p\"\napi_provider = \"x\"\n",
        )
        .unwrap();
        let panel = PanelDefinition::load(&toml_path).unwrap();
        assert_eq!(panel.get("Judge").unwrap().api_provider, ProviderKind::X);
    }

    #[test]
    fn test_load_missing_file() {
        let err = PanelDefinition::load(Path::new("/nonexistent/agents.json")).unwrap_err();
        assert!(err.is_configuration());
    }
}
