//! Explicit provider credentials and adapter construction

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{PanelError, Result};

use super::anthropic::AnthropicProvider;
use super::google::GoogleProvider;
use super::openai::OpenAiProvider;
use super::types::{ChatProvider, ProviderKind};
use super::unsupported::UnsupportedProvider;

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Credentials and endpoint for one provider
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ProviderSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Empty keys and `${VAR}` placeholders that were never expanded count as absent
    pub fn has_credential(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && !key.contains("${")
    }

    pub(crate) fn http_client(&self, kind: ProviderKind) -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| {
                PanelError::Configuration(format!("failed to build HTTP client for {}: {}", kind, e))
            })
    }

    pub(crate) fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &mask_secret(&self.api_key))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Credentials for every provider the panel may use
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: Option<ProviderSettings>,
    #[serde(default)]
    pub anthropic: Option<ProviderSettings>,
    #[serde(default)]
    pub google: Option<ProviderSettings>,
}

impl ProvidersConfig {
    pub fn settings(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
        match kind {
            ProviderKind::OpenAi => self.openai.as_ref(),
            ProviderKind::Anthropic => self.anthropic.as_ref(),
            ProviderKind::Google => self.google.as_ref(),
            ProviderKind::Meta | ProviderKind::X => None,
        }
    }

    /// Construct the adapter for `kind`, failing if its credential is absent
    pub fn build(&self, kind: ProviderKind) -> Result<Arc<dyn ChatProvider>> {
        if !kind.is_supported() {
            return Ok(Arc::new(UnsupportedProvider::new(kind)));
        }

        let settings = self
            .settings(kind)
            .filter(|s| s.has_credential())
            .ok_or_else(|| {
                PanelError::Configuration(format!(
                    "missing API key for provider '{}' (set {})",
                    kind,
                    credential_env_var(kind)
                ))
            })?;

        let provider: Arc<dyn ChatProvider> = match kind {
            ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(settings)?),
            ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(settings)?),
            ProviderKind::Google => Arc::new(GoogleProvider::new(settings)?),
            ProviderKind::Meta | ProviderKind::X => Arc::new(UnsupportedProvider::new(kind)),
        };
        Ok(provider)
    }
}

/// Conventional environment variable holding each provider's key
pub fn credential_env_var(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OpenAi => "OPENAI_API_KEY",
        ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        ProviderKind::Google => "GEMINI_API_KEY",
        ProviderKind::Meta => "META_API_KEY",
        ProviderKind::X => "XAI_API_KEY",
    }
}

/// Mask a secret for Debug output: first 3 and last 4 chars of longer keys, otherwise "***".
pub fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "(empty)".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > 7 {
        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "***".to_string()
    }
}
