//! Error types for panel construction and orchestration runs

use thiserror::Error;

use crate::providers::ProviderKind;

/// Result alias used across conclave-core
pub type Result<T> = std::result::Result<T, PanelError>;

/// Everything that can abort registry loading or an orchestration run.
///
/// Nothing here is retried. A failure mid-run leaves already-emitted turns
/// delivered; the caller only loses the final answer.
#[derive(Error, Debug)]
pub enum PanelError {
    /// Missing credential, unknown agent, or incomplete panel
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Panel definition could not be read or parsed
    #[error("Panel definition error: {0}")]
    Panel(String),

    /// Transport, rate-limit, or malformed-response failure from a backend
    #[error("Provider error ({provider}): {source:#}")]
    Provider {
        provider: ProviderKind,
        #[source]
        source: anyhow::Error,
    },

    /// Provider kind is known but has no client implementation
    #[error("Provider unsupported: {0}")]
    UnsupportedProvider(ProviderKind),

    /// The caller's turn callback failed
    #[error("Turn delivery failed: {0:#}")]
    Delivery(#[source] anyhow::Error),

    /// A fan-out task panicked or was cancelled
    #[error("Agent task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PanelError {
    pub fn provider(provider: ProviderKind, source: impl Into<anyhow::Error>) -> Self {
        Self::Provider {
            provider,
            source: source.into(),
        }
    }

    /// Whether this is a startup/first-use configuration problem
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Panel(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_provider_error_display_includes_source() {
        let err = PanelError::provider(ProviderKind::OpenAi, anyhow!("status 429: slow down"));
        let text = err.to_string();
        assert!(text.contains("openai"));
        assert!(text.contains("429"));
    }

    #[test]
    fn test_unsupported_names_provider() {
        let err = PanelError::UnsupportedProvider(ProviderKind::Meta);
        assert_eq!(err.to_string(), "Provider unsupported: meta");
    }

    #[test]
    fn test_is_configuration() {
        assert!(PanelError::Configuration("x".into()).is_configuration());
        assert!(PanelError::Panel("bad json".into()).is_configuration());
        assert!(!PanelError::UnsupportedProvider(ProviderKind::X).is_configuration());
        assert!(!PanelError::Delivery(anyhow!("boom")).is_configuration());
    }
}
