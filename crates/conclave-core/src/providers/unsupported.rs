//! Placeholder adapter for providers without a client (meta, x)

use async_trait::async_trait;

use crate::error::{PanelError, Result};

use super::types::{ChatProvider, ChatRequest, ProviderKind};

/// Fails every call with [`PanelError::UnsupportedProvider`] before any I/O
#[derive(Debug, Clone, Copy)]
pub struct UnsupportedProvider {
    kind: ProviderKind,
}

impl UnsupportedProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl ChatProvider for UnsupportedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn generate(&self, _request: &ChatRequest<'_>) -> Result<String> {
        Err(PanelError::UnsupportedProvider(self.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ResponseFormat;
    use crate::types::Message;

    #[tokio::test]
    async fn test_generate_fails_fast_naming_provider() {
        let provider = UnsupportedProvider::new(ProviderKind::Meta);
        let history = vec![Message::user("hello")];
        let request = ChatRequest {
            model: "llama-3",
            system_prompt: "sys",
            history: &history,
            response_format: ResponseFormat::Text,
        };
        let err = provider.generate(&request).await.unwrap_err();
        assert!(matches!(err, PanelError::UnsupportedProvider(ProviderKind::Meta)));
        assert!(err.to_string().contains("meta"));
    }
}
