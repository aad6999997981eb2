//! A panel agent: one model, one system prompt, one provider adapter

use std::sync::Arc;

use tracing::debug;

use crate::agents::AgentSpec;
use crate::error::Result;
use crate::markdown::normalize_emphasis;
use crate::providers::{ChatProvider, ChatRequest};
use crate::types::Message;

/// Runtime agent bound to a shared provider adapter.
///
/// Holds no per-call state, so one instance serves concurrent runs.
pub struct Agent {
    spec: AgentSpec,
    provider: Arc<dyn ChatProvider>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("spec", &self.spec)
            .field("provider", &self.provider.kind())
            .finish()
    }
}

impl Agent {
    pub fn new(spec: AgentSpec, provider: Arc<dyn ChatProvider>) -> Self {
        Self { spec, provider }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Label used for this agent's turns in a trace, e.g. `Friend (gpt-4o)`
    pub fn trace_label(&self) -> String {
        format!("{} ({})", self.spec.name, self.spec.model_id)
    }

    /// Answer the given history
    pub async fn answer(&self, history: &[Message]) -> Result<String> {
        let request = ChatRequest {
            model: &self.spec.model_id,
            system_prompt: &self.spec.system_prompt,
            history,
            response_format: self.spec.response_format,
        };

        debug!(
            "Agent '{}' calling {} ({}) with {} messages",
            self.spec.name,
            self.spec.provider,
            self.spec.model_id,
            history.len()
        );

        let raw = self.provider.generate(&request).await?;
        let text = normalize_emphasis(&raw);

        debug!("Agent '{}' answered ({} chars)", self.spec.name, text.len());
        Ok(text)
    }
}
