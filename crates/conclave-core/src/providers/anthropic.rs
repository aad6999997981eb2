//! Anthropic Claude provider

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PanelError, Result};
use crate::types::{Message, PROVIDER_WINDOW, Role, recent};

use super::settings::ProviderSettings;
use super::types::{ChatProvider, ChatRequest, ProviderKind};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.8;

/// Anthropic Claude provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("base_url", &self.base_url)
            .field("max_tokens", &MAX_TOKENS)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        Ok(Self {
            client: settings.http_client(ProviderKind::Anthropic)?,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url_or(DEFAULT_BASE_URL),
        })
    }

    /// Reshape history into strictly alternating turns starting with `user`.
    ///
    /// Entries before the first user turn are skipped. Runs of the same role
    /// are merged with a blank line between them. System entries travel as
    /// user turns since the system prompt has its own parameter.
    fn to_anthropic_messages(history: &[Message]) -> Vec<AnthropicMessage> {
        let mut result: Vec<AnthropicMessage> = Vec::new();

        for msg in history {
            let role = match msg.role {
                Role::Assistant => "assistant",
                Role::User | Role::System => "user",
            };

            if result.is_empty() && role != "user" {
                continue;
            }

            if let Some(last) = result.last_mut().filter(|last| last.role == role) {
                let block = &mut last.content[0];
                block.text.push_str("\n\n");
                block.text.push_str(&msg.content);
                continue;
            }

            result.push(AnthropicMessage {
                role: role.to_string(),
                content: vec![AnthropicBlock::text(&msg.content)],
            });
        }

        result
    }

    fn from_anthropic_response(resp: AnthropicApiResponse) -> anyhow::Result<String> {
        resp.content
            .into_iter()
            .find(|b| b.block_type == "text")
            .map(|b| b.text)
            .ok_or_else(|| anyhow!("Anthropic response had no text content"))
    }

    async fn send(&self, request: &ChatRequest<'_>) -> anyhow::Result<String> {
        let url = format!("{}/v1/messages", self.base_url);
        let messages = Self::to_anthropic_messages(recent(request.history, PROVIDER_WINDOW));

        // No output-shape parameter exists on this API; the format is dropped.
        let body = serde_json::json!({
            "model": request.model,
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "system": request.system_prompt,
            "messages": messages,
        });

        debug!(
            "Anthropic request: model={}, messages={}",
            request.model,
            messages.len()
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "Anthropic API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let api_response: AnthropicApiResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic API response")?;

        debug!(
            "Anthropic response: blocks={}, stop_reason={:?}",
            api_response.content.len(),
            api_response.stop_reason
        );

        Self::from_anthropic_response(api_response)
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn generate(&self, request: &ChatRequest<'_>) -> Result<String> {
        self.send(request)
            .await
            .map_err(|e| PanelError::provider(ProviderKind::Anthropic, e))
    }
}

// ── Anthropic wire types ──

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

impl AnthropicBlock {
    fn text(text: &str) -> Self {
        Self {
            block_type: "text".to_string(),
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicApiResponse {
    content: Vec<AnthropicBlock>,
    stop_reason: Option<String>,
}
