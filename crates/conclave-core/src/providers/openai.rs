//! OpenAI chat completions provider

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PanelError, Result};
use crate::types::{Message, PROVIDER_WINDOW, recent};

use super::settings::ProviderSettings;
use super::types::{ChatProvider, ChatRequest, ProviderKind, ResponseFormat};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI provider
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        Ok(Self {
            client: settings.http_client(ProviderKind::OpenAi)?,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url_or(DEFAULT_BASE_URL),
        })
    }

    /// System prompt first, then the last ten history entries as-is
    fn to_openai_messages(history: &[Message], system: &str) -> Vec<OpenAiMessage> {
        let mut result = vec![OpenAiMessage {
            role: "system".to_string(),
            content: system.to_string(),
        }];
        result.extend(recent(history, PROVIDER_WINDOW).iter().map(|m| OpenAiMessage {
            role: m.role.to_string(),
            content: m.content.clone(),
        }));
        result
    }

    fn response_format_type(format: ResponseFormat) -> &'static str {
        match format {
            ResponseFormat::Text => "text",
            ResponseFormat::Json => "json_object",
        }
    }

    fn from_openai_response(resp: OpenAiApiResponse) -> anyhow::Result<String> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("OpenAI response had no choices"))?;

        choice
            .message
            .content
            .ok_or_else(|| anyhow!("OpenAI response had no message content"))
    }

    async fn send(&self, request: &ChatRequest<'_>) -> anyhow::Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let messages = Self::to_openai_messages(request.history, request.system_prompt);

        let body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "response_format": {"type": Self::response_format_type(request.response_format)},
        });

        debug!(
            "OpenAI request: model={}, messages={}, format={}",
            request.model,
            messages.len(),
            request.response_format
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "OpenAI API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let api_response: OpenAiApiResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI API response")?;

        debug!(
            "OpenAI response: choices={}, finish_reason={:?}",
            api_response.choices.len(),
            api_response.choices.first().map(|c| &c.finish_reason)
        );

        Self::from_openai_response(api_response)
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn generate(&self, request: &ChatRequest<'_>) -> Result<String> {
        self.send(request)
            .await
            .map_err(|e| PanelError::provider(ProviderKind::OpenAi, e))
    }
}

// ── OpenAI wire types ──

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiApiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiChoiceMessage {
    content: Option<String>,
}
