//! Google Gemini provider

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PanelError, Result};
use crate::types::{Message, PROVIDER_WINDOW, Role, recent};

use super::settings::ProviderSettings;
use super::types::{ChatProvider, ChatRequest, ProviderKind};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini provider
pub struct GoogleProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// A chat session: prior turns plus the turn being sent now.
///
/// Gemini's REST endpoint is stateless, so "open a session with the history
/// and send the final entry" becomes one request whose contents are the
/// session history followed by the new user turn.
#[derive(Debug, Clone)]
struct GeminiSession {
    history: Vec<GeminiContent>,
}

impl GeminiSession {
    fn start(history: Vec<GeminiContent>) -> Self {
        Self { history }
    }

    fn send_message(mut self, text: &str) -> Vec<GeminiContent> {
        self.history.push(GeminiContent::new("user", text));
        self.history
    }
}

impl GoogleProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        Ok(Self {
            client: settings.http_client(ProviderKind::Google)?,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url_or(DEFAULT_BASE_URL),
        })
    }

    fn gemini_role(role: Role) -> &'static str {
        match role {
            Role::Assistant => "model",
            Role::User | Role::System => "user",
        }
    }

    /// Split the capped history into session turns and the final turn.
    /// Returns `None` when there is nothing to send.
    fn split_history(history: &[Message]) -> Option<(GeminiSession, &str)> {
        let (last, earlier) = recent(history, PROVIDER_WINDOW).split_last()?;
        let session = GeminiSession::start(
            earlier
                .iter()
                .map(|m| GeminiContent::new(Self::gemini_role(m.role), &m.content))
                .collect(),
        );
        Some((session, last.content.as_str()))
    }

    fn from_gemini_response(resp: GeminiApiResponse) -> anyhow::Result<String> {
        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Gemini response had no candidates"))?;

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            return Err(anyhow!(
                "Gemini response had no text (finish_reason={:?})",
                candidate.finish_reason
            ));
        }
        Ok(text)
    }

    async fn send(&self, request: &ChatRequest<'_>) -> anyhow::Result<String> {
        let (session, final_turn) = Self::split_history(request.history)
            .ok_or_else(|| anyhow!("Gemini request needs at least one message"))?;
        let contents = session.send_message(final_turn);

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );

        let body = serde_json::json!({
            "contents": contents,
            "systemInstruction": {
                "parts": [{"text": request.system_prompt}]
            },
        });

        debug!(
            "Gemini request: model={}, contents={}",
            request.model,
            contents.len()
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "Gemini API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let api_response: GeminiApiResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        debug!(
            "Gemini response: candidates={}",
            api_response.candidates.len()
        );

        Self::from_gemini_response(api_response)
    }
}

#[async_trait]
impl ChatProvider for GoogleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn generate(&self, request: &ChatRequest<'_>) -> Result<String> {
        self.send(request)
            .await
            .map_err(|e| PanelError::provider(ProviderKind::Google, e))
    }
}

// ── Gemini wire types ──

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn new(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![GeminiPart {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiApiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn roles(contents: &[GeminiContent]) -> Vec<&str> {
        contents.iter().map(|c| c.role.as_str()).collect()
    }

    #[test]
    fn test_split_maps_assistant_to_model() {
        let history = vec![
            Message::user("hi"),
            Message::assistant("hello"),
            Message::user("how are you?"),
        ];
        let (session, last) = GoogleProvider::split_history(&history).unwrap();
        assert_eq!(roles(&session.history), vec!["user", "model"]);
        assert_eq!(session.history[1].parts[0].text.as_deref(), Some("hello"));
        assert_eq!(last, "how are you?");
    }

    #[test]
    fn test_final_entry_never_in_session_history() {
        let history = vec![Message::user("only")];
        let (session, last) = GoogleProvider::split_history(&history).unwrap();
        assert!(session.history.is_empty());
        assert_eq!(last, "only");
    }

    #[test]
    fn test_split_caps_before_splitting() {
        let history: Vec<Message> = (0..14).map(|i| Message::user(i.to_string())).collect();
        let (session, last) = GoogleProvider::split_history(&history).unwrap();
        assert_eq!(session.history.len(), 9);
        assert_eq!(session.history[0].parts[0].text.as_deref(), Some("4"));
        assert_eq!(last, "13");
    }

    #[test]
    fn test_split_empty_history() {
        assert!(GoogleProvider::split_history(&[]).is_none());
    }

    #[test]
    fn test_send_message_appends_user_turn() {
        let session = GeminiSession::start(vec![GeminiContent::new("model", "earlier")]);
        let contents = session.send_message("now");
        assert_eq!(roles(&contents), vec!["model", "user"]);
    }

    #[test]
    fn test_from_gemini_response_no_candidates() {
        let resp = GeminiApiResponse { candidates: vec![] };
        assert!(GoogleProvider::from_gemini_response(resp).is_err());
    }

    #[test]
    fn test_google_provider_debug_hides_key() {
        let provider = GoogleProvider::new(&ProviderSettings::new("AIza-secret")).unwrap();
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("AIza-secret"));
    }

    #[tokio::test]
    async fn test_generate_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "AIza-test"))
            .and(body_partial_json(json!({
                "systemInstruction": {"parts": [{"text": "You are a friend."}]},
                "contents": [
                    {"role": "user", "parts": [{"text": "hi"}]},
                    {"role": "model", "parts": [{"text": "hey"}]},
                    {"role": "user", "parts": [{"text": "bad day"}]}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "**Sorry** to hear"}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let settings = ProviderSettings::new("AIza-test").with_base_url(server.uri());
        let provider = GoogleProvider::new(&settings).unwrap();
        let history = vec![
            Message::user("hi"),
            Message::assistant("hey"),
            Message::user("bad day"),
        ];
        let request = ChatRequest {
            model: "gemini-1.5-flash",
            system_prompt: "You are a friend.",
            history: &history,
            response_format: crate::providers::ResponseFormat::Text,
        };
        // Emphasis normalization happens one layer up, in the agent.
        assert_eq!(provider.generate(&request).await.unwrap(), "**Sorry** to hear");
    }

    #[tokio::test]
    async fn test_generate_empty_history_fails_without_request() {
        let provider = GoogleProvider::new(&ProviderSettings::new("AIza-test")).unwrap();
        let request = ChatRequest {
            model: "gemini-1.5-flash",
            system_prompt: "sys",
            history: &[],
            response_format: crate::providers::ResponseFormat::Text,
        };
        let err = provider.generate(&request).await.unwrap_err();
        assert!(matches!(err, PanelError::Provider { provider: ProviderKind::Google, .. }));
    }

    #[tokio::test]
    async fn test_generate_drops_response_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "{}"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let settings = ProviderSettings::new("AIza-test").with_base_url(server.uri());
        let provider = GoogleProvider::new(&settings).unwrap();
        let history = vec![Message::user("reply in json")];
        let request = ChatRequest {
            model: "gemini-1.5-flash",
            system_prompt: "sys",
            history: &history,
            response_format: crate::providers::ResponseFormat::Json,
        };
        provider.generate(&request).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"contents"));
        assert!(keys.contains(&"systemInstruction"));
    }
}
