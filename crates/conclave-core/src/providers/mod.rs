//! Multi-provider LLM abstraction layer
//!
//! Supports OpenAI, Anthropic and Google Gemini. Each backend implements the
//! [`ChatProvider`] trait and hides its own message-shaping rules behind
//! `generate(system_prompt, history, format)`. Meta and X are recognised but
//! fail fast.

pub mod anthropic;
pub mod google;
pub mod openai;
pub mod settings;
pub mod types;
pub mod unsupported;

pub use settings::{ProviderSettings, ProvidersConfig, credential_env_var, mask_secret};
pub use types::{ChatProvider, ChatRequest, ProviderKind, ResponseFormat};
