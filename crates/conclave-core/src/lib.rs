//! conclave-core - multi-agent response construction
//!
//! This crate provides:
//! - A provider layer that hides OpenAI, Anthropic and Gemini message-shaping rules
//! - Agents binding a model, a system prompt and a provider
//! - A registry that loads the fixed agent panel once at startup
//! - The response constructor: judge, optional expert fan-out, summarizer

pub mod agent;
pub mod agents;
pub mod constructor;
pub mod error;
pub mod history;
pub mod judge;
pub mod markdown;
pub mod providers;
pub mod types;

// Re-export main types for convenience
pub use agent::Agent;
pub use agents::{AgentRegistry, AgentSpec, PanelDefinition, PanelEntry};
pub use constructor::{
    ConstructorConfig, EXPERTS, REQUIRED_AGENTS, RecordingSink, Response, ResponseConstructor,
    TurnSink,
};
pub use error::{PanelError, Result};
pub use history::{HistorySource, InMemoryHistory};
pub use judge::Route;
pub use markdown::normalize_emphasis;
pub use providers::{
    ChatProvider, ChatRequest, ProviderKind, ProviderSettings, ProvidersConfig, ResponseFormat,
};
pub use types::{Message, Role, ThreadMessage, Trace};
