//! Shared types for conclave-core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most recent history entries that enter one orchestration run
pub const CONSTRUCTOR_WINDOW: usize = 20;

/// Most recent history entries that enter any single provider call
pub const PROVIDER_WINDOW: usize = 10;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        })
    }
}

/// One entry of a conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// The trailing `window` entries of `history`
pub fn recent(history: &[Message], window: usize) -> &[Message] {
    let start = history.len().saturating_sub(window);
    &history[start..]
}

/// One turn emitted during an orchestration run.
///
/// `role` is an agent label ("Judge", "Friend (gpt-4o)") rather than a [`Role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub role: String,
    pub content: String,
}

impl ThreadMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Ordered turns of one run, each paired with its emission time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    messages: Vec<ThreadMessage>,
    timestamps: Vec<DateTime<Utc>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ThreadMessage, timestamp: DateTime<Utc>) {
        self.messages.push(message);
        self.timestamps.push(timestamp);
    }

    pub fn messages(&self) -> &[ThreadMessage] {
        &self.messages
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Role labels in emission order
    pub fn roles(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.role.as_str()).collect()
    }

    pub fn into_parts(self) -> (Vec<ThreadMessage>, Vec<DateTime<Utc>>) {
        (self.messages, self.timestamps)
    }
}
