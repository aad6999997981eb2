//! Conversation history sources

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::types::Message;

/// Where prior turns for a user come from
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Ordered history for `user_id`, oldest first
    async fn conversation_history(&self, user_id: &str) -> Result<Vec<Message>>;
}

/// Process-local history keyed by user id
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    conversations: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, user_id: &str, message: Message) {
        self.conversations
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(message);
    }

    pub async fn clear(&self, user_id: &str) {
        self.conversations.write().await.remove(user_id);
    }
}

#[async_trait]
impl HistorySource for InMemoryHistory {
    async fn conversation_history(&self, user_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .conversations
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_keeps_order_per_user() {
        let store = InMemoryHistory::new();
        store.append("U1", Message::user("hi")).await;
        store.append("U2", Message::user("other")).await;
        store.append("U1", Message::assistant("hello")).await;

        let history = store.conversation_history("U1").await.unwrap();
        assert_eq!(history, vec![Message::user("hi"), Message::assistant("hello")]);
        assert_eq!(store.conversation_history("U2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user_is_empty() {
        let store = InMemoryHistory::new();
        assert!(store.conversation_history("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let store = InMemoryHistory::new();
        store.append("U1", Message::user("hi")).await;
        store.clear("U1").await;
        assert!(store.conversation_history("U1").await.unwrap().is_empty());
    }
}
