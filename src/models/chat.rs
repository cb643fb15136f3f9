//! Chat conversation models persisted in the local store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Millisecond timestamp used as a local identity.
    pub id: i64,
    pub role: Role,
    pub content: String,
    pub ts: DateTime<Utc>,
    /// Set when the message stands in for a failed assistant reply.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl ChatMessage {
    pub fn new(id: i64, role: Role, content: impl Into<String>) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            ts: Utc::now(),
            error: false,
        }
    }
}

/// A titled conversation with an ordered message list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    /// Milliseconds since the Unix epoch.
    pub updated_at: i64,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn find_message_mut(&mut self, id: i64) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().find(|m| m.id == id)
    }
}

/// Wire format message sent to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(m: &ChatMessage) -> Self {
        Self {
            role: m.role,
            content: m.content.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_flag_only_serialized_when_set() {
        let mut msg = ChatMessage::new(1, Role::Assistant, "hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("error").is_none());
        msg.error = true;
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["error"], true);
        assert_eq!(json["role"], "assistant");
    }
}
