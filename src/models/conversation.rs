use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a chat message. Exactly two values exist in the store; anything
/// else is rejected by the schema CHECK as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// A chat session. Created lazily on the first outgoing message; deleted only
/// by explicit user confirmation (cascading to messages and recommendations).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub user_id: i64,
    pub started_at: DateTime<Utc>,
    pub reason: String,
    pub status: String,
}

/// One message in a conversation. Ordering within a conversation is by the
/// monotonic id, not `created_at`, so clock skew cannot reorder history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub created_at: DateTime<Utc>,
    pub role: MessageRole,
    pub content: String,
}
