//! Assistant boundary.
//!
//! The remote language model is an injected capability behind
//! [`AssistantClient`], so the chat and screening flow can be exercised
//! without a live network dependency. The contract is infallible: every
//! implementation returns a usable [`AssistantReply`], downgrading transport
//! or parse failures to a fixed fallback, never an error.

mod remote;

pub use remote::RemoteAssistant;

use crate::models::{Message, MessageRole};

/// One turn of conversation history as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// What the assistant produced for a turn: the text to show, and optionally
/// the name of a medication it proposed, which must be screened before it is
/// allowed to stand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub reply_text: String,
    pub suggested_medication: Option<String>,
}

impl AssistantReply {
    /// The reply used whenever the real assistant cannot answer.
    pub fn fallback() -> Self {
        Self {
            reply_text: "I could not respond right now.".to_string(),
            suggested_medication: None,
        }
    }
}

/// A conversational assistant. `patient_context` is a one-line summary of
/// the user's active allergies, included with every request.
pub trait AssistantClient {
    fn reply(&self, history: &[ChatTurn], patient_context: &str) -> AssistantReply;

    /// Provider name for display purposes.
    fn name(&self) -> &str;
}
