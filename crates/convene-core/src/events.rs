//! SessionEvent enum — broadcast from a ChatSession to frontends via tokio::broadcast.

use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;
use crate::types::ModelResponseStatus;

/// Events broadcast from a chat session to all subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum SessionEvent {
    /// A message was added to the chat history.
    #[serde(rename = "message")]
    Message(ChatMessage),

    /// An awaited reply did not arrive within the timeout window.
    #[serde(rename = "response_timed_out")]
    ResponseTimedOut,

    /// A mediator took a turn and posted a reply.
    #[serde(rename = "mediator_responded")]
    MediatorResponded { agent_id: String },

    /// A mediator took a turn but chose not to (or could not) post.
    #[serde(rename = "mediator_silent")]
    MediatorSilent {
        agent_id: String,
        status: ModelResponseStatus,
    },

    /// Chat history was cleared.
    #[serde(rename = "cleared")]
    Cleared,
}

impl SessionEvent {
    /// Serialize to the JSON format frontends expect:
    /// `{"event": "...", "data": {...}}`
    pub fn to_ws_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
