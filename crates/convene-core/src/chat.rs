//! Chat message types and constructors (used in chat stages).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{generate_id, ParticipantProfile, UserType};

/// Sender id for messages manually sent by the experimenter. Kept stable
/// so every such message renders with the same background color.
pub const EXPERIMENTER_MANUAL_CHAT_SENDER_ID: &str = "experimenter";

/// A single chat message, as stored per cohort and stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    /// Discussion during which the message was sent, if the stage has
    /// threaded discussions.
    pub discussion_id: Option<String>,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub profile: ParticipantProfile,
    /// Participant public id or mediator public id.
    pub sender_id: String,
    /// Agent persona used, or blank if none.
    pub agent_id: String,
    /// Agent reasoning, or blank if none.
    pub explanation: String,
}

impl ChatMessage {
    fn base(user_type: UserType, message: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            discussion_id: None,
            user_type,
            message: message.into(),
            timestamp: Utc::now(),
            profile: ParticipantProfile::default(),
            sender_id: String::new(),
            agent_id: String::new(),
            explanation: String::new(),
        }
    }

    /// Message from a human (or agent) participant.
    pub fn participant(
        message: impl Into<String>,
        sender_id: impl Into<String>,
        profile: ParticipantProfile,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            profile,
            ..Self::base(UserType::Participant, message)
        }
    }

    /// Message from an agent mediator.
    pub fn mediator(message: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            profile: ParticipantProfile {
                name: "Agent".into(),
                avatar: "🤖".into(),
                pronouns: None,
            },
            ..Self::base(UserType::Mediator, message)
        }
    }

    /// Message sent manually by the experimenter.
    pub fn experimenter(message: impl Into<String>) -> Self {
        Self {
            sender_id: EXPERIMENTER_MANUAL_CHAT_SENDER_ID.into(),
            profile: ParticipantProfile {
                name: "Mediator".into(),
                avatar: "⭐".into(),
                pronouns: None,
            },
            ..Self::base(UserType::Experimenter, message)
        }
    }

    /// System notification injected into the conversation.
    pub fn system(message: impl Into<String>) -> Self {
        Self::base(UserType::System, message)
    }

    pub fn with_discussion(mut self, discussion_id: impl Into<String>) -> Self {
        self.discussion_id = Some(discussion_id.into());
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// Send time as seconds since the Unix epoch (the timestamp format
    /// the response timeout tracker consumes).
    pub fn timestamp_seconds(&self) -> f64 {
        self.timestamp.timestamp_millis() as f64 / 1000.0
    }
}
