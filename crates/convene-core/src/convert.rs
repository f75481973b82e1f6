//! Converting chat history to role-based prompt messages.
//!
//! Private one-on-one chats map cleanly onto the user/assistant roles that
//! chat-completion APIs expect; the roles flip depending on whose turn is
//! being generated. Group chats fall back to a flat text prompt, so the
//! converter returns nothing for them.

use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;
use crate::types::UserType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One entry of a role-based prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatToMessageOptions {
    pub is_private_chat: bool,
    pub include_system_prompt: bool,
}

/// Convert chat history to user/assistant messages from the perspective
/// of `current_user_type` (the side whose reply is being generated).
///
/// Group chats return an empty list — callers fall back to a text prompt.
pub fn convert_chat_to_messages(
    history: &[ChatMessage],
    current_user_type: UserType,
    options: &ChatToMessageOptions,
) -> Vec<ConversationMessage> {
    if !options.is_private_chat {
        return Vec::new();
    }

    let mut messages = Vec::with_capacity(history.len());
    for msg in history {
        let (role, content) = match msg.user_type {
            UserType::Participant => {
                // Participant messages are "user" from the mediator's side.
                let role = if current_user_type == UserType::Mediator {
                    MessageRole::User
                } else {
                    MessageRole::Assistant
                };
                (role, msg.message.clone())
            }
            UserType::Mediator => {
                let role = if current_user_type == UserType::Mediator {
                    MessageRole::Assistant
                } else {
                    MessageRole::User
                };
                (role, msg.message.clone())
            }
            UserType::System => {
                // Prefixed so the model can tell these apart from real
                // user messages.
                (
                    MessageRole::User,
                    format!("[SYSTEM NOTIFICATION]: {}", msg.message),
                )
            }
            // Experimenter and unknown messages are skipped for now.
            _ => continue,
        };

        let name = if msg.profile.name.is_empty() {
            if msg.sender_id.is_empty() {
                None
            } else {
                Some(msg.sender_id.clone())
            }
        } else {
            Some(msg.profile.name.clone())
        };

        messages.push(ConversationMessage {
            role,
            content,
            name,
        });
    }

    messages
}

/// Build a full role-based prompt: optional leading system message plus
/// the converted conversation history.
pub fn build_message_prompt(
    system_prompt: &str,
    history: &[ChatMessage],
    current_user_type: UserType,
    options: &ChatToMessageOptions,
) -> Vec<ConversationMessage> {
    let mut messages = Vec::new();

    if options.include_system_prompt && !system_prompt.is_empty() {
        messages.push(ConversationMessage::new(MessageRole::System, system_prompt));
    }

    messages.extend(convert_chat_to_messages(history, current_user_type, options));
    messages
}

/// Whether a chat should use the role-based message format.
///
/// Only true one-on-one private chats qualify; multiple mediators create
/// conflicting "assistant" messages that break API conversation flow.
pub fn should_use_message_format(
    is_private_chat: bool,
    allow_message_format: bool,
    participant_count: usize,
    mediator_count: usize,
) -> bool {
    is_private_chat && allow_message_format && participant_count == 1 && mediator_count == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParticipantProfile;

    fn private() -> ChatToMessageOptions {
        ChatToMessageOptions {
            is_private_chat: true,
            include_system_prompt: true,
        }
    }

    fn history() -> Vec<ChatMessage> {
        vec![
            ChatMessage::participant("hi there", "p-1", ParticipantProfile::new("Cat", "🐱")),
            ChatMessage::mediator("hello! ready to start?", "agent-1"),
            ChatMessage::system("Participant Dog joined"),
        ]
    }

    #[test]
    fn test_group_chat_returns_empty() {
        let options = ChatToMessageOptions::default();
        let messages = convert_chat_to_messages(&history(), UserType::Mediator, &options);
        assert!(messages.is_empty());
    }

    #[test]
    fn test_roles_from_mediator_perspective() {
        let messages = convert_chat_to_messages(&history(), UserType::Mediator, &private());
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[2].role, MessageRole::User);
        assert_eq!(
            messages[2].content,
            "[SYSTEM NOTIFICATION]: Participant Dog joined"
        );
    }

    #[test]
    fn test_roles_flip_from_participant_perspective() {
        let messages = convert_chat_to_messages(&history(), UserType::Participant, &private());
        assert_eq!(messages[0].role, MessageRole::Assistant);
        assert_eq!(messages[1].role, MessageRole::User);
    }

    #[test]
    fn test_experimenter_messages_are_skipped() {
        let mut h = history();
        h.push(ChatMessage::experimenter("wrap it up"));
        let messages = convert_chat_to_messages(&h, UserType::Mediator, &private());
        assert_eq!(messages.len(), 3);
    }

    #[test]
    fn test_speaker_name_prefers_profile() {
        let messages = convert_chat_to_messages(&history(), UserType::Mediator, &private());
        assert_eq!(messages[0].name.as_deref(), Some("Cat"));
    }

    #[test]
    fn test_build_message_prompt_prepends_system() {
        let messages =
            build_message_prompt("You are a mediator.", &history(), UserType::Mediator, &private());
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].content, "You are a mediator.");
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn test_should_use_message_format() {
        assert!(should_use_message_format(true, true, 1, 1));
        assert!(!should_use_message_format(false, true, 1, 1));
        assert!(!should_use_message_format(true, false, 1, 1));
        assert!(!should_use_message_format(true, true, 2, 1));
        assert!(!should_use_message_format(true, true, 1, 2));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ConversationMessage::new(MessageRole::Assistant, "hi");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert!(value.get("name").is_none());
    }
}
