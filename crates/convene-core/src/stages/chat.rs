//! Chat stage configuration — discussions and mediators.

use serde::{Deserialize, Serialize};

use super::BaseStageConfig;
use crate::types::generate_id;

/// A discussion thread within a chat stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatDiscussion {
    /// Open discussion, description only.
    Default { id: String, description: String },
    /// Compare a list of items.
    Compare {
        id: String,
        description: String,
        items: Vec<DiscussionItem>,
    },
}

impl ChatDiscussion {
    pub fn open(description: impl Into<String>) -> Self {
        ChatDiscussion::Default {
            id: generate_id(),
            description: description.into(),
        }
    }

    pub fn compare(description: impl Into<String>, items: Vec<DiscussionItem>) -> Self {
        ChatDiscussion::Compare {
            id: generate_id(),
            description: description.into(),
            items,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ChatDiscussion::Default { id, .. } | ChatDiscussion::Compare { id, .. } => id,
        }
    }
}

/// An item participants are asked to compare.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionItem {
    pub id: String,
    pub name: String,
}

impl DiscussionItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
        }
    }
}

/// An LLM mediator persona attached to a chat stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediatorConfig {
    pub id: String,
    pub name: String,
    /// Emoji avatar.
    pub avatar: String,
    /// Persona system prompt.
    pub prompt: String,
}

impl MediatorConfig {
    pub fn new(name: impl Into<String>, avatar: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            avatar: avatar.into(),
            prompt: prompt.into(),
        }
    }
}

/// Chat stage: an ordered list of discussions plus zero or more mediators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStageConfig {
    #[serde(flatten)]
    pub base: BaseStageConfig,
    #[serde(default)]
    pub discussions: Vec<ChatDiscussion>,
    #[serde(default)]
    pub mediators: Vec<MediatorConfig>,
    /// One participant and one mediator, role-based prompts allowed.
    #[serde(default)]
    pub is_private_chat: bool,
}

impl ChatStageConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: BaseStageConfig::new(name),
            discussions: Vec::new(),
            mediators: Vec::new(),
            is_private_chat: false,
        }
    }

    pub fn with_discussion(mut self, discussion: ChatDiscussion) -> Self {
        self.discussions.push(discussion);
        self
    }

    pub fn with_mediator(mut self, mediator: MediatorConfig) -> Self {
        self.mediators.push(mediator);
        self
    }

    pub fn private(mut self) -> Self {
        self.is_private_chat = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_stage_builder() {
        let stage = ChatStageConfig::new("Group discussion")
            .with_discussion(ChatDiscussion::open("Introduce yourselves"))
            .with_discussion(ChatDiscussion::compare(
                "Rank the supplies",
                vec![DiscussionItem::new("compass"), DiscussionItem::new("mirror")],
            ))
            .with_mediator(MediatorConfig::new("Moderator", "🦉", "Keep things civil."));

        assert_eq!(stage.discussions.len(), 2);
        assert_eq!(stage.mediators.len(), 1);
        assert!(!stage.is_private_chat);
        match &stage.discussions[1] {
            ChatDiscussion::Compare { items, .. } => assert_eq!(items.len(), 2),
            _ => panic!("expected compare discussion"),
        }
    }

    #[test]
    fn test_private_chat_flag() {
        let stage = ChatStageConfig::new("1:1 coaching").private();
        assert!(stage.is_private_chat);
    }

    #[test]
    fn test_discussion_serialization_tag() {
        let discussion = ChatDiscussion::open("hello");
        let value = serde_json::to_value(&discussion).unwrap();
        assert_eq!(value["type"], "DEFAULT");
    }
}
