//! Agent mediator turn logic — prompt assembly, provider call, decision
//! extraction.

use anyhow::Result;
use serde_json::Value;
use tracing::{info, warn};

use crate::chat::ChatMessage;
use crate::config::Config;
use crate::convert::{build_message_prompt, ChatToMessageOptions};
use crate::output::{
    extract_chat_decision, parse_structured_output_from_text, ChatDecision,
    ChatStructuredOutputConfig,
};
use crate::providers;
use crate::stages::chat::MediatorConfig;
use crate::types::{ModelResponse, ModelResponseStatus, ParticipantProfile, UserType};

/// An agent mediator's full turn outcome. Failed turns carry the error
/// status so callers can decide whether to retry or stay silent.
#[derive(Debug, Clone)]
pub struct AgentMediatorResponse {
    pub agent_id: String,
    pub profile: ParticipantProfile,
    pub status: ModelResponseStatus,
    pub decision: Option<ChatDecision>,
    pub parsed: Option<Value>,
    pub raw_text: Option<String>,
}

impl AgentMediatorResponse {
    /// The chat message to post, if the mediator decided to speak.
    pub fn to_chat_message(&self) -> Option<ChatMessage> {
        let decision = self.decision.as_ref()?;
        if !decision.should_respond {
            return None;
        }
        let text = decision.message.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        let mut message = ChatMessage::mediator(text, self.agent_id.clone());
        message.profile = self.profile.clone();
        if let Some(ref explanation) = decision.explanation {
            message = message.with_explanation(explanation.clone());
        }
        Some(message)
    }
}

/// Drives one mediator persona's responses in a chat stage.
pub struct AgentMediator {
    pub config: MediatorConfig,
    pub output_config: ChatStructuredOutputConfig,
}

impl AgentMediator {
    pub fn new(config: MediatorConfig) -> Self {
        Self {
            config,
            output_config: ChatStructuredOutputConfig::default(),
        }
    }

    /// Persona prompt plus structured output instructions.
    pub fn system_prompt(&self) -> String {
        match self.output_config.prompt_instructions() {
            Some(instructions) => format!("{}\n\n{}", self.config.prompt, instructions),
            None => self.config.prompt.clone(),
        }
    }

    /// Take one mediator turn over the given chat history.
    ///
    /// Only transport failures are `Err`; provider and parse errors come
    /// back as statuses in the response.
    pub async fn respond(
        &self,
        app_config: &Config,
        history: &[ChatMessage],
    ) -> Result<AgentMediatorResponse> {
        let options = ChatToMessageOptions {
            is_private_chat: true,
            include_system_prompt: true,
        };
        let messages =
            build_message_prompt(&self.system_prompt(), history, UserType::Mediator, &options);

        let response =
            providers::chat(app_config, &messages, &app_config.generation_config()).await?;

        info!(
            agent_id = %self.config.id,
            status = ?response.status,
            "mediator turn complete"
        );

        Ok(self.interpret(response))
    }

    /// Turn a raw model response into a mediator decision.
    fn interpret(&self, response: ModelResponse) -> AgentMediatorResponse {
        let profile = ParticipantProfile::new(self.config.name.clone(), self.config.avatar.clone());

        if !response.is_ok() {
            warn!(
                agent_id = %self.config.id,
                status = ?response.status,
                error = response.error_message.as_deref().unwrap_or(""),
                "mediator call failed"
            );
            return AgentMediatorResponse {
                agent_id: self.config.id.clone(),
                profile,
                status: response.status,
                decision: None,
                parsed: None,
                raw_text: response.text,
            };
        }

        let text = response.text.unwrap_or_default();
        match parse_structured_output_from_text(&text) {
            Ok(parsed) => {
                let decision = extract_chat_decision(&parsed, &self.output_config);
                AgentMediatorResponse {
                    agent_id: self.config.id.clone(),
                    profile,
                    status: ModelResponseStatus::Ok,
                    decision: Some(decision),
                    parsed: Some(parsed),
                    raw_text: Some(text),
                }
            }
            Err(err) => {
                warn!(agent_id = %self.config.id, %err, "unparseable mediator output");
                AgentMediatorResponse {
                    agent_id: self.config.id.clone(),
                    profile,
                    status: ModelResponseStatus::StructuredOutputParseError,
                    decision: None,
                    parsed: None,
                    raw_text: Some(text),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mediator() -> AgentMediator {
        AgentMediator::new(MediatorConfig::new(
            "Moderator",
            "🦉",
            "You are a thoughtful discussion moderator.",
        ))
    }

    #[test]
    fn test_system_prompt_appends_schema_instructions() {
        let prompt = mediator().system_prompt();
        assert!(prompt.starts_with("You are a thoughtful discussion moderator."));
        assert!(prompt.contains("shouldRespond"));
    }

    #[test]
    fn test_interpret_ok_response() {
        let m = mediator();
        let response = ModelResponse::ok(
            r#"{"explanation": "greeting", "shouldRespond": true, "response": "Hello!", "readyToEndChat": false}"#,
            None,
        );
        let result = m.interpret(response);
        assert_eq!(result.status, ModelResponseStatus::Ok);
        let message = result.to_chat_message().unwrap();
        assert_eq!(message.message, "Hello!");
        assert_eq!(message.explanation, "greeting");
        assert_eq!(message.profile.name, "Moderator");
        assert_eq!(message.agent_id, m.config.id);
    }

    #[test]
    fn test_interpret_silent_decision() {
        let m = mediator();
        let response = ModelResponse::ok(r#"{"shouldRespond": false}"#, None);
        let result = m.interpret(response);
        assert_eq!(result.status, ModelResponseStatus::Ok);
        assert!(result.to_chat_message().is_none());
    }

    #[test]
    fn test_interpret_unparseable_output() {
        let m = mediator();
        let response = ModelResponse::ok("sorry, I can't produce JSON", None);
        let result = m.interpret(response);
        assert_eq!(
            result.status,
            ModelResponseStatus::StructuredOutputParseError
        );
        assert!(result.to_chat_message().is_none());
        assert_eq!(result.raw_text.as_deref(), Some("sorry, I can't produce JSON"));
    }

    #[test]
    fn test_interpret_provider_error_passthrough() {
        let m = mediator();
        let response = ModelResponse::error(ModelResponseStatus::QuotaError, "429");
        let result = m.interpret(response);
        assert_eq!(result.status, ModelResponseStatus::QuotaError);
        assert!(result.decision.is_none());
    }

    #[test]
    fn test_empty_message_is_not_posted() {
        let m = mediator();
        let response = ModelResponse::ok(r#"{"shouldRespond": true, "response": "  "}"#, None);
        let result = m.interpret(response);
        assert!(result.to_chat_message().is_none());
    }
}
