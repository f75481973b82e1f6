//! Shared types — UserType, ParticipantProfile, ModelResponse, generation config.

use serde::{Deserialize, Serialize};

// ── Users ──

/// Who sent a message or owns a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Participant,
    Mediator,
    Experimenter,
    System,
    Unknown,
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserType::Participant => write!(f, "participant"),
            UserType::Mediator => write!(f, "mediator"),
            UserType::Experimenter => write!(f, "experimenter"),
            UserType::System => write!(f, "system"),
            UserType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Display profile attached to a message sender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantProfile {
    pub name: String,
    /// Emoji avatar.
    pub avatar: String,
    pub pronouns: Option<String>,
}

impl ParticipantProfile {
    pub fn new(name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: avatar.into(),
            pronouns: None,
        }
    }
}

// ── Model calls ──

/// Extra request-body field merged verbatim into provider requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRequestBodyField {
    pub name: String,
    pub value: serde_json::Value,
}

/// Sampling parameters for an LLM call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelGenerationConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default)]
    pub custom_request_body_fields: Vec<CustomRequestBodyField>,
}

fn default_max_tokens() -> u32 {
    1000
}
fn default_temperature() -> f64 {
    0.7
}
fn default_top_p() -> f64 {
    1.0
}

impl Default for ModelGenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            custom_request_body_fields: Vec::new(),
        }
    }
}

/// Outcome class of an LLM call. Provider errors are data, not panics —
/// the caller decides whether a failed turn is retried, surfaced, or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelResponseStatus {
    Ok,
    AuthenticationError,
    QuotaError,
    ProviderUnavailableError,
    RefusalError,
    LengthError,
    ConfigError,
    StructuredOutputParseError,
    UnknownError,
}

/// Normalized LLM response shared by all provider adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    pub status: ModelResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ModelResponse {
    pub fn ok(text: impl Into<String>, raw: Option<serde_json::Value>) -> Self {
        Self {
            status: ModelResponseStatus::Ok,
            text: Some(text.into()),
            raw_response: raw,
            error_message: None,
        }
    }

    pub fn error(status: ModelResponseStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            text: None,
            raw_response: None,
            error_message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ModelResponseStatus::Ok
    }
}

/// Generate a fresh document id.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_type_serializes_screaming_snake() {
        let json = serde_json::to_string(&UserType::Participant).unwrap();
        assert_eq!(json, "\"PARTICIPANT\"");
        let back: UserType = serde_json::from_str("\"MEDIATOR\"").unwrap();
        assert_eq!(back, UserType::Mediator);
    }

    #[test]
    fn test_generation_config_defaults() {
        let config: ModelGenerationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.top_p, 1.0);
        assert!(config.custom_request_body_fields.is_empty());
    }

    #[test]
    fn test_model_response_error() {
        let resp = ModelResponse::error(ModelResponseStatus::QuotaError, "rate limited");
        assert!(!resp.is_ok());
        assert_eq!(resp.error_message.as_deref(), Some("rate limited"));
        assert!(resp.text.is_none());
    }

    #[test]
    fn test_generate_id_unique() {
        assert_ne!(generate_id(), generate_id());
    }
}
