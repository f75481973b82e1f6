//! Structured output configuration and model-response parsing.
//!
//! Mediator decisions come back from the model as JSON. Models are sloppy
//! about it — markdown code fences, a stray `json` prefix, or an echo of
//! the requested schema before the actual payload — so parsing is
//! deliberately tolerant.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

// ── Schema model ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StructuredOutputType {
    /// No constraints on the sampler.
    None,
    /// Constrain the sampler to output JSON.
    JsonFormat,
    /// Constrain the sampler to the configured schema.
    JsonSchema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StructuredOutputDataType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Enum,
}

/// Named property of an object schema. Order is preserved so prompts and
/// sampler constraints list fields the way the experimenter wrote them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaProperty {
    pub name: String,
    pub schema: StructuredOutputSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredOutputSchema {
    #[serde(rename = "type")]
    pub data_type: StructuredOutputDataType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<SchemaProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_items: Option<Box<StructuredOutputSchema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_items: Vec<String>,
}

impl StructuredOutputSchema {
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            data_type: StructuredOutputDataType::String,
            description: Some(description.into()),
            properties: Vec::new(),
            array_items: None,
            enum_items: Vec::new(),
        }
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self {
            data_type: StructuredOutputDataType::Boolean,
            description: Some(description.into()),
            ..Self::string("")
        }
    }

    pub fn object(properties: Vec<SchemaProperty>) -> Self {
        Self {
            data_type: StructuredOutputDataType::Object,
            description: None,
            properties,
            array_items: None,
            enum_items: Vec::new(),
        }
    }

    /// Render as a JSON-Schema value, suitable for sampler constraints or
    /// for appending to a prompt.
    pub fn to_json_schema(&self) -> Value {
        let type_name = match self.data_type {
            StructuredOutputDataType::String => "string",
            StructuredOutputDataType::Number => "number",
            StructuredOutputDataType::Integer => "integer",
            StructuredOutputDataType::Boolean => "boolean",
            StructuredOutputDataType::Array => "array",
            StructuredOutputDataType::Object => "object",
            StructuredOutputDataType::Enum => "string",
        };

        let mut schema = json!({ "type": type_name });
        if let Some(ref description) = self.description {
            schema["description"] = json!(description);
        }
        if !self.enum_items.is_empty() {
            schema["enum"] = json!(self.enum_items);
        }
        if let Some(ref items) = self.array_items {
            schema["items"] = items.to_json_schema();
        }
        if !self.properties.is_empty() {
            let mut props = serde_json::Map::new();
            for property in &self.properties {
                props.insert(property.name.clone(), property.schema.to_json_schema());
            }
            schema["properties"] = Value::Object(props);
            schema["required"] = json!(self
                .properties
                .iter()
                .map(|p| p.name.clone())
                .collect::<Vec<_>>());
        }
        schema
    }
}

// ── Chat mediator config ──

pub const DEFAULT_SHOULD_RESPOND_FIELD: &str = "shouldRespond";
pub const DEFAULT_RESPONSE_FIELD: &str = "response";
pub const DEFAULT_EXPLANATION_FIELD: &str = "explanation";
pub const DEFAULT_READY_TO_END_FIELD: &str = "readyToEndChat";

/// Structured output config for chat mediators, mapping schema fields to
/// the mediator's decision fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStructuredOutputConfig {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub output_type: StructuredOutputType,
    pub schema: Option<StructuredOutputSchema>,
    pub append_to_prompt: bool,
    pub should_respond_field: String,
    pub message_field: String,
    pub explanation_field: String,
    pub ready_to_end_field: String,
}

impl Default for ChatStructuredOutputConfig {
    fn default() -> Self {
        let schema = StructuredOutputSchema::object(vec![
            SchemaProperty {
                name: DEFAULT_EXPLANATION_FIELD.into(),
                schema: StructuredOutputSchema::string(
                    "Your reasoning for your response decision.",
                ),
            },
            SchemaProperty {
                name: DEFAULT_SHOULD_RESPOND_FIELD.into(),
                schema: StructuredOutputSchema::boolean(
                    "True if you will send a message, False if you prefer to stay silent.",
                ),
            },
            SchemaProperty {
                name: DEFAULT_RESPONSE_FIELD.into(),
                schema: StructuredOutputSchema::string(
                    "Your chat message (empty if you prefer to stay silent).",
                ),
            },
            SchemaProperty {
                name: DEFAULT_READY_TO_END_FIELD.into(),
                schema: StructuredOutputSchema::boolean(
                    "Whether or not you completed your goals and are ready to end the conversation.",
                ),
            },
        ]);

        Self {
            enabled: true,
            output_type: StructuredOutputType::JsonFormat,
            schema: Some(schema),
            append_to_prompt: true,
            should_respond_field: DEFAULT_SHOULD_RESPOND_FIELD.into(),
            message_field: DEFAULT_RESPONSE_FIELD.into(),
            explanation_field: DEFAULT_EXPLANATION_FIELD.into(),
            ready_to_end_field: DEFAULT_READY_TO_END_FIELD.into(),
        }
    }
}

impl ChatStructuredOutputConfig {
    /// Instructions appended to the system prompt when `append_to_prompt`
    /// is set.
    pub fn prompt_instructions(&self) -> Option<String> {
        if !self.enabled || !self.append_to_prompt {
            return None;
        }
        let schema = self.schema.as_ref()?;
        Some(format!(
            "Respond with a single JSON object matching this schema, and nothing else:\n{}",
            serde_json::to_string_pretty(&schema.to_json_schema()).unwrap_or_default()
        ))
    }
}

/// A chat mediator's decision, extracted from parsed structured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatDecision {
    /// Should the mediator send a message?
    pub should_respond: bool,
    /// The message to send (None if not responding).
    pub message: Option<String>,
    /// Why the mediator made this decision.
    pub explanation: Option<String>,
    /// Is the mediator ready to end the conversation?
    pub ready_to_end_chat: bool,
}

/// Extract the configured decision fields from parsed structured output.
/// `should_respond` defaults to true unless the field is explicitly false.
pub fn extract_chat_decision(parsed: &Value, config: &ChatStructuredOutputConfig) -> ChatDecision {
    let should_respond = parsed.get(&config.should_respond_field) != Some(&Value::Bool(false));

    let field_string = |field: &str, fallback: &str| {
        let name = if field.is_empty() { fallback } else { field };
        parsed.get(name).and_then(Value::as_str).map(String::from)
    };

    let message = field_string(&config.message_field, DEFAULT_RESPONSE_FIELD);
    let explanation = field_string(&config.explanation_field, DEFAULT_EXPLANATION_FIELD);

    let ready_to_end_chat = parsed
        .get(&config.ready_to_end_field)
        .and_then(Value::as_bool)
        .unwrap_or(false);

    ChatDecision {
        should_respond,
        message,
        explanation,
        ready_to_end_chat,
    }
}

// ── Parsing ──

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in model output")]
    NoJsonObject,
}

/// Parse structured output from raw model text.
///
/// Handles markdown code fences, a bare `json` prefix, and the schema-echo
/// pattern where the model repeats the requested JSON schema before the
/// actual payload (the last parseable object wins).
pub fn parse_structured_output_from_text(text: &str) -> Result<Value, ParseError> {
    let cleaned = strip_wrappers(text);

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        if value.is_object() {
            return Ok(value);
        }
    }

    // Multiple or embedded objects: take the last top-level object that
    // parses. A schema echo always precedes the real response.
    top_level_objects(cleaned)
        .into_iter()
        .rev()
        .find_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
        .ok_or(ParseError::NoJsonObject)
}

/// Strip a markdown code fence and/or a leading `json` marker.
fn strip_wrappers(text: &str) -> &str {
    let mut cleaned = text.trim();

    if let Some(rest) = cleaned.strip_prefix("```") {
        // Drop the fence's info string (e.g. "json") up to the newline.
        cleaned = match rest.split_once('\n') {
            Some((_, body)) => body,
            None => rest,
        };
        cleaned = cleaned.trim_end().trim_end_matches("```").trim();
    }

    if let Some(rest) = cleaned.strip_prefix("json") {
        let rest = rest.trim_start();
        if rest.starts_with('{') {
            cleaned = rest;
        }
    }

    cleaned
}

/// Slice out each balanced top-level `{...}` span, respecting strings.
fn top_level_objects(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut objects = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            b'}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        objects.push(&text[start..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    objects
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_valid_json() {
        let input = r#"{"explanation": "test", "shouldRespond": true}"#;
        let result = parse_structured_output_from_text(input).unwrap();
        assert_eq!(result["explanation"], "test");
        assert_eq!(result["shouldRespond"], true);
    }

    #[test]
    fn test_handles_markdown_code_block() {
        let input = "```json\n{\"explanation\": \"test\", \"shouldRespond\": true}\n```";
        let result = parse_structured_output_from_text(input).unwrap();
        assert_eq!(result["shouldRespond"], true);
    }

    #[test]
    fn test_handles_json_prefix_without_code_block() {
        let input = "json\n{\"explanation\": \"test\", \"shouldRespond\": true}";
        let result = parse_structured_output_from_text(input).unwrap();
        assert_eq!(result["explanation"], "test");
    }

    #[test]
    fn test_extracts_response_from_schema_echo() {
        // Some models echo the JSON schema before the actual response.
        let input = r#"{ "type": "object", "properties": { "response": { "description": "Your chat message.", "type": "string" }, "shouldRespond": { "type": "boolean" } } }

{ "shouldRespond": true, "response": "Welcome to the book club!" }"#;
        let result = parse_structured_output_from_text(input).unwrap();
        assert_eq!(result["response"], "Welcome to the book club!");
        assert_eq!(result["shouldRespond"], true);
    }

    #[test]
    fn test_plain_text_is_an_error() {
        let err = parse_structured_output_from_text("this is not json at all").unwrap_err();
        assert!(matches!(err, ParseError::NoJsonObject));
    }

    #[test]
    fn test_braces_inside_strings_do_not_split_objects() {
        let input = r#"{"response": "use {curly} braces", "shouldRespond": true}"#;
        let result = parse_structured_output_from_text(input).unwrap();
        assert_eq!(result["response"], "use {curly} braces");
    }

    #[test]
    fn test_default_chat_config_schema_fields() {
        let config = ChatStructuredOutputConfig::default();
        let schema = config.schema.as_ref().unwrap().to_json_schema();
        let required = schema["required"].as_array().unwrap();
        let names: Vec<&str> = required.iter().filter_map(Value::as_str).collect();
        assert_eq!(
            names,
            vec![
                "explanation",
                "shouldRespond",
                "response",
                "readyToEndChat"
            ]
        );
    }

    #[test]
    fn test_prompt_instructions_include_schema() {
        let config = ChatStructuredOutputConfig::default();
        let instructions = config.prompt_instructions().unwrap();
        assert!(instructions.contains("shouldRespond"));
        assert!(instructions.contains("single JSON object"));
    }

    #[test]
    fn test_prompt_instructions_disabled() {
        let config = ChatStructuredOutputConfig {
            append_to_prompt: false,
            ..Default::default()
        };
        assert!(config.prompt_instructions().is_none());
    }

    #[test]
    fn test_extract_chat_decision() {
        let parsed = serde_json::json!({
            "explanation": "greeting the group",
            "shouldRespond": true,
            "response": "Hello everyone",
            "readyToEndChat": false,
        });
        let decision = extract_chat_decision(&parsed, &ChatStructuredOutputConfig::default());
        assert!(decision.should_respond);
        assert_eq!(decision.message.as_deref(), Some("Hello everyone"));
        assert_eq!(decision.explanation.as_deref(), Some("greeting the group"));
        assert!(!decision.ready_to_end_chat);
    }

    #[test]
    fn test_should_respond_defaults_true_when_missing() {
        let parsed = serde_json::json!({"response": "hi"});
        let decision = extract_chat_decision(&parsed, &ChatStructuredOutputConfig::default());
        assert!(decision.should_respond);
    }

    #[test]
    fn test_should_respond_false_when_explicit() {
        let parsed = serde_json::json!({"shouldRespond": false});
        let decision = extract_chat_decision(&parsed, &ChatStructuredOutputConfig::default());
        assert!(!decision.should_respond);
        assert!(decision.message.is_none());
    }
}
