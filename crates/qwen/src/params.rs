//! Chat-completion request building.
//!
//! [`build_params`] is a pure function from (settings, prompt, merged
//! overrides) to the request body. Optional fields are `Option`s skipped
//! during serialisation, so an unset option never appears on the wire, not
//! even as `null`.

use extract::{FormatType, InferenceOverrides, ModelId, StopSequences};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// System instruction sent in JSON mode.
pub const JSON_SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that responds in JSON format.";

/// System instruction sent in YAML mode.
pub const YAML_SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that responds in YAML format.";

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Request body
// ---------------------------------------------------------------------------

/// Request body for `POST {base_url}/chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionParams {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Number of candidates; always 1.
    pub n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopSequences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_logprobs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
}

/// Returns the system instruction for `format`, if any.
pub fn system_instruction(format: FormatType) -> Option<&'static str> {
    match format {
        FormatType::Json => Some(JSON_SYSTEM_INSTRUCTION),
        FormatType::Yaml => Some(YAML_SYSTEM_INSTRUCTION),
        FormatType::Text => None,
    }
}

/// The response-format directive requesting a raw JSON object.
pub fn json_object_format() -> Value {
    json!({ "type": "json_object" })
}

/// Builds the request body for one prompt.
///
/// `overrides` must already be merged with the adapter's defaults; its
/// temperature, if unset, falls back to `default_temperature`. In JSON mode a
/// `json_object` response format is requested unless `overrides` supplies one.
pub fn build_params(
    model_id: &ModelId,
    format: FormatType,
    default_temperature: Option<f64>,
    prompt: &str,
    overrides: &InferenceOverrides,
) -> ChatCompletionParams {
    let mut messages = Vec::with_capacity(2);
    if let Some(instruction) = system_instruction(format).filter(|s| !s.is_empty()) {
        messages.push(ChatMessage::system(instruction));
    }
    messages.push(ChatMessage::user(prompt));

    let response_format = overrides.response_format.clone().or_else(|| match format {
        FormatType::Json => Some(json_object_format()),
        FormatType::Yaml | FormatType::Text => None,
    });

    ChatCompletionParams {
        model: model_id.as_str().to_string(),
        messages,
        n: 1,
        temperature: overrides.temperature.or(default_temperature),
        max_tokens: overrides.max_output_tokens,
        top_p: overrides.top_p,
        frequency_penalty: overrides.frequency_penalty,
        presence_penalty: overrides.presence_penalty,
        seed: overrides.seed,
        stop: overrides.stop.clone(),
        logprobs: overrides.logprobs,
        top_logprobs: overrides.top_logprobs,
        reasoning: overrides.reasoning.clone(),
        response_format,
    }
}
