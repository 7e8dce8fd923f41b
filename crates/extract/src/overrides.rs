//! Per-call sampling overrides.
//!
//! [`InferenceOverrides`] is the typed form of the keyword options a caller
//! passes to `infer` (and of the construction-time defaults an adapter holds).
//! Every field is optional; an absent field means "not specified", never
//! "explicitly null".

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stop sequence(s) at which the backend ends generation.
///
/// Serialised untagged, so a single sequence is sent as a bare string and
/// several as an array, matching the chat-completion wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopSequences {
    One(String),
    Many(Vec<String>),
}

/// Optional sampling and decoding options for a single `infer` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Upper bound on generated tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
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
    /// Provider-specific reasoning options, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Value>,
    /// Explicit response-format directive. Takes precedence over any format
    /// an adapter would otherwise request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
}

impl InferenceOverrides {
    /// Returns a copy of `self` where every field left unset falls back to the
    /// corresponding field of `defaults`.
    #[must_use]
    pub fn merged_over(&self, defaults: &InferenceOverrides) -> InferenceOverrides {
        InferenceOverrides {
            temperature: self.temperature.or(defaults.temperature),
            max_output_tokens: self.max_output_tokens.or(defaults.max_output_tokens),
            top_p: self.top_p.or(defaults.top_p),
            frequency_penalty: self.frequency_penalty.or(defaults.frequency_penalty),
            presence_penalty: self.presence_penalty.or(defaults.presence_penalty),
            seed: self.seed.or(defaults.seed),
            stop: self.stop.clone().or_else(|| defaults.stop.clone()),
            logprobs: self.logprobs.or(defaults.logprobs),
            top_logprobs: self.top_logprobs.or(defaults.top_logprobs),
            reasoning: self.reasoning.clone().or_else(|| defaults.reasoning.clone()),
            response_format: self
                .response_format
                .clone()
                .or_else(|| defaults.response_format.clone()),
        }
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the maximum number of output tokens.
    #[must_use]
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Sets an explicit response-format directive.
    #[must_use]
    pub fn with_response_format(mut self, response_format: Value) -> Self {
        self.response_format = Some(response_format);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merged_over_prefers_call_values() {
        let defaults = InferenceOverrides {
            temperature: Some(0.3),
            top_p: Some(0.8),
            seed: Some(7),
            ..Default::default()
        };
        let call = InferenceOverrides::default()
            .with_temperature(0.9)
            .with_max_output_tokens(256);

        let merged = call.merged_over(&defaults);
        assert_eq!(merged.temperature, Some(0.9));
        assert_eq!(merged.max_output_tokens, Some(256));
        assert_eq!(merged.top_p, Some(0.8));
        assert_eq!(merged.seed, Some(7));
        assert_eq!(merged.stop, None);
    }

    #[test]
    fn test_unset_fields_are_not_serialised() {
        let value = serde_json::to_value(InferenceOverrides::default().with_temperature(0.1))
            .unwrap();
        assert_eq!(value, json!({ "temperature": 0.1 }));
    }

    #[test]
    fn test_stop_accepts_string_or_list() {
        let one: InferenceOverrides = serde_json::from_value(json!({ "stop": "END" })).unwrap();
        assert_eq!(one.stop, Some(StopSequences::One("END".into())));

        let many: InferenceOverrides =
            serde_json::from_value(json!({ "stop": ["a", "b"] })).unwrap();
        assert_eq!(
            many.stop,
            Some(StopSequences::Many(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_unknown_override_is_rejected() {
        let result = serde_json::from_value::<InferenceOverrides>(json!({ "top_k": 5 }));
        assert!(result.is_err());
    }
}
