//! Chat-completion transport port.
//!
//! The adapter talks to the backend only through [`ChatTransport`]. A
//! [`TransportFactory`] is the injected capability that builds one from the
//! resolved credentials; when no factory is available the adapter refuses to
//! construct. The `reqwest` implementation lives in [`crate::http`] behind the
//! `http` feature.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::ApiKey;
use crate::params::ChatCompletionParams;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures of a single chat-completion round trip, or of building the
/// transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint could not be reached.
    #[error("connection failed to {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    /// The request did not complete within the transport's timeout.
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    /// Non-2xx response. `message` is the backend's error message when one
    /// could be extracted, otherwise the raw body.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response could not be decoded or lacked the expected fields.
    #[error("malformed response: {reason}")]
    MalformedResponse { reason: String },

    /// The transport itself could not be constructed.
    #[error("failed to build transport: {reason}")]
    Build { reason: String },
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Response body of a chat completion. Only the fields the adapter reads are
/// modelled; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token accounting reported by the backend.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl ChatCompletion {
    /// Returns the first choice's message content.
    ///
    /// A `null` content is reported as malformed rather than yielded as an
    /// empty output: [`extract::ScoredOutput::output`] is a plain `String`,
    /// and an empty string would be indistinguishable from a real empty answer.
    pub fn first_content(&self) -> Result<&str, TransportError> {
        let choice = self
            .choices
            .first()
            .ok_or_else(|| TransportError::MalformedResponse {
                reason: "response contained no choices".to_string(),
            })?;
        choice
            .message
            .content
            .as_deref()
            .ok_or_else(|| TransportError::MalformedResponse {
                reason: "first choice has no message content".to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Sends one chat-completion request and returns the decoded response.
///
/// Implementations must be safe for concurrent use once constructed.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn create_chat_completion(
        &self,
        params: &ChatCompletionParams,
    ) -> Result<ChatCompletion, TransportError>;
}

/// Builds a [`ChatTransport`] bound to an API key and endpoint.
pub trait TransportFactory: Send + Sync {
    fn connect(&self, api_key: &ApiKey, base_url: &str) -> Result<Arc<dyn ChatTransport>, TransportError>;
}

/// Returns the transport factory compiled into this build, if any.
///
/// `Some` when the `http` feature is enabled (the default).
pub fn default_transport_factory() -> Option<Arc<dyn TransportFactory>> {
    #[cfg(feature = "http")]
    {
        Some(Arc::new(crate::http::HttpTransportFactory::default()))
    }
    #[cfg(not(feature = "http"))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_content_reads_first_choice() {
        let resp: ChatCompletion = serde_json::from_value(serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "{\"a\":1}" }, "finish_reason": "stop" },
                { "index": 1, "message": { "role": "assistant", "content": "other" } }
            ],
            "usage": { "prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8 }
        }))
        .unwrap();

        assert_eq!(resp.first_content().unwrap(), "{\"a\":1}");
        assert_eq!(resp.usage.unwrap().total_tokens, 8);
    }

    #[test]
    fn test_empty_choices_is_malformed() {
        let resp: ChatCompletion = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            resp.first_content(),
            Err(TransportError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_null_content_is_malformed() {
        let resp: ChatCompletion =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        match resp.first_content() {
            Err(TransportError::MalformedResponse { reason }) => {
                assert_eq!(reason, "first choice has no message content");
            }
            other => panic!("expected a malformed response, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_content_field_is_malformed() {
        let resp: ChatCompletion = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant"}, "finish_reason": "length"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            resp.first_content(),
            Err(TransportError::MalformedResponse { .. })
        ));
        assert_eq!(resp.choices[0].finish_reason.as_deref(), Some("length"));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_feature_provides_default_factory() {
        assert!(default_transport_factory().is_some());
    }
}
