//! `reqwest` implementation of the chat-completion transport.
//!
//! Speaks the OpenAI Chat Completions API: `POST {base_url}/chat/completions`
//! with a bearer token and a JSON body. Non-2xx responses are mapped to
//! [`TransportError::Http`] with the backend's error message when the body
//! follows the OpenAI `{"error": {...}}` shape.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;

use crate::config::ApiKey;
use crate::params::ChatCompletionParams;
use crate::transport::{ChatCompletion, ChatTransport, TransportError, TransportFactory};

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Total request timeout. Extraction prompts over long documents can take a
/// while to generate.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Builds [`HttpTransport`]s.
#[derive(Debug, Clone)]
pub struct HttpTransportFactory {
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl Default for HttpTransportFactory {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl TransportFactory for HttpTransportFactory {
    fn connect(&self, api_key: &ApiKey, base_url: &str) -> Result<Arc<dyn ChatTransport>, TransportError> {
        let http = HttpClient::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| TransportError::Build {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Arc::new(HttpTransport {
            http,
            endpoint: chat_completions_url(base_url),
            api_key: api_key.clone(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Chat-completion transport over HTTPS.
#[derive(Debug)]
pub struct HttpTransport {
    http: HttpClient,
    endpoint: String,
    api_key: ApiKey,
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn create_chat_completion(
        &self,
        params: &ChatCompletionParams,
    ) -> Result<ChatCompletion, TransportError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(params)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.request_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|json| extract_openai_error_message(&json))
                .unwrap_or(body);
            return Err(TransportError::Http {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::MalformedResponse {
            reason: format!("invalid chat completion body: {e}"),
        })
    }
}

impl HttpTransport {
    fn request_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                endpoint: self.endpoint.clone(),
            }
        } else {
            TransportError::Connection {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Joins `base_url` and the chat-completions path without doubling slashes.
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Extracts `type: code: message` from an OpenAI-style error body.
fn extract_openai_error_message(json: &Value) -> Option<String> {
    let error = json.get("error")?;
    let code = match error.get("code") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let parts: Vec<String> = [
        error.get("type").and_then(Value::as_str).unwrap_or_default().to_string(),
        code,
        error.get("message").and_then(Value::as_str).unwrap_or_default().to_string(),
    ]
    .into_iter()
    .filter(|p| !p.is_empty())
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(": "))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_chat_completions_url_trims_trailing_slash() {
        assert_eq!(
            chat_completions_url("https://dashscope.aliyuncs.com/compatible-mode/v1/"),
            "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions"
        );
        assert_eq!(chat_completions_url("http://127.0.0.1:8080/v1"), "http://127.0.0.1:8080/v1/chat/completions");
    }

    #[test]
    fn test_extract_openai_error_message() {
        let body = json!({
            "error": {
                "message": "Incorrect API key provided.",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        });
        assert_eq!(
            extract_openai_error_message(&body).as_deref(),
            Some("invalid_request_error: invalid_api_key: Incorrect API key provided.")
        );
    }

    #[test]
    fn test_extract_openai_error_message_numeric_code() {
        let body = json!({ "error": { "code": 429, "message": "Throttling" } });
        assert_eq!(extract_openai_error_message(&body).as_deref(), Some("429: Throttling"));
    }

    #[test]
    fn test_extract_openai_error_message_absent() {
        assert!(extract_openai_error_message(&json!({ "detail": "nope" })).is_none());
        assert!(extract_openai_error_message(&json!({ "error": {} })).is_none());
    }
}
