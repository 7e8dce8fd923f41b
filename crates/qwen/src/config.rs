//! Configuration resolution for the Qwen adapter.
//!
//! Credentials and endpoint come from the explicit [`extract::ModelConfig`]
//! first, then from environment variables, then (for the endpoint only) from a
//! built-in default. Empty values count as unset at every step.

use extract::{FormatType, InferenceError, InferenceOverrides, ModelConfig, ModelId, WorkerCount};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Primary environment variable holding the DashScope API key.
pub const API_KEY_ENV: &str = "DASHSCOPE_API_KEY";

/// Fallback API key variable, shared with the extraction framework itself.
pub const FALLBACK_API_KEY_ENV: &str = "LANGEXTRACT_API_KEY";

/// Environment variable overriding the endpoint.
pub const BASE_URL_ENV: &str = "DASHSCOPE_BASE_URL";

/// DashScope's OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

// ---------------------------------------------------------------------------
// API key
// ---------------------------------------------------------------------------

/// A backend API key.
///
/// `Debug` is redacted so keys never reach logs through `{:?}`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates an [`ApiKey`], returning `None` if the value is empty.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Returns the raw key for use in an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Reads the process environment. Unset and non-UTF-8 variables are `None`.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Resolves the API key: explicit value, then [`API_KEY_ENV`], then
/// [`FALLBACK_API_KEY_ENV`].
pub fn resolve_api_key<E>(explicit: Option<&str>, env: E) -> Result<ApiKey, InferenceError>
where
    E: Fn(&str) -> Option<String>,
{
    explicit
        .and_then(ApiKey::new)
        .or_else(|| env(API_KEY_ENV).and_then(ApiKey::new))
        .or_else(|| env(FALLBACK_API_KEY_ENV).and_then(ApiKey::new))
        .ok_or_else(|| {
            InferenceError::configuration(format!(
                "API key not provided. Set {API_KEY_ENV} or pass api_key."
            ))
        })
}

/// Resolves the endpoint: explicit value, then [`BASE_URL_ENV`], then
/// [`DEFAULT_BASE_URL`].
pub fn resolve_base_url<E>(explicit: Option<&str>, env: E) -> String
where
    E: Fn(&str) -> Option<String>,
{
    explicit
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| env(BASE_URL_ENV).filter(|v| !v.is_empty()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

/// Fully resolved adapter settings. Immutable once built.
#[derive(Debug, Clone)]
pub struct QwenSettings {
    pub model_id: ModelId,
    pub api_key: ApiKey,
    pub base_url: String,
    pub format_type: FormatType,
    pub temperature: Option<f64>,
    pub max_workers: WorkerCount,
    pub defaults: InferenceOverrides,
}

impl QwenSettings {
    /// Resolves settings from `config`, consulting `env` for anything the
    /// configuration leaves unset.
    pub fn resolve<E>(config: &ModelConfig, env: E) -> Result<Self, InferenceError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let api_key = resolve_api_key(config.api_key.as_deref(), &env)?;
        let base_url = resolve_base_url(config.base_url.as_deref(), &env);

        Ok(Self {
            model_id: config.model_id.clone(),
            api_key,
            base_url,
            format_type: config.format_type,
            temperature: config.temperature,
            max_workers: config.max_workers,
            defaults: config.defaults.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let env = env_of(&[(API_KEY_ENV, "from-env"), (FALLBACK_API_KEY_ENV, "fallback")]);
        let key = resolve_api_key(Some("explicit"), env).unwrap();
        assert_eq!(key.expose(), "explicit");
    }

    #[test]
    fn test_primary_env_before_fallback() {
        let env = env_of(&[(API_KEY_ENV, "primary"), (FALLBACK_API_KEY_ENV, "fallback")]);
        assert_eq!(resolve_api_key(None, env).unwrap().expose(), "primary");

        let env = env_of(&[(FALLBACK_API_KEY_ENV, "fallback")]);
        assert_eq!(resolve_api_key(None, env).unwrap().expose(), "fallback");
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let env = env_of(&[(API_KEY_ENV, ""), (FALLBACK_API_KEY_ENV, "fallback")]);
        assert_eq!(resolve_api_key(Some(""), env).unwrap().expose(), "fallback");
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let err = resolve_api_key(None, env_of(&[])).unwrap_err();
        assert!(matches!(err, InferenceError::Configuration { .. }));
        assert_eq!(
            err.to_string(),
            "API key not provided. Set DASHSCOPE_API_KEY or pass api_key."
        );
    }

    #[test]
    fn test_base_url_precedence() {
        let env = env_of(&[(BASE_URL_ENV, "https://env.example/v1")]);
        assert_eq!(
            resolve_base_url(Some("https://explicit.example/v1"), &env),
            "https://explicit.example/v1"
        );
        assert_eq!(resolve_base_url(None, &env), "https://env.example/v1");
        assert_eq!(resolve_base_url(None, env_of(&[])), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-secret").unwrap();
        assert!(!format!("{key:?}").contains("sk-secret"));
    }
}
