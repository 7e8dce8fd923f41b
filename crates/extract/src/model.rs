//! The language-model port and the configuration every adapter is built from.
//!
//! Adapters (in infrastructure crates) implement [`LanguageModel`]; the
//! framework only ever sees `dyn LanguageModel`. [`ModelConfig`] is the
//! provider-neutral set of construction options, resolved to a concrete
//! adapter by [`crate::ProviderRegistry`].

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::{FormatType, InferenceError, InferenceOverrides, ModelId, ProviderName, ScoredOutput, WorkerCount};

/// Model identifier used when none is configured.
pub const DEFAULT_MODEL_ID: &str = "qwen-plus";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Construction options for a language-model adapter.
///
/// Fields left unset are resolved by the adapter (typically from environment
/// variables or built-in defaults).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Backend model identifier; also used to select an adapter.
    pub model_id: ModelId,

    /// Explicit adapter name. When set, pattern matching on `model_id` is
    /// skipped.
    #[serde(default)]
    pub provider: Option<ProviderName>,

    /// API key. `None` lets the adapter consult its environment variables.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the backend. `None` lets the adapter consult its
    /// environment variables and built-in default.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Output format the model is asked to produce.
    #[serde(default)]
    pub format_type: FormatType,

    /// Default sampling temperature. `None` leaves it to the backend.
    #[serde(default)]
    pub temperature: Option<f64>,

    /// Concurrency hint for the caller's dispatch layer.
    #[serde(default)]
    pub max_workers: WorkerCount,

    /// Construction-time defaults for per-call overrides.
    #[serde(default)]
    pub defaults: InferenceOverrides,
}

impl ModelConfig {
    /// Creates a configuration for `model_id` with every other option unset.
    pub fn new(model_id: ModelId) -> Self {
        Self {
            model_id,
            provider: None,
            api_key: None,
            base_url: None,
            format_type: FormatType::default(),
            temperature: None,
            max_workers: WorkerCount::default(),
            defaults: InferenceOverrides::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        // DEFAULT_MODEL_ID is a non-empty literal.
        Self::new(ModelId::new(DEFAULT_MODEL_ID).unwrap_or_else(|| unreachable!()))
    }
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// Stream of per-prompt results produced by [`LanguageModel::infer`].
///
/// Yields one item per prompt, in input order. After the first `Err` item the
/// stream ends.
pub type InferenceStream<'a> = BoxStream<'a, Result<Vec<ScoredOutput>, InferenceError>>;

/// A language-model backend the extraction framework can drive.
pub trait LanguageModel: Send + Sync {
    /// The backend model identifier this adapter sends requests for.
    fn model_id(&self) -> &ModelId;

    /// The output format this adapter asks the model for.
    fn format_type(&self) -> FormatType;

    /// Concurrency hint for the caller's dispatch layer.
    fn max_workers(&self) -> WorkerCount {
        WorkerCount::default()
    }

    /// Whether the framework should expect the model's output wrapped in
    /// code fences.
    fn requires_fenced_output(&self) -> bool {
        crate::DEFAULT_REQUIRES_FENCED_OUTPUT
    }

    /// Runs inference over `prompts`.
    ///
    /// The returned stream is lazy: no backend call is made until it is
    /// polled, and each prompt's result may be yielded before later prompts
    /// are sent.
    fn infer<'a>(&'a self, prompts: Vec<String>, overrides: InferenceOverrides) -> InferenceStream<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_config_defaults() {
        let config = ModelConfig::default();
        assert_eq!(config.model_id.as_str(), "qwen-plus");
        assert_eq!(config.format_type, FormatType::Json);
        assert_eq!(config.max_workers.get(), 10);
        assert!(config.temperature.is_none());
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_model_config_deserializes_partial_input() {
        let config: ModelConfig = serde_json::from_value(serde_json::json!({
            "model_id": "qwen-flash",
            "format_type": "yaml",
            "temperature": 0.2,
            "max_workers": 4,
            "defaults": { "max_output_tokens": 800 }
        }))
        .unwrap();

        assert_eq!(config.model_id.as_str(), "qwen-flash");
        assert_eq!(config.format_type, FormatType::Yaml);
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.max_workers.get(), 4);
        assert_eq!(config.defaults.max_output_tokens, Some(800));
    }
}
