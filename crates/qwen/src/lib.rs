//! Qwen language-model adapter for the `extract` framework.
//!
//! Implements [`extract::LanguageModel`] for Qwen models served through
//! Alibaba DashScope's OpenAI-compatible chat-completions endpoint.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Credential resolution, request building, HTTP
//! transport and response parsing live here. The [`extract`] crate sees only
//! [`extract::LanguageModel`].
//!
//! ## Configuration
//!
//! | Setting | Source, in priority order |
//! |---------|---------------------------|
//! | API key | `ModelConfig::api_key`, `DASHSCOPE_API_KEY`, `LANGEXTRACT_API_KEY` |
//! | Base URL | `ModelConfig::base_url`, `DASHSCOPE_BASE_URL`, [`DEFAULT_BASE_URL`] |
//!
//! ## Features
//!
//! - `http` (default): the `reqwest` transport. Without it, construction fails
//!   unless a [`TransportFactory`] is injected via
//!   [`QwenLanguageModel::with_transport`].

use std::sync::Arc;

use extract::{LanguageModel, ModelConfig, ProviderRegistry, RegistryError};

pub mod config;
#[cfg(feature = "http")]
pub mod http;
pub mod params;
pub mod provider;
pub mod transport;

pub use config::{ApiKey, API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL, FALLBACK_API_KEY_ENV};
pub use params::{build_params, ChatCompletionParams, ChatMessage, Role};
pub use provider::{QwenLanguageModel, RUNTIME_ERROR_PREFIX};
pub use transport::{default_transport_factory, ChatTransport, TransportError, TransportFactory};

/// Name the adapter is registered under.
pub const PROVIDER_NAME: &str = "QwenLanguageModel";

/// Model identifiers served by this adapter.
pub const MODEL_PATTERN: &str = "^qwen";

/// Priority among adapters competing for the same model identifier.
pub const PRIORITY: i32 = 20;

/// Registers the Qwen adapter, built with `transport` and the process
/// environment.
///
/// Pass [`default_transport_factory()`] for the compiled-in HTTP transport.
pub fn register(
    registry: &mut ProviderRegistry,
    transport: Option<Arc<dyn TransportFactory>>,
) -> Result<(), RegistryError> {
    registry.register(PROVIDER_NAME, MODEL_PATTERN, PRIORITY, move |config: &ModelConfig| {
        let model = QwenLanguageModel::with_transport(config, transport.clone(), config::process_env)?;
        Ok(Box::new(model) as Box<dyn LanguageModel>)
    })
}

#[cfg(test)]
mod tests {
    use extract::{FormatType, ModelId};

    use super::*;

    #[test]
    fn test_register_routes_qwen_models() {
        let mut registry = ProviderRegistry::new();
        register(&mut registry, default_transport_factory()).unwrap();

        let registration = registry.resolve("qwen-flash").unwrap();
        assert_eq!(registration.name(), PROVIDER_NAME);
        assert_eq!(registration.priority(), PRIORITY);
        assert!(registry.resolve("gpt-4o").is_err());
    }

    #[test]
    fn test_registered_constructor_reports_missing_transport() {
        let mut registry = ProviderRegistry::new();
        register(&mut registry, None).unwrap();

        let mut config = ModelConfig::new(ModelId::new("qwen-plus").unwrap());
        config.api_key = Some("k".into());
        config.format_type = FormatType::Yaml;

        let err = match registry.create(&config) {
            Ok(_) => panic!("construction without a transport must fail"),
            Err(err) => err,
        };
        assert!(matches!(
            err,
            RegistryError::Model(extract::InferenceError::Configuration { .. })
        ));
    }
}
