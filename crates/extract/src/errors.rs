//! Error types for the extraction framework's language-model port.
//!
//! [`InferenceError`] is what every adapter reports: configuration problems at
//! construction time and transport failures at inference time. [`RegistryError`]
//! covers adapter selection in [`crate::registry`].
//!
//! ## Retry semantics
//!
//! Adapters do not retry and do not classify failures as transient or
//! permanent. A [`InferenceError::Runtime`] carries the original failure as
//! its [`std::error::Error::source`]; callers that want a retry policy inspect
//! that source themselves.

use thiserror::Error;

/// Boxed error used to carry an adapter's original failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Inference errors
// ---------------------------------------------------------------------------

/// Errors produced by a [`crate::LanguageModel`] adapter.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The adapter could not be constructed from the supplied configuration.
    ///
    /// Produced by: missing transport capability, missing API key. The
    /// instance never becomes usable; reconstruct with valid inputs.
    #[error("{message}")]
    Configuration {
        /// Human-readable description, including how to fix the problem.
        message: String,
    },

    /// A backend call failed during inference.
    ///
    /// Aborts the remaining prompts of the current `infer` call. Outputs
    /// already yielded by the stream remain valid.
    #[error("{message}")]
    Runtime {
        /// Descriptive message with a provider-specific prefix.
        message: String,
        /// The original transport or protocol failure.
        #[source]
        source: BoxError,
    },

    /// The underlying transport could not be constructed.
    ///
    /// The transport's own error is passed through unmodified.
    #[error(transparent)]
    Transport(BoxError),
}

impl InferenceError {
    /// Creates a [`InferenceError::Configuration`] from a message.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a [`InferenceError::Runtime`] from a message prefix and the
    /// original failure. The failure's display text is appended to the prefix.
    pub fn runtime<E>(prefix: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Runtime {
            message: format!("{prefix}{source}"),
            source: Box::new(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

/// Errors raised while registering or selecting an adapter.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A registration pattern is not a valid regular expression.
    #[error("invalid provider pattern '{pattern}' for {provider}: {source}")]
    InvalidPattern {
        /// The provider being registered.
        provider: String,
        /// The rejected pattern.
        pattern: String,
        /// The regex compiler's error.
        #[source]
        source: regex::Error,
    },

    /// No registered pattern matches the requested model identifier.
    #[error("no provider registered for model '{model_id}'")]
    NoProviderForModel {
        /// The model identifier that was looked up.
        model_id: String,
    },

    /// An explicitly requested provider name is not registered.
    #[error("unknown provider '{name}' (registered: {})", registered.join(", "))]
    UnknownProvider {
        /// The requested name.
        name: String,
        /// Names currently registered, in scan order.
        registered: Vec<String>,
    },

    /// The selected adapter's constructor failed.
    #[error(transparent)]
    Model(#[from] InferenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("connection refused")]
    struct Refused;

    #[test]
    fn test_runtime_error_keeps_prefix_and_source() {
        let err = InferenceError::runtime("Backend API error: ", Refused);
        assert_eq!(err.to_string(), "Backend API error: connection refused");

        let source = std::error::Error::source(&err).expect("source must be kept");
        assert!(source.downcast_ref::<Refused>().is_some());
    }

    #[test]
    fn test_transport_error_is_transparent() {
        let err = InferenceError::Transport(Box::new(Refused));
        assert_eq!(err.to_string(), "connection refused");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_unknown_provider_lists_registered_names() {
        let err = RegistryError::UnknownProvider {
            name: "Nope".into(),
            registered: vec!["A".into(), "B".into()],
        };
        assert_eq!(err.to_string(), "unknown provider 'Nope' (registered: A, B)");
    }
}
