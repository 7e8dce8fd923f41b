//! Explicit adapter registry.
//!
//! Adapters are registered by the composition root under a model-id pattern
//! and a priority. Resolution is an ordered scan: the highest-priority
//! matching entry wins, ties go to the entry registered first. Nothing is
//! registered implicitly.

use std::sync::Arc;

use regex::Regex;

use crate::{InferenceError, LanguageModel, ModelConfig, RegistryError};

/// Builds an adapter from a [`ModelConfig`].
pub type ModelConstructor =
    Arc<dyn Fn(&ModelConfig) -> Result<Box<dyn LanguageModel>, InferenceError> + Send + Sync>;

/// One registered adapter.
#[derive(Clone)]
pub struct Registration {
    name: String,
    pattern: Regex,
    priority: i32,
    constructor: ModelConstructor,
}

impl Registration {
    /// The adapter's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The model-id pattern this adapter serves.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Priority among competing adapters; higher wins.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns `true` if this adapter serves `model_id`.
    pub fn matches(&self, model_id: &str) -> bool {
        self.pattern.is_match(model_id)
    }

    /// Constructs the adapter.
    pub fn construct(&self, config: &ModelConfig) -> Result<Box<dyn LanguageModel>, InferenceError> {
        (self.constructor)(config)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Maps model-id patterns to adapter constructors.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    entries: Vec<Registration>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter under `pattern` (a regular expression matched
    /// against model identifiers) at `priority`.
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        pattern: &str,
        priority: i32,
        constructor: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&ModelConfig) -> Result<Box<dyn LanguageModel>, InferenceError> + Send + Sync + 'static,
    {
        let name = name.into();
        let compiled = Regex::new(pattern).map_err(|source| RegistryError::InvalidPattern {
            provider: name.clone(),
            pattern: pattern.to_string(),
            source,
        })?;

        tracing::debug!(provider = %name, pattern, priority, "registered provider");
        self.entries.push(Registration {
            name,
            pattern: compiled,
            priority,
            constructor: Arc::new(constructor),
        });
        Ok(())
    }

    /// Returns the adapter that serves `model_id`.
    pub fn resolve(&self, model_id: &str) -> Result<&Registration, RegistryError> {
        let mut best: Option<&Registration> = None;
        for entry in self.entries.iter().filter(|e| e.matches(model_id)) {
            // Strictly greater: the earliest registration keeps ties.
            if best.map_or(true, |b| entry.priority > b.priority) {
                best = Some(entry);
            }
        }
        best.ok_or_else(|| RegistryError::NoProviderForModel {
            model_id: model_id.to_string(),
        })
    }

    /// Returns the adapter registered as `name`.
    pub fn resolve_by_name(&self, name: &str) -> Result<&Registration, RegistryError> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| RegistryError::UnknownProvider {
                name: name.to_string(),
                registered: self.registered().map(str::to_string).collect(),
            })
    }

    /// Resolves and constructs the adapter for `config`.
    ///
    /// An explicit [`ModelConfig::provider`] takes precedence over pattern
    /// matching on the model identifier.
    pub fn create(&self, config: &ModelConfig) -> Result<Box<dyn LanguageModel>, RegistryError> {
        let registration = match &config.provider {
            Some(name) => self.resolve_by_name(name.as_str())?,
            None => self.resolve(config.model_id.as_str())?,
        };

        tracing::info!(
            provider = registration.name(),
            model_id = %config.model_id,
            "constructing language model"
        );
        Ok(registration.construct(config)?)
    }

    /// Names of registered adapters, in registration order.
    pub fn registered(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}
