//! The Qwen language-model adapter.

use std::sync::Arc;

use extract::{
    FormatType, InferenceError, InferenceOverrides, InferenceStream, LanguageModel, ModelConfig,
    ModelId, ScoredOutput, WorkerCount, DEFAULT_REQUIRES_FENCED_OUTPUT,
};
use futures::stream;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{process_env, QwenSettings};
use crate::params::build_params;
use crate::transport::{default_transport_factory, ChatTransport, TransportFactory};

/// Prefix of every inference failure message.
pub const RUNTIME_ERROR_PREFIX: &str = "DashScope(OpenAI) API error: ";

/// Language-model adapter for Qwen models served through DashScope's
/// OpenAI-compatible endpoint.
///
/// Each prompt is one independent chat-completion call with a single
/// candidate. The adapter holds no mutable state; concurrent `infer` calls on
/// disjoint batches are safe.
pub struct QwenLanguageModel {
    settings: QwenSettings,
    transport: Arc<dyn ChatTransport>,
}

impl std::fmt::Debug for QwenLanguageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QwenLanguageModel")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl QwenLanguageModel {
    /// Builds the adapter with the transport compiled into this crate and the
    /// process environment.
    pub fn new(config: &ModelConfig) -> Result<Self, InferenceError> {
        Self::with_transport(config, default_transport_factory(), process_env)
    }

    /// Builds the adapter with an injected transport capability and
    /// environment lookup.
    ///
    /// Fails with [`InferenceError::Configuration`] if `transport` is `None`
    /// (checked first) or if no API key can be resolved. Errors from the
    /// factory itself are passed through as [`InferenceError::Transport`].
    pub fn with_transport<E>(
        config: &ModelConfig,
        transport: Option<Arc<dyn TransportFactory>>,
        env: E,
    ) -> Result<Self, InferenceError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let factory = transport.ok_or_else(|| {
            InferenceError::configuration(
                "Qwen provider requires an OpenAI-compatible HTTP transport. \
                 Enable the `http` feature of the `qwen` crate or inject a TransportFactory.",
            )
        })?;

        let settings = QwenSettings::resolve(config, env)?;
        let transport = factory
            .connect(&settings.api_key, &settings.base_url)
            .map_err(|e| InferenceError::Transport(Box::new(e)))?;

        tracing::debug!(
            model_id = %settings.model_id,
            base_url = %settings.base_url,
            format = %settings.format_type,
            max_workers = %settings.max_workers,
            "qwen provider initialised"
        );

        Ok(Self { settings, transport })
    }

    /// The resolved endpoint.
    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    /// Merges call-time overrides over the construction defaults. Temperature
    /// falls back to the configured temperature last.
    fn merge_overrides(&self, overrides: &InferenceOverrides) -> InferenceOverrides {
        let mut merged = overrides.merged_over(&self.settings.defaults);
        merged.temperature = merged.temperature.or(self.settings.temperature);
        merged
    }

    async fn infer_one(
        &self,
        index: usize,
        prompt: &str,
        overrides: &InferenceOverrides,
    ) -> Result<Vec<ScoredOutput>, InferenceError> {
        let params = build_params(
            &self.settings.model_id,
            self.settings.format_type,
            self.settings.temperature,
            prompt,
            overrides,
        );

        tracing::debug!(
            prompt_index = index,
            model = %params.model,
            message_count = params.messages.len(),
            temperature = ?params.temperature,
            max_tokens = ?params.max_tokens,
            "sending chat completion"
        );

        let completion = match self.transport.create_chat_completion(&params).await {
            Ok(completion) => completion,
            Err(e) => {
                tracing::warn!(prompt_index = index, error = %e, "chat completion failed");
                return Err(InferenceError::runtime(RUNTIME_ERROR_PREFIX, e));
            }
        };

        let output = completion.first_content().map_err(|e| {
            tracing::warn!(prompt_index = index, error = %e, "unusable chat completion");
            InferenceError::runtime(RUNTIME_ERROR_PREFIX, e)
        })?;

        let usage = completion.usage;
        tracing::debug!(
            prompt_index = index,
            finish_reason = ?completion.choices.first().and_then(|c| c.finish_reason.as_deref()),
            prompt_tokens = ?usage.map(|u| u.prompt_tokens),
            completion_tokens = ?usage.map(|u| u.completion_tokens),
            total_tokens = ?usage.map(|u| u.total_tokens),
            "chat completion received"
        );

        Ok(vec![ScoredOutput::certain(output)])
    }

    /// Runs the next pending prompt, handing the remaining state back.
    async fn next_output(
        &self,
        mut pending: PendingPrompts,
    ) -> Result<Option<(Vec<ScoredOutput>, PendingPrompts)>, InferenceError> {
        let Some((index, prompt)) = pending.prompts.next() else {
            return Ok(None);
        };
        let outputs = self.infer_one(index, &prompt, &pending.overrides).await?;
        Ok(Some((outputs, pending)))
    }
}

/// Per-call state carried between stream steps.
struct PendingPrompts {
    prompts: std::iter::Enumerate<std::vec::IntoIter<String>>,
    overrides: InferenceOverrides,
}

impl LanguageModel for QwenLanguageModel {
    fn model_id(&self) -> &ModelId {
        &self.settings.model_id
    }

    fn format_type(&self) -> FormatType {
        self.settings.format_type
    }

    fn max_workers(&self) -> WorkerCount {
        self.settings.max_workers
    }

    /// JSON mode requests a raw JSON object from the backend, so no fences
    /// are expected.
    fn requires_fenced_output(&self) -> bool {
        match self.settings.format_type {
            FormatType::Json => false,
            FormatType::Yaml | FormatType::Text => DEFAULT_REQUIRES_FENCED_OUTPUT,
        }
    }

    fn infer<'a>(&'a self, prompts: Vec<String>, overrides: InferenceOverrides) -> InferenceStream<'a> {
        let span = tracing::info_span!(
            "qwen.infer",
            call_id = %Uuid::new_v4(),
            model_id = %self.settings.model_id,
            prompt_count = prompts.len(),
        );

        let pending = PendingPrompts {
            prompts: prompts.into_iter().enumerate(),
            overrides: self.merge_overrides(&overrides),
        };

        // try_unfold ends the stream after the first error.
        Box::pin(stream::try_unfold(pending, move |pending| {
            self.next_output(pending).instrument(span.clone())
        }))
    }
}
