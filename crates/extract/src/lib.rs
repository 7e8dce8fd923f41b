//! Core domain of the structured-extraction framework.
//!
//! This crate defines what the framework needs from a language-model backend
//! and how backends are selected. Infrastructure crates (such as `qwen`)
//! implement [`LanguageModel`]; they never add framework rules.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies.
//! It defines *what* an adapter must do; provider crates define *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ModelId`, `ProviderName`) |
//! | [`types`] | Value types (`FormatType`, `ScoredOutput`, `WorkerCount`) |
//! | [`overrides`] | Per-call sampling options (`InferenceOverrides`) |
//! | [`model`] | The `LanguageModel` port and `ModelConfig` |
//! | [`registry`] | Pattern/priority adapter registry |
//! | [`errors`] | `InferenceError` and `RegistryError` |

pub mod errors;
pub mod identifiers;
pub mod model;
pub mod overrides;
pub mod registry;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{BoxError, InferenceError, RegistryError};
pub use identifiers::{ModelId, ProviderName};
pub use model::{InferenceStream, LanguageModel, ModelConfig, DEFAULT_MODEL_ID};
pub use overrides::{InferenceOverrides, StopSequences};
pub use registry::{ModelConstructor, ProviderRegistry, Registration};
pub use types::{FormatType, ScoredOutput, WorkerCount, DEFAULT_REQUIRES_FENCED_OUTPUT};
