//! Shared value types for the extraction framework.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! values with invariants (worker counts are strictly positive, format modes
//! are a closed set) and participate in request building.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Output format
// ---------------------------------------------------------------------------

/// The format a model is asked to produce its answer in.
///
/// Drives both the system instruction sent to the backend and whether the
/// framework should expect code-fenced output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatType {
    /// Raw JSON. Backends that support it are asked for a JSON object directly.
    #[default]
    Json,
    /// YAML, conventionally wrapped in a fenced block.
    Yaml,
    /// Unconstrained text; no format instruction is sent.
    Text,
}

impl FormatType {
    /// Returns the lowercase name used in configuration files and CLI flags.
    pub fn as_str(self) -> &'static str {
        match self {
            FormatType::Json => "json",
            FormatType::Yaml => "yaml",
            FormatType::Text => "text",
        }
    }
}

impl std::fmt::Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FormatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(FormatType::Json),
            "yaml" | "yml" => Ok(FormatType::Yaml),
            "text" => Ok(FormatType::Text),
            other => Err(format!("unknown format type '{other}' (expected json, yaml or text)")),
        }
    }
}

/// Whether a model is expected to wrap its output in code fences when no
/// provider-specific policy applies.
///
/// Providers that can request raw structured output (e.g. JSON mode) override
/// this for the formats they support natively.
pub const DEFAULT_REQUIRES_FENCED_OUTPUT: bool = true;

// ---------------------------------------------------------------------------
// Scored output
// ---------------------------------------------------------------------------

/// One candidate answer paired with its score.
///
/// Adapters that cannot compute a likelihood report [`ScoredOutput::CERTAIN`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredOutput {
    /// Confidence or likelihood of this candidate.
    pub score: f64,
    /// The raw text produced by the model.
    pub output: String,
}

impl ScoredOutput {
    /// Fixed score used by adapters that return a single unscored candidate.
    pub const CERTAIN: f64 = 1.0;

    /// Creates a [`ScoredOutput`] with score [`ScoredOutput::CERTAIN`].
    pub fn certain(output: impl Into<String>) -> Self {
        Self {
            score: Self::CERTAIN,
            output: output.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Worker count
// ---------------------------------------------------------------------------

/// Upper bound on concurrent inference workers the caller may use against a
/// single model.
///
/// This is a hint for the caller's dispatch layer; adapters never spawn
/// workers themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct WorkerCount(NonZeroUsize);

impl WorkerCount {
    /// Default worker count when none is configured.
    pub const DEFAULT: WorkerCount = match NonZeroUsize::new(10) {
        Some(n) => WorkerCount(n),
        None => unreachable!(),
    };

    /// Creates a [`WorkerCount`], returning `None` for zero.
    #[must_use]
    pub fn new(count: usize) -> Option<Self> {
        NonZeroUsize::new(count).map(Self)
    }

    /// Returns the count as a `usize` (always at least 1).
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<usize> for WorkerCount {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "worker count must be at least 1".to_string())
    }
}

impl From<WorkerCount> for usize {
    fn from(value: WorkerCount) -> Self {
        value.get()
    }
}

impl std::fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
