//! Command-line arguments and their translation into a [`ModelConfig`].

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use extract::{FormatType, InferenceOverrides, ModelConfig, ModelId, ProviderName, WorkerCount};

/// Send prompts to a registered language model and print scored outputs as
/// JSON lines.
#[derive(Debug, Parser)]
#[command(name = "qwen-extract", version, about)]
pub struct Cli {
    /// Prompts to send. When empty, prompts are read from `--prompts-file`
    /// or, failing that, from stdin (one prompt per non-empty line).
    pub prompts: Vec<String>,

    /// File with one prompt per non-empty line.
    #[arg(long, value_name = "PATH")]
    pub prompts_file: Option<PathBuf>,

    /// TOML file deserialised into the model configuration. Flags override it.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend model identifier (selects the adapter unless --provider is set).
    #[arg(long)]
    pub model_id: Option<String>,

    /// Explicit adapter name, bypassing model-id pattern matching.
    #[arg(long)]
    pub provider: Option<String>,

    /// API key. Prefer DASHSCOPE_API_KEY in the environment or .env file.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Backend base URL.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Output format requested from the model: json, yaml or text.
    #[arg(long)]
    pub format: Option<FormatType>,

    /// Maximum concurrent infer calls.
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Prompts per infer call.
    #[arg(long, default_value_t = 1)]
    pub batch_size: usize,

    /// Sampling temperature for this run.
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Upper bound on generated tokens per prompt.
    #[arg(long)]
    pub max_output_tokens: Option<u32>,

    #[arg(long)]
    pub top_p: Option<f64>,

    #[arg(long)]
    pub seed: Option<i64>,

    /// Environment file loaded before anything else. Variables already set
    /// in the process environment win.
    #[arg(long, value_name = "PATH", default_value = ".env")]
    pub env_file: PathBuf,

    /// Log output format (logs go to stderr).
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Print registered providers and exit.
    #[arg(long)]
    pub list_providers: bool,
}

/// How log events are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Cli {
    /// Builds the model configuration: the `--config` file (or defaults),
    /// then any flags given on the command line.
    pub fn model_config(&self) -> anyhow::Result<ModelConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_file(path)?,
            None => ModelConfig::default(),
        };

        if let Some(model_id) = &self.model_id {
            config.model_id = ModelId::new(model_id.as_str()).context("--model-id must not be empty")?;
        }
        if let Some(provider) = &self.provider {
            config.provider = Some(ProviderName::new(provider.as_str()).context("--provider must not be empty")?);
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = Some(api_key.clone());
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = Some(base_url.clone());
        }
        if let Some(format) = self.format {
            config.format_type = format;
        }
        if let Some(workers) = self.max_workers {
            config.max_workers = WorkerCount::new(workers).context("--max-workers must be at least 1")?;
        }
        Ok(config)
    }

    /// Per-run sampling overrides taken from flags.
    pub fn overrides(&self) -> InferenceOverrides {
        InferenceOverrides {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            top_p: self.top_p,
            seed: self.seed,
            ..Default::default()
        }
    }

    /// Collects prompts from arguments, `--prompts-file`, or stdin.
    pub fn read_prompts(&self) -> anyhow::Result<Vec<String>> {
        if !self.prompts.is_empty() {
            return Ok(self.prompts.clone());
        }
        let text = match &self.prompts_file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read prompts from {}", path.display()))?,
            None => std::io::read_to_string(std::io::stdin()).context("failed to read prompts from stdin")?,
        };
        let prompts = split_prompts(&text);
        if prompts.is_empty() {
            bail!("no prompts given");
        }
        Ok(prompts)
    }
}

fn load_config_file(path: &Path) -> anyhow::Result<ModelConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse config file {}", path.display()))
}

fn split_prompts(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
