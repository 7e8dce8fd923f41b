//! qwen-extract CLI entry point.
//!
//! This binary is the composition root for the workspace. Responsibilities:
//!
//! 1. **Load configuration**: the `.env` file, then an optional TOML model
//!    configuration, then command-line flags.
//! 2. **Wire observability**: configure `tracing-subscriber` (human or JSON
//!    output on stderr) and, when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an
//!    OpenTelemetry OTLP exporter. All `tracing` spans and events emitted by
//!    every crate flow through this layer.
//! 3. **Build the registry**: register every adapter explicitly and resolve
//!    the configured model through it.
//! 4. **Dispatch**: run prompts in batches, at most `max_workers` at a time,
//!    and print one JSON line per prompt on stdout.

mod args;
mod dispatch;
mod env_file;
mod observability;

use std::io::Write;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use extract::{ProviderRegistry, ScoredOutput};
use serde::Serialize;

use crate::args::Cli;

/// One line of output.
#[derive(Debug, Serialize)]
struct OutputLine<'a> {
    index: usize,
    prompt: &'a str,
    outputs: &'a [ScoredOutput],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Before the runtime starts: this mutates the process environment.
    env_file::load(&cli.env_file)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start Tokio runtime")?;

    runtime.block_on(async {
        let telemetry = observability::init(cli.log_format)?;
        let result = run(cli).await;
        if let Err(e) = &result {
            tracing::error!(error = %format!("{e:#}"), "run failed");
        }
        telemetry.shutdown();
        result
    })
}

fn build_registry() -> anyhow::Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    qwen::register(&mut registry, qwen::default_transport_factory())
        .context("failed to register the Qwen provider")?;
    Ok(registry)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let registry = build_registry()?;

    if cli.list_providers {
        for name in registry.registered() {
            let registration = registry.resolve_by_name(name)?;
            println!("{name}\t{}\tpriority={}", registration.pattern(), registration.priority());
        }
        return Ok(());
    }

    let config = cli.model_config()?;
    let model = registry
        .create(&config)
        .with_context(|| format!("failed to construct a model for '{}'", config.model_id))?;
    tracing::info!(
        model_id = %model.model_id(),
        format = %model.format_type(),
        fenced_output = model.requires_fenced_output(),
        "model ready"
    );

    let prompts = cli.read_prompts()?;
    let started = Instant::now();
    let results = dispatch::run_batches(model.as_ref(), prompts.clone(), cli.batch_size, &cli.overrides())
        .await
        .context("inference failed")?;

    let mut stdout = std::io::stdout().lock();
    for (index, (prompt, outputs)) in prompts.iter().zip(&results).enumerate() {
        let line = OutputLine {
            index,
            prompt,
            outputs,
        };
        serde_json::to_writer(&mut stdout, &line).context("failed to serialise output")?;
        writeln!(stdout).context("failed to write output")?;
    }

    tracing::info!(
        prompts = results.len(),
        elapsed = ?started.elapsed(),
        "inference complete"
    );
    Ok(())
}
