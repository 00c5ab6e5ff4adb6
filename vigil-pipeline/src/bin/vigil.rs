//! Command-line entry point: one cycle (`run`), a standing loop
//! (`serve`), or a read-only snapshot of the last-known state (`stats`).

use std::collections::BTreeMap;
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vigil_adapters::SourceAdapter;
use vigil_pipeline::{Metrics, Orchestrator, PipelineConfig, Statistics, StartupError};
use vigil_runtime::TokioRuntime;

#[derive(Debug, Parser)]
#[command(name = "vigil", about = "Threat-intelligence ingestion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a single ingestion cycle across every enabled source and exit.
    Run,
    /// Run ingestion cycles on the configured interval until interrupted.
    Serve,
    /// Print processed-item counts and last-sync watermarks per source,
    /// read from whatever the most recent cycle left on disk.
    Stats,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Fails fast if the data directory can't be created or written to
/// (spec §7: "data directory unwritable" is a fatal startup error, not
/// a per-cycle one swallowed at sink-write time).
fn ensure_data_dir(config: &PipelineConfig) -> Result<(), StartupError> {
    fs::create_dir_all(&config.data_dir)
        .map_err(|err| StartupError::DataDirUnwritable(config.data_dir.display().to_string(), err))
}

/// Adapters this binary knows how to construct are wired here; real
/// network-backed adapters live outside this crate's scope (spec §1)
/// so only test doubles are registered unless the caller supplies a
/// production adapter at embedding time — see `Orchestrator::new`.
fn build_adapters() -> BTreeMap<String, Arc<dyn SourceAdapter>> {
    BTreeMap::new()
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let config = match PipelineConfig::load() {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::error!(error = %err, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = ensure_data_dir(&config) {
        tracing::error!(error = %err, "startup check failed");
        return ExitCode::FAILURE;
    }

    let metrics = Arc::new(Metrics::new());

    match cli.command {
        Command::Run => {
            let mut orchestrator = Orchestrator::new(config, build_adapters(), Arc::clone(&metrics), TokioRuntime::new());
            let report = orchestrator.run_cycle().await;
            for source in &report.sources {
                if let Some(err) = &source.error {
                    tracing::warn!(source = %source.source, error = %err, "source failed this cycle");
                } else {
                    tracing::info!(
                        source = %source.source,
                        fetched = source.fetched,
                        unique = source.unique,
                        quality_score = source.quality_score,
                        "source ingested"
                    );
                }
            }
            ExitCode::SUCCESS
        }
        Command::Serve => {
            let mut orchestrator = Orchestrator::new(config, build_adapters(), Arc::clone(&metrics), TokioRuntime::new());
            let shutdown = orchestrator.shutdown_signal();
            let ctrl_c = tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                shutdown.request();
            });
            orchestrator.run_forever().await;
            ctrl_c.abort();
            ExitCode::SUCCESS
        }
        Command::Stats => {
            let stats = Statistics::collect(&config);
            print!("{}", stats.render_text());
            ExitCode::SUCCESS
        }
    }
}
