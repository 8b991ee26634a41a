//! SUA updater - keeps the SUA desktop application current
//!
//! This is the entry point for the updater executable. One invocation makes
//! one pass: find the installed application, install or update it when
//! needed, then launch it.

mod cli;
mod output;

use anyhow::{Context, Result};
use camino::Utf8Path;
use clap::Parser;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use output::{TerminalNotifier, TerminalProgress};
use sua_core::{HierarchicalConfigLoader, UpdaterConfig};
use sua_update::{pump_events, ChannelReporter, Decision, RunOutcome, UpdateOrchestrator};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = load_config(cli.config.as_deref())?;
    let orchestrator = UpdateOrchestrator::new(config)?;

    if !cli.quiet {
        output::header(&format!(
            "SUA updater {} (target SUA {})",
            sua_update::VERSION,
            orchestrator.release().version
        ));
    }

    // The worker owns the orchestrator; this task only drives the display.
    let (reporter, receiver) = ChannelReporter::channel();
    let worker = tokio::spawn(async move { orchestrator.run(&reporter, &reporter).await });

    let progress = TerminalProgress::new(cli.quiet);
    let notifier = TerminalNotifier::new(progress.bar(), cli.quiet);
    let forwarded = pump_events(receiver, &progress, &notifier).await;
    debug!("Forwarded {} progress events", forwarded);

    let outcome = worker.await.context("Update worker stopped unexpectedly")?;
    progress.finish();

    Ok(summarize(&outcome, cli.quiet))
}

/// Load embedded defaults, the user file and environment overrides
fn load_config(path: Option<&Utf8Path>) -> Result<UpdaterConfig> {
    let loader = HierarchicalConfigLoader::new().context("Failed to resolve config directory")?;
    let loader = match path {
        Some(path) => loader.with_file(path.to_path_buf()),
        None => loader,
    };

    loader.load().context("Failed to load updater configuration")
}

/// Print the final result and pick the exit code
fn summarize(outcome: &RunOutcome, quiet: bool) -> ExitCode {
    match outcome {
        RunOutcome::Completed {
            decision,
            executable,
            launched,
        } => {
            if !quiet {
                let what = match decision {
                    Decision::UpToDate => "SUA is up to date",
                    Decision::Provisioned => "SUA installed",
                    Decision::Updated => "SUA updated",
                };
                output::success(what);
                output::kv("Executable", &executable.display().to_string());
                output::kv("Launched", if *launched { "yes" } else { "no" });
            }
            ExitCode::SUCCESS
        }
        RunOutcome::Failed { phase, error } => {
            output::error(&format!("{:?} failed: {}", phase, error));
            if let Some(attempts) = error.exhausted_attempts() {
                for attempt in attempts {
                    output::kv(
                        &format!("Attempt {} ({})", attempt.strategy_index + 1, attempt.strategy),
                        &match attempt.exit_code {
                            Some(code) => format!("exit code {}", code),
                            None => "no exit code".to_string(),
                        },
                    );
                }
            }
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
