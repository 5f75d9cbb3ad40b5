//! # Contract Loader CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Manifest validation
//! - Contract inspection and loading
//! - QC runs with JSON reports

mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_load, run_qc, run_validate};

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging (and the metrics recorder) based on CLI options
    let metrics = observability::init_with_config(observability_config(&cli))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Contract Loader CLI starting"
    );

    // Execute command
    let result = match &cli.command {
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
        Commands::Load(args) => run_load(args),
        Commands::Qc(args) => run_qc(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    if let Some(handle) = metrics {
        eprintln!("{}", handle.render());
    }

    result
}

/// Map CLI options onto the observability configuration
fn observability_config(cli: &Cli) -> observability::ObservabilityConfig {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::ObservabilityConfig {
        log_format: cli.log_format.into(),
        default_log_level: default_log_level.to_string(),
        prometheus: cli.metrics,
    }
}
