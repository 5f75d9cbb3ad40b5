//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Contract Loader - declarative access to behavior session data
#[derive(Parser, Debug)]
#[command(
    name = "contract-loader",
    author,
    version,
    about = "Build, load and quality-check behavior data contracts",
    long_about = "Reads a contract manifest describing how a session's files map onto \n\
                  groups, collections and streams, builds the contract, loads the \n\
                  streams on demand and runs the declared QC suites."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CONTRACT_LOADER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "CONTRACT_LOADER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Print a Prometheus metrics snapshot to stderr when the command ends
    #[arg(long, global = true, env = "CONTRACT_LOADER_METRICS")]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse and validate a manifest without touching the data
    Validate(ValidateArgs),

    /// Build the contract and display its groups, collections and streams
    Info(InfoArgs),

    /// Build the contract and load every stream
    Load(LoadArgs),

    /// Build and load the contract, then run the declared QC suites
    Qc(QcArgs),
}

/// Manifest location shared by every command
#[derive(Parser, Debug, Clone)]
pub struct ManifestArg {
    /// Path to the contract manifest (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "contract.toml",
        env = "CONTRACT_LOADER_MANIFEST"
    )]
    pub manifest: PathBuf,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub manifest: ManifestArg,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub manifest: ManifestArg,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// List the streams of every collection
    #[arg(long)]
    pub streams: bool,
}

/// Arguments for the `load` command
#[derive(Parser, Debug)]
pub struct LoadArgs {
    #[command(flatten)]
    pub manifest: ManifestArg,

    /// Stop at the first stream that fails to load
    #[arg(long)]
    pub strict: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `qc` command
#[derive(Parser, Debug)]
pub struct QcArgs {
    #[command(flatten)]
    pub manifest: ManifestArg,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Tests that report nothing pass instead of erroring
    #[arg(long)]
    pub allow_null_as_pass: bool,

    /// Report skipped checks as failures
    #[arg(long)]
    pub elevate_skips: bool,

    /// Report warnings as failures
    #[arg(long)]
    pub elevate_warnings: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
