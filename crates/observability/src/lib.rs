//! # Observability
//!
//! Tracing and Prometheus metrics for contract loading.
//!
//! ## Features
//!
//! - Tracing initialization (JSON/Pretty/Compact formats)
//! - In-process Prometheus recorder with a renderable snapshot
//! - Load statistics aggregation
//!
//! ## Example
//!
//! ```ignore
//! use observability::{init_with_config, LoadStatsAggregator, ObservabilityConfig};
//!
//! let handle = init_with_config(ObservabilityConfig::default())?;
//!
//! let mut stats = LoadStatsAggregator::new();
//! for (path, stream) in contract.streams_mut() {
//!     let started = std::time::Instant::now();
//!     let rows = stream.load().map(|t| t.len());
//!     stats.update(&path, stream.kind().as_str(), rows.as_ref().copied(), started.elapsed());
//! }
//! println!("{}", stats.summary());
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_contract_built, record_contract_loaded, KindCounts, LoadFailure, LoadStatsAggregator,
    LoadSummary, RunningStats, StatsSummary,
};

/// Initialize observability with defaults (compact logs, metrics recorder on)
pub fn init() -> Result<Option<PrometheusHandle>> {
    init_with_config(ObservabilityConfig::default())
}

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log format
    pub log_format: LogFormat,
    /// Default log level when `RUST_LOG` is unset
    pub default_log_level: String,
    /// Install a Prometheus recorder
    pub prometheus: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Compact,
            default_log_level: "info".to_string(),
            prometheus: true,
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs
    Json,
    /// Human-readable format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

/// Initialize with a custom configuration
///
/// Logs go to stderr so command output on stdout stays machine readable.
/// Returns the Prometheus handle when a recorder was installed.
pub fn init_with_config(config: ObservabilityConfig) -> Result<Option<PrometheusHandle>> {
    // 1. Initialize Tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    // 2. Install Prometheus recorder (if enabled)
    let handle = if config.prometheus {
        Some(init_metrics_only()?)
    } else {
        None
    };

    tracing::debug!(
        log_format = ?config.log_format,
        prometheus = config.prometheus,
        "Observability initialized"
    );

    Ok(handle)
}

/// Install only the Prometheus recorder (tracing left untouched)
///
/// For callers that set up tracing themselves. Use
/// [`PrometheusHandle::render`] to obtain the exposition text.
pub fn init_metrics_only() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    tracing::debug!("Prometheus recorder installed");
    Ok(handle)
}
