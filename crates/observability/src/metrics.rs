//! Load metrics
//!
//! Contract-level counters and an in-memory aggregator for load summaries.
//! Per-stream counters are recorded by `DataStream::load` itself.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use contracts::ContractError;
use metrics::{counter, gauge};
use serde::Serialize;

/// Record a built contract
pub fn record_contract_built(contract: &str, streams: usize) {
    counter!("contract_loader_contracts_built_total").increment(1);
    gauge!("contract_loader_contract_streams", "contract" => contract.to_string())
        .set(streams as f64);
}

/// Record the outcome of loading a whole contract
pub fn record_contract_loaded(contract: &str, loaded: usize, failed: usize) {
    gauge!("contract_loader_contract_loaded_streams", "contract" => contract.to_string())
        .set(loaded as f64);
    gauge!("contract_loader_contract_failed_streams", "contract" => contract.to_string())
        .set(failed as f64);
}

/// Load statistics aggregator
///
/// Aggregates per-stream load outcomes in memory for summaries.
#[derive(Debug, Clone, Default)]
pub struct LoadStatsAggregator {
    /// Streams seen
    pub total_streams: u64,

    /// Streams loaded successfully
    pub loaded: u64,

    /// Streams whose load failed
    pub failed: u64,

    /// Row count statistics of loaded streams
    pub rows_stats: RunningStats,

    /// Load duration statistics (milliseconds), failures included
    pub load_ms_stats: RunningStats,

    /// Outcomes per stream kind
    pub per_kind: BTreeMap<String, KindCounts>,

    /// Failed streams in the order they were seen
    pub failures: Vec<LoadFailure>,
}

/// Loaded / failed counts of one stream kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub loaded: u64,
    pub failed: u64,
}

/// One failed stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    pub path: String,
    pub kind: String,
    pub error: String,
}

impl LoadStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one stream outcome; `Ok` carries the row count
    pub fn update(
        &mut self,
        path: &str,
        kind: &str,
        outcome: Result<usize, &ContractError>,
        elapsed: Duration,
    ) {
        self.total_streams += 1;
        self.load_ms_stats.push(elapsed.as_secs_f64() * 1000.0);
        let counts = self.per_kind.entry(kind.to_string()).or_default();

        match outcome {
            Ok(rows) => {
                self.loaded += 1;
                counts.loaded += 1;
                self.rows_stats.push(rows as f64);
            }
            Err(e) => {
                self.failed += 1;
                counts.failed += 1;
                self.failures.push(LoadFailure {
                    path: path.to_string(),
                    kind: kind.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Generate a summary report
    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            total_streams: self.total_streams,
            loaded: self.loaded,
            failed: self.failed,
            failure_rate: if self.total_streams > 0 {
                self.failed as f64 / self.total_streams as f64 * 100.0
            } else {
                0.0
            },
            rows: StatsSummary::from(&self.rows_stats),
            load_ms: StatsSummary::from(&self.load_ms_stats),
            per_kind: self.per_kind.clone(),
            failures: self.failures.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Load summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadSummary {
    pub total_streams: u64,
    pub loaded: u64,
    pub failed: u64,
    pub failure_rate: f64,
    pub rows: StatsSummary,
    pub load_ms: StatsSummary,
    pub per_kind: BTreeMap<String, KindCounts>,
    pub failures: Vec<LoadFailure>,
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Load Summary ===")?;
        writeln!(f, "Streams: {}", self.total_streams)?;
        writeln!(f, "Loaded: {}", self.loaded)?;
        writeln!(f, "Failed: {} ({:.2}%)", self.failed, self.failure_rate)?;
        writeln!(f, "Rows: {}", self.rows)?;
        writeln!(f, "Load time (ms): {}", self.load_ms)?;

        if !self.per_kind.is_empty() {
            writeln!(f, "By kind:")?;
            for (kind, counts) in &self.per_kind {
                writeln!(f, "  {kind}: {} loaded, {} failed", counts.loaded, counts.failed)?;
            }
        }
        if !self.failures.is_empty() {
            writeln!(f, "Failures:")?;
            for failure in &self.failures {
                writeln!(f, "  {}: {}", failure.path, failure.error)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = LoadStatsAggregator::new();
        aggregator.update("behavior/Rig/a", "csv", Ok(10), Duration::from_millis(2));
        aggregator.update("behavior/Rig/b", "csv", Ok(20), Duration::from_millis(4));
        aggregator.update(
            "behavior/Behavior/WhoAmI",
            "harp",
            Err(&ContractError::decode("x.bin", "bad payload")),
            Duration::from_millis(1),
        );

        assert_eq!(aggregator.total_streams, 3);
        assert_eq!(aggregator.loaded, 2);
        assert_eq!(aggregator.failed, 1);
        assert_eq!(aggregator.per_kind["csv"], KindCounts { loaded: 2, failed: 0 });
        assert_eq!(aggregator.per_kind["harp"], KindCounts { loaded: 0, failed: 1 });
        assert_eq!(aggregator.failures[0].path, "behavior/Behavior/WhoAmI");
        assert!((aggregator.rows_stats.mean() - 15.0).abs() < 1e-10);

        aggregator.reset();
        assert_eq!(aggregator.total_streams, 0);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = LoadStatsAggregator::new();
        aggregator.update("a", "text", Ok(1), Duration::ZERO);
        aggregator.update(
            "b",
            "text",
            Err(&ContractError::missing_source("b.txt", "gone")),
            Duration::ZERO,
        );

        let output = aggregator.summary().to_string();
        assert!(output.contains("Streams: 2"));
        assert!(output.contains("50.00%"));
        assert!(output.contains("text: 1 loaded, 1 failed"));
    }

    #[test]
    fn test_empty_summary() {
        let summary = LoadStatsAggregator::new().summary();
        assert_eq!(summary.failure_rate, 0.0);
        assert_eq!(summary.rows.to_string(), "N/A");
    }
}
