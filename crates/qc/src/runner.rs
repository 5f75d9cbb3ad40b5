//! Runner - executes suites in order and builds a report

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use crate::check::{QcResult, Status};
use crate::error::Result;
use crate::suite::{RunPolicy, RunnableSuite};

/// Counts per status
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultsStatistics {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub skipped: usize,
    pub warnings: usize,
    /// passed / total, 0 when there are no results
    pub pass_rate: f64,
}

impl ResultsStatistics {
    pub fn from_results(results: &[QcResult]) -> Self {
        let count = |status: Status| results.iter().filter(|r| r.status == status).count();
        let total = results.len();
        let passed = count(Status::Passed);
        Self {
            total,
            passed,
            failed: count(Status::Failed),
            errors: count(Status::Error),
            skipped: count(Status::Skipped),
            warnings: count(Status::Warning),
            pass_rate: if total > 0 {
                passed as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

/// Outcome of a full run
#[derive(Debug, Clone, Serialize)]
pub struct QcReport {
    pub timestamp: DateTime<Utc>,
    pub statistics: ResultsStatistics,
    pub results: Vec<QcResult>,
}

impl QcReport {
    pub fn new(results: Vec<QcResult>) -> Self {
        Self {
            timestamp: Utc::now(),
            statistics: ResultsStatistics::from_results(&results),
            results,
        }
    }

    /// No failures and no errors
    pub fn is_success(&self) -> bool {
        self.statistics.failed == 0 && self.statistics.errors == 0
    }

    /// Results that are neither passed nor skipped
    pub fn problems(&self) -> impl Iterator<Item = &QcResult> {
        self.results
            .iter()
            .filter(|r| !matches!(r.status, Status::Passed | Status::Skipped))
    }
}

/// Ordered collection of suites
#[derive(Default)]
pub struct Runner<'a> {
    suites: Vec<Box<dyn RunnableSuite + 'a>>,
}

impl<'a> Runner<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_suite(mut self, suite: impl RunnableSuite + 'a) -> Self {
        self.push(suite);
        self
    }

    pub fn push(&mut self, suite: impl RunnableSuite + 'a) {
        self.suites.push(Box::new(suite));
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    pub fn suite_names(&self) -> impl Iterator<Item = &str> {
        self.suites.iter().map(|s| s.suite_name())
    }

    /// Run every suite in insertion order
    ///
    /// # Errors
    /// A suite teardown failure stops the run.
    #[instrument(name = "qc_run_all", skip(self), fields(suites = self.suites.len()))]
    pub fn run_all(&mut self, policy: &RunPolicy) -> Result<QcReport> {
        let mut results = Vec::new();
        for suite in &mut self.suites {
            let suite_results = suite.run(policy)?;
            for r in &suite_results {
                metrics::counter!(
                    "contract_loader_qc_results_total",
                    "suite" => r.suite.clone(),
                    "status" => r.status.as_str()
                )
                .increment(1);
            }
            results.extend(suite_results);
        }

        let report = QcReport::new(results);
        info!(
            total = report.statistics.total,
            passed = report.statistics.passed,
            failed = report.statistics.failed,
            errors = report.statistics.errors,
            "qc run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Check;
    use crate::suite::{QcTest, Suite};

    struct Fixed(&'static str, Vec<Check>);

    impl Fixed {
        fn report(&self) -> Result<Vec<Check>> {
            Ok(self.1.clone())
        }
    }

    impl Suite for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn tests(&self) -> Vec<QcTest<Self>> {
            vec![QcTest::new("report", "fixed checks", Self::report)]
        }
    }

    #[test]
    fn test_run_all_preserves_suite_order() {
        let mut runner = Runner::new()
            .add_suite(Fixed("first", vec![Check::pass()]))
            .add_suite(Fixed("second", vec![Check::fail("bad"), Check::skip("n/a")]));
        assert_eq!(runner.suite_names().collect::<Vec<_>>(), vec!["first", "second"]);

        let report = runner.run_all(&RunPolicy::default()).unwrap();
        let suites: Vec<_> = report.results.iter().map(|r| r.suite.as_str()).collect();
        assert_eq!(suites, vec!["first", "second", "second"]);

        let stats = &report.statistics;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.passed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.skipped, 1);
        assert!((stats.pass_rate - 1.0 / 3.0).abs() < 1e-12);
        assert!(!report.is_success());
        assert_eq!(report.problems().count(), 1);
    }

    #[test]
    fn test_empty_report() {
        let report = Runner::new().run_all(&RunPolicy::default()).unwrap();
        assert_eq!(report.statistics.pass_rate, 0.0);
        assert!(report.is_success());
    }

    #[test]
    fn test_report_serializes() {
        let report = QcReport::new(vec![QcResult {
            suite: "s".into(),
            test: "t".into(),
            description: "d".into(),
            status: Status::Warning,
            value: None,
            message: Some("m".into()),
            context: None,
            error: None,
        }]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["results"][0]["status"], "warning");
        assert_eq!(json["statistics"]["warnings"], 1);
        assert!(json["results"][0].get("value").is_none());
    }
}
