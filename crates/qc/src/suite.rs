//! Suites, tests and run policy

use tracing::{debug, warn};

use crate::check::{Check, QcResult, Status};
use crate::error::{QcError, Result};

/// How raw check outcomes turn into reported statuses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunPolicy {
    /// A test that reports no checks passes instead of erroring
    pub allow_null_as_pass: bool,
    /// Skipped checks are reported as failures
    pub elevated_skips: bool,
    /// Warnings are reported as failures
    pub elevated_warnings: bool,
}

impl RunPolicy {
    /// Reported status for a raw check status
    pub fn apply(&self, status: Status) -> Status {
        match status {
            Status::Skipped if self.elevated_skips => Status::Failed,
            Status::Warning if self.elevated_warnings => Status::Failed,
            other => other,
        }
    }
}

/// A named test over a suite's state
pub struct QcTest<S> {
    pub name: &'static str,
    pub description: &'static str,
    pub run: fn(&S) -> Result<Vec<Check>>,
}

impl<S> QcTest<S> {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        run: fn(&S) -> Result<Vec<Check>>,
    ) -> Self {
        Self {
            name,
            description,
            run,
        }
    }
}

/// A group of tests sharing state
///
/// `setup` and `teardown` run around every test.
pub trait Suite {
    fn name(&self) -> &str;

    fn tests(&self) -> Vec<QcTest<Self>>
    where
        Self: Sized;

    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Object-safe view of a [`Suite`] used by the runner
pub trait RunnableSuite {
    fn suite_name(&self) -> &str;

    /// Run every test in order
    ///
    /// # Errors
    /// Only teardown failures; test failures become results.
    fn run(&mut self, policy: &RunPolicy) -> Result<Vec<QcResult>>;
}

impl<S: Suite> RunnableSuite for S {
    fn suite_name(&self) -> &str {
        self.name()
    }

    fn run(&mut self, policy: &RunPolicy) -> Result<Vec<QcResult>> {
        let suite = self.name().to_string();
        let mut results = Vec::new();

        for test in self.tests() {
            let outcome = match self.setup() {
                Ok(()) => (test.run)(&*self),
                Err(e) => Err(e),
            };
            self.teardown()
                .map_err(|e| QcError::teardown(&suite, test.name, e))?;

            debug!(suite = %suite, test = test.name, ok = outcome.is_ok(), "test finished");
            results.extend(test_results(&suite, &test, outcome, policy));
        }
        Ok(results)
    }
}

/// Reported results of one test run
fn test_results<S>(
    suite: &str,
    test: &QcTest<S>,
    outcome: Result<Vec<Check>>,
    policy: &RunPolicy,
) -> Vec<QcResult> {
    let result = |status: Status| QcResult {
        suite: suite.to_string(),
        test: test.name.to_string(),
        description: test.description.to_string(),
        status,
        value: None,
        message: None,
        context: None,
        error: None,
    };

    match outcome {
        Err(e) => {
            warn!(suite, test = test.name, error = %e, "test errored");
            vec![QcResult {
                message: Some(format!("Error during test execution: {e}")),
                error: Some(e.to_string()),
                ..result(Status::Error)
            }]
        }
        Ok(checks) if checks.is_empty() => {
            let status = if policy.allow_null_as_pass {
                Status::Passed
            } else {
                Status::Error
            };
            vec![QcResult {
                message: Some("test reported no checks".to_string()),
                ..result(status)
            }]
        }
        Ok(checks) => checks
            .into_iter()
            .map(|check| QcResult {
                value: check.value,
                message: check.message,
                context: check.context,
                ..result(policy.apply(check.status))
            })
            .collect(),
    }
}
