//! # QC
//!
//! Quality-control checks over loaded contracts.
//!
//! - [`Suite`]: named tests sharing state, with per-test setup/teardown
//! - [`Runner`]: runs suites in order and produces a [`QcReport`]
//! - [`RunPolicy`]: null-as-pass and skip/warning elevation
//! - Built-in suites: [`HarpDeviceSuite`], [`TableSuite`], [`ContractSuite`]
//!
//! ## Usage Example
//!
//! ```ignore
//! use qc::{runner_for, RunPolicy};
//!
//! contract.load_all(false)?;
//! let mut runner = runner_for(&contract, &manifest.qc)?;
//! let report = runner.run_all(&RunPolicy::default())?;
//! println!("{}/{} passed", report.statistics.passed, report.statistics.total);
//! ```

mod check;
mod error;
mod plan;
mod runner;
mod suite;
pub mod suites;

// Re-exports
pub use check::{Check, QcResult, Status};
pub use error::{QcError, Result};
pub use plan::runner_for;
pub use runner::{QcReport, ResultsStatistics, Runner};
pub use suite::{QcTest, RunPolicy, RunnableSuite, Suite};
pub use suites::{ContractSuite, HarpDeviceSuite, TableSuite};
