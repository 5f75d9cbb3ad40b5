//! Built-in suites
//!
//! - `harp`: checks every Harp device log should pass
//! - `table`: shape checks for any tabular stream
//! - `contract`: load status of a whole contract

mod contract;
mod harp;
mod table;

pub use contract::ContractSuite;
pub use harp::HarpDeviceSuite;
pub use table::TableSuite;

use contracts::{DataStream, Table};

use crate::error::{QcError, Result};

/// Loaded table of a stream
fn loaded(stream: &DataStream) -> Result<&Table> {
    stream
        .data()
        .ok_or_else(|| QcError::not_loaded(stream.name()))
}

/// Position of the first index value lower than its predecessor
fn first_decrease(values: &[f64]) -> Option<usize> {
    values.windows(2).position(|w| w[1] < w[0]).map(|i| i + 1)
}
