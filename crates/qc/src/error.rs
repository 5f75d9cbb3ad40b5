//! QC error types

use contracts::ContractError;
use thiserror::Error;

/// QC errors
///
/// A test returning one of these produces an `Error` result; only teardown
/// failures abort a run.
#[derive(Debug, Error)]
pub enum QcError {
    /// Stream was never loaded (or its load failed)
    #[error("stream '{stream}' has no loaded data")]
    NotLoaded { stream: String },

    /// Column required by a test is absent
    #[error("stream '{stream}' has no column '{column}'")]
    MissingColumn { stream: String, column: String },

    /// Test-specific precondition failure
    #[error("{0}")]
    Check(String),

    /// Suite teardown failed
    #[error("teardown of {suite}::{test} failed: {source}")]
    Teardown {
        suite: String,
        test: String,
        #[source]
        source: Box<QcError>,
    },

    /// Contract-level error (lookup, load)
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl QcError {
    pub fn not_loaded(stream: impl Into<String>) -> Self {
        Self::NotLoaded {
            stream: stream.into(),
        }
    }

    pub fn missing_column(stream: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            stream: stream.into(),
            column: column.into(),
        }
    }

    pub fn check(message: impl Into<String>) -> Self {
        Self::Check(message.into())
    }

    pub fn teardown(suite: impl Into<String>, test: impl Into<String>, source: QcError) -> Self {
        Self::Teardown {
            suite: suite.into(),
            test: test.into(),
            source: Box::new(source),
        }
    }
}

/// Result type for the QC crate
pub type Result<T> = std::result::Result<T, QcError>;
