//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Manifest file not found
    #[error("Manifest file not found: {path}")]
    ManifestNotFound { path: String },

    /// Contract could not be built from the manifest
    #[error("Failed to build contract: {0}")]
    Build(#[from] stream_factory::FactoryError),

    /// Strict load stopped at a failing stream
    #[error("Stream '{stream}' failed to load: {message}")]
    LoadFailed { stream: String, message: String },

    /// QC run produced failures or errors
    #[error("QC failed: {failed} failed, {errors} errored of {total} results")]
    QcFailed {
        failed: usize,
        errors: usize,
        total: usize,
    },

    /// QC could not run
    #[error(transparent)]
    Qc(#[from] qc::QcError),
}

impl CliError {
    pub fn manifest_not_found(path: impl Into<String>) -> Self {
        Self::ManifestNotFound { path: path.into() }
    }

    pub fn load_failed(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LoadFailed {
            stream: stream.into(),
            message: message.into(),
        }
    }

    pub fn qc_failed(stats: &qc::ResultsStatistics) -> Self {
        Self::QcFailed {
            failed: stats.failed,
            errors: stats.errors,
            total: stats.total,
        }
    }
}
