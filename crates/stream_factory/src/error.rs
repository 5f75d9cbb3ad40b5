//! Stream Factory error types

use contracts::ContractError;
use thiserror::Error;

/// Stream Factory specific error
#[derive(Debug, Error)]
pub enum FactoryError {
    /// A collection factory failed while building a contract
    #[error("failed to build collection '{label}': {source}")]
    CollectionBuild {
        label: String,
        #[source]
        source: ContractError,
    },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl FactoryError {
    /// Create collection build error
    pub fn collection_build(label: impl Into<String>, source: ContractError) -> Self {
        Self::CollectionBuild {
            label: label.into(),
            source,
        }
    }

    /// Underlying contract error
    pub fn contract_error(&self) -> &ContractError {
        match self {
            Self::CollectionBuild { source, .. } => source,
            Self::Contract(e) => e,
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, FactoryError>;
