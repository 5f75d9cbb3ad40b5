//! Command implementations.

mod info;
mod load;
mod qc;
mod validate;

pub use info::run_info;
pub use load::run_load;
pub use qc::run_qc;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::{ContractManifest, DataContract};
use stream_factory::ContractBuilder;

use crate::error::CliError;

/// Load and validate a manifest, with paths resolved against its location
fn load_manifest(path: &Path) -> Result<ContractManifest> {
    if !path.exists() {
        return Err(CliError::manifest_not_found(path.display().to_string()).into());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load manifest from {}", path.display()))
}

/// Build the contract declared by a manifest
fn build_contract(manifest: &ContractManifest) -> Result<DataContract> {
    let contract = ContractBuilder::build(manifest).map_err(CliError::from)?;
    observability::record_contract_built(contract.name(), contract.walk_streams().len());
    Ok(contract)
}

/// Tree glyph for the `index`-th of `len` siblings
fn branch(index: usize, len: usize) -> &'static str {
    if index + 1 == len {
        "└─"
    } else {
        "├─"
    }
}
