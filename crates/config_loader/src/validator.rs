//! Manifest validation
//!
//! Rules:
//! - field-level constraints declared with `validator` derive
//! - labels unique among siblings (groups and collections share a namespace)
//! - include / exclude patterns non-empty and syntactically valid
//! - CSV delimiters are single ASCII characters
//! - QC targets refer to declared collections

use std::collections::HashSet;

use contracts::{
    ContractError, ContractManifest, GroupManifest, QcSuiteKind, SourceManifest, StreamSpec,
};
use validator::Validate;

/// Validate a ContractManifest
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(manifest: &ContractManifest) -> Result<(), ContractError> {
    validate_fields(manifest)?;
    validate_labels("groups", &manifest.groups)?;
    for group in &manifest.groups {
        validate_group(group, &group.label)?;
    }
    validate_qc(manifest)?;
    Ok(())
}

/// Derive-declared field constraints
fn validate_fields(manifest: &ContractManifest) -> Result<(), ContractError> {
    manifest
        .validate()
        .map_err(|e| ContractError::config_validation("manifest", e.to_string()))
}

/// Sibling group labels are unique
fn validate_labels(field: &str, groups: &[GroupManifest]) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for group in groups {
        if !seen.insert(group.label.as_str()) {
            return Err(ContractError::config_validation(
                format!("{field}[label={}]", group.label),
                "duplicate label",
            ));
        }
    }
    Ok(())
}

fn validate_group(group: &GroupManifest, path: &str) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    let labels = group
        .collections
        .iter()
        .map(|c| c.label.as_str())
        .chain(group.groups.iter().map(|g| g.label.as_str()));
    for label in labels {
        if !seen.insert(label) {
            return Err(ContractError::config_validation(
                format!("{path}/{label}"),
                "duplicate label",
            ));
        }
    }

    for collection in &group.collections {
        validate_source(&format!("{path}/{}", collection.label), &collection.source)?;
    }
    for sub in &group.groups {
        validate_group(sub, &format!("{path}/{}", sub.label))?;
    }
    Ok(())
}

fn validate_source(path: &str, source: &SourceManifest) -> Result<(), ContractError> {
    let SourceManifest::FilePattern {
        include,
        exclude,
        stream,
        ..
    } = source
    else {
        return Ok(());
    };

    if include.is_empty() {
        return Err(ContractError::config_validation(
            format!("{path}.include"),
            "at least one include pattern is required",
        ));
    }
    for (field, patterns) in [("include", include), ("exclude", exclude)] {
        for pattern in patterns {
            glob::Pattern::new(pattern).map_err(|e| {
                ContractError::config_validation(
                    format!("{path}.{field}"),
                    format!("invalid pattern '{pattern}': {e}"),
                )
            })?;
        }
    }

    if let StreamSpec::Csv { delimiter, .. } = stream {
        if !delimiter.is_ascii() {
            return Err(ContractError::config_validation(
                format!("{path}.stream.delimiter"),
                format!("delimiter {delimiter:?} must be an ASCII character"),
            ));
        }
    }
    Ok(())
}

/// QC declarations point at existing collections
fn validate_qc(manifest: &ContractManifest) -> Result<(), ContractError> {
    let collections: HashSet<String> = manifest.collection_paths().into_iter().collect();

    for (idx, qc) in manifest.qc.iter().enumerate() {
        match (&qc.target, qc.suite) {
            (None, QcSuiteKind::HarpDevice | QcSuiteKind::Table) => {
                return Err(ContractError::config_validation(
                    format!("qc[{idx}].target"),
                    "target is required for this suite",
                ));
            }
            (Some(target), _) if !collections.contains(target) => {
                return Err(ContractError::config_validation(
                    format!("qc[{idx}].target"),
                    format!("'{target}' is not a declared collection"),
                ));
            }
            _ => {}
        }
        if let Some(commands) = &qc.commands {
            if !collections.contains(commands) {
                return Err(ContractError::config_validation(
                    format!("qc[{idx}].commands"),
                    format!("'{commands}' is not a declared collection"),
                ));
            }
        }
    }
    Ok(())
}
