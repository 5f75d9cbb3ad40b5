//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ContractManifest, GroupManifest, SourceManifest};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    manifest_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ManifestSummary>,
}

#[derive(Serialize)]
struct ManifestSummary {
    name: String,
    root: String,
    group_count: usize,
    collection_count: usize,
    qc_suite_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let path = &args.manifest.manifest;
    info!(manifest = %path.display(), "Validating manifest");

    let result = validate_manifest(path);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Manifest validation failed")
    }
}

fn validate_manifest(path: &std::path::Path) -> ValidationResult {
    let manifest_path = path.display().to_string();

    if !path.exists() {
        return ValidationResult {
            valid: false,
            manifest_path,
            error: Some(format!("File not found: {}", path.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(path) {
        Ok(manifest) => {
            let warnings = collect_warnings(&manifest);
            ValidationResult {
                valid: true,
                manifest_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ManifestSummary {
                    name: manifest.name.clone(),
                    root: manifest.root.display().to_string(),
                    group_count: manifest.groups.len(),
                    collection_count: manifest.collection_count(),
                    qc_suite_count: manifest.qc.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            manifest_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect manifest warnings (non-fatal issues)
fn collect_warnings(manifest: &ContractManifest) -> Vec<String> {
    let mut warnings = Vec::new();

    if manifest.groups.is_empty() {
        warnings.push("No groups declared - the contract will be empty".to_string());
    }
    if manifest.qc.is_empty() {
        warnings.push("No QC suites declared - `qc` will only check load status".to_string());
    }
    for group in &manifest.groups {
        collect_group_warnings(group, &group.label, &mut warnings);
    }

    warnings
}

fn collect_group_warnings(group: &GroupManifest, path: &str, warnings: &mut Vec<String>) {
    if group.groups.is_empty() && group.collections.is_empty() {
        warnings.push(format!("Group '{path}' is empty"));
    }
    for collection in &group.collections {
        let label = format!("{path}/{}", collection.label);
        let source = collection.source.path();
        if !source.exists() {
            warnings.push(format!(
                "Collection '{label}': source {} does not exist",
                source.display()
            ));
        }
        if let SourceManifest::FilePattern {
            allow_empty: true, ..
        } = &collection.source
        {
            warnings.push(format!(
                "Collection '{label}' allows an empty match - missing files will go unnoticed"
            ));
        }
    }
    for sub in &group.groups {
        collect_group_warnings(sub, &format!("{path}/{}", sub.label), warnings);
    }
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Manifest is valid: {}", result.manifest_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Contract: {}", summary.name);
            println!("  Root: {}", summary.root);
            println!("  Groups: {}", summary.group_count);
            println!("  Collections: {}", summary.collection_count);
            println!("  QC suites: {}", summary.qc_suite_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Manifest is invalid: {}", result.manifest_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
