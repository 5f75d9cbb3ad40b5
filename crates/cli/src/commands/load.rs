//! `load` command implementation.

use std::time::Instant;

use anyhow::{Context, Result};
use contracts::DataContract;
use observability::{LoadStatsAggregator, LoadSummary};
use serde::Serialize;
use tracing::{info, warn};

use super::{branch, build_contract, load_manifest};
use crate::cli::LoadArgs;
use crate::error::CliError;

/// Load report for JSON output
#[derive(Serialize)]
struct LoadReport {
    contract: String,
    streams: Vec<StreamLoad>,
    summary: LoadSummary,
}

#[derive(Serialize)]
struct StreamLoad {
    path: String,
    kind: String,
    loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the `load` command
pub fn run_load(args: &LoadArgs) -> Result<()> {
    let path = &args.manifest.manifest;
    info!(manifest = %path.display(), strict = args.strict, "Loading contract");

    let manifest = load_manifest(path)?;
    let mut contract = build_contract(&manifest)?;
    let report = load_contract(&mut contract, args.strict)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize load report")?;
        println!("{}", json);
    } else {
        print_load_report(&report);
    }

    Ok(())
}

/// Load every stream, timing each one
///
/// Strict mode stops at the first failure.
fn load_contract(contract: &mut DataContract, strict: bool) -> Result<LoadReport> {
    let mut stats = LoadStatsAggregator::new();
    let mut streams = Vec::new();

    for (path, stream) in contract.streams_mut() {
        let kind = stream.kind().as_str();
        let started = Instant::now();
        let outcome = stream.load().map(|t| (t.len(), t.columns().to_vec()));
        let elapsed = started.elapsed();

        stats.update(
            &path,
            kind,
            outcome.as_ref().map(|(rows, _)| *rows),
            elapsed,
        );
        match outcome {
            Ok((rows, columns)) => streams.push(StreamLoad {
                path,
                kind: kind.to_string(),
                loaded: true,
                rows: Some(rows),
                columns: Some(columns),
                error: None,
            }),
            Err(e) if strict => return Err(CliError::load_failed(path, e.to_string()).into()),
            Err(e) => {
                warn!(stream = %path, error = %e, "stream failed to load");
                streams.push(StreamLoad {
                    path,
                    kind: kind.to_string(),
                    loaded: false,
                    rows: None,
                    columns: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let summary = stats.summary();
    observability::record_contract_loaded(
        contract.name(),
        summary.loaded as usize,
        summary.failed as usize,
    );
    Ok(LoadReport {
        contract: contract.name().to_string(),
        streams,
        summary,
    })
}

fn print_load_report(report: &LoadReport) {
    println!("📂 {}", report.contract);
    let len = report.streams.len();
    for (i, stream) in report.streams.iter().enumerate() {
        let prefix = branch(i, len);
        match (&stream.rows, &stream.columns, &stream.error) {
            (Some(rows), Some(columns), _) => println!(
                "   {prefix} ✓ {} [{}] {rows} rows × {} columns",
                stream.path,
                stream.kind,
                columns.len()
            ),
            (_, _, error) => println!(
                "   {prefix} ✗ {} [{}] {}",
                stream.path,
                stream.kind,
                error.as_deref().unwrap_or("not loaded")
            ),
        }
    }
    println!();
    print!("{}", report.summary);
}
