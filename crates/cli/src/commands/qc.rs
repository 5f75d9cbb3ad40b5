//! `qc` command implementation.

use anyhow::{Context, Result};
use ::qc::{runner_for, ContractSuite, QcReport, RunPolicy, Status};
use contracts::{DataContract, QcManifest};
use tracing::{info, warn};

use super::{build_contract, load_manifest};
use crate::cli::QcArgs;
use crate::error::CliError;

/// Execute the `qc` command
pub fn run_qc(args: &QcArgs) -> Result<()> {
    let path = &args.manifest.manifest;
    info!(manifest = %path.display(), "Running QC");

    let manifest = load_manifest(path)?;
    let mut contract = build_contract(&manifest)?;
    for (stream, e) in contract.load_all(false)? {
        warn!(stream = %stream, error = %e, "stream failed to load");
    }

    let policy = RunPolicy {
        allow_null_as_pass: args.allow_null_as_pass,
        elevated_skips: args.elevate_skips,
        elevated_warnings: args.elevate_warnings,
    };
    let report = run_suites(&contract, &manifest.qc, &policy)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize QC report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::qc_failed(&report.statistics).into())
    }
}

/// Run the declared suites; without declarations only the load status is checked
fn run_suites(
    contract: &DataContract,
    declarations: &[QcManifest],
    policy: &RunPolicy,
) -> Result<QcReport> {
    let mut runner = runner_for(contract, declarations).map_err(CliError::from)?;
    if runner.is_empty() {
        runner.push(ContractSuite::new(contract));
    }
    Ok(runner.run_all(policy).map_err(CliError::from)?)
}

fn symbol(status: Status) -> &'static str {
    match status {
        Status::Passed => "✓",
        Status::Failed => "✗",
        Status::Error => "‼",
        Status::Skipped => "○",
        Status::Warning => "⚠",
    }
}

fn print_report(report: &QcReport) {
    let mut current_suite: Option<&str> = None;
    for (i, result) in report.results.iter().enumerate() {
        if current_suite != Some(result.suite.as_str()) {
            println!("\n🔎 {}", result.suite);
            current_suite = Some(result.suite.as_str());
        }
        let last_in_suite = report
            .results
            .get(i + 1)
            .map_or(true, |next| next.suite != result.suite);
        let prefix = if last_in_suite { "└─" } else { "├─" };
        match &result.message {
            Some(message) => println!(
                "   {prefix} {} {} - {message}",
                symbol(result.status),
                result.test
            ),
            None => println!("   {prefix} {} {}", symbol(result.status), result.test),
        }
        if let Some(error) = &result.error {
            println!("   {}     error: {error}", if last_in_suite { " " } else { "│" });
        }
    }

    let stats = &report.statistics;
    println!(
        "\n{} results: {} passed, {} failed, {} errors, {} skipped, {} warnings ({:.1}% pass rate)",
        stats.total,
        stats.passed,
        stats.failed,
        stats.errors,
        stats.skipped,
        stats.warnings,
        stats.pass_rate * 100.0
    );
}
