//! Session Walkthrough
//!
//! Builds a small synthetic session on disk, declares it with a manifest and
//! walks through contract building, lazy loading and QC.
//!
//! Run with: cargo run -p demos --bin session_walkthrough [manifest.toml]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use config_loader::ConfigLoader;
use ingestion::harp::{Frame, MessageType, PayloadType};
use observability::LoadStatsAggregator;
use qc::{runner_for, RunPolicy};
use stream_factory::ContractBuilder;

const MANIFEST: &str = r#"
name = "demo-session"

[[groups]]
label = "behavior"

[[groups.collections]]
label = "Behavior"
source = { factory = "harp", path = "behavior/Behavior.bin" }

[[groups.collections]]
label = "Rig"
source = { factory = "file_pattern", path = "behavior/Rig", include = ["*.csv"], stream = { kind = "csv", index = "t" } }

[[qc]]
suite = "harp_device"
target = "behavior/Behavior"
expected_who_am_i = 1216

[[qc]]
suite = "table"
target = "behavior/Rig"
expected_columns = ["t"]
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting session walkthrough");

    // ==== Stage 1: Manifest from argument, or a scratch session ====
    let scratch = tempfile::tempdir()?;
    let manifest_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => write_scratch_session(scratch.path())?,
    };
    tracing::info!(path = %manifest_path.display(), "Loading manifest");
    let manifest = ConfigLoader::load_from_path(&manifest_path)?;

    // ==== Stage 2: Build the contract (discovery only, nothing loaded) ====
    let mut contract = ContractBuilder::build(&manifest)?;
    println!("{}", contract.tree());

    // ==== Stage 3: Chained lookup and lazy load ====
    if let Ok(who_am_i) = contract.stream_mut("behavior/Behavior/WhoAmI") {
        let table = who_am_i.load()?;
        tracing::info!(rows = table.len(), columns = ?table.columns(), "WhoAmI loaded");
    }

    // ==== Stage 4: Load everything, collecting statistics ====
    let mut stats = LoadStatsAggregator::new();
    for (path, stream) in contract.streams_mut() {
        let kind = stream.kind().as_str();
        let started = Instant::now();
        let rows = stream.load().map(|t| t.len());
        stats.update(&path, kind, rows.as_ref().copied(), started.elapsed());
    }
    println!("{}", stats.summary());

    // ==== Stage 5: QC ====
    let mut runner = runner_for(&contract, &manifest.qc)?;
    let report = runner.run_all(&RunPolicy::default())?;
    for result in &report.results {
        println!(
            "{:<32} {:<24} {}",
            result.suite,
            result.test,
            result.status
        );
    }
    println!(
        "\n{}/{} passed ({:.0}%)",
        report.statistics.passed,
        report.statistics.total,
        report.statistics.pass_rate * 100.0
    );

    tracing::info!("Walkthrough complete");
    Ok(())
}

/// Lay out a session under `root` and return the manifest path
fn write_scratch_session(root: &Path) -> std::io::Result<PathBuf> {
    let behavior = root.join("behavior");
    std::fs::create_dir_all(behavior.join("Rig"))?;

    let frames = [
        Frame::new(
            MessageType::Read,
            0,
            PayloadType::U16,
            Some(0.0),
            1216u16.to_le_bytes().to_vec(),
        ),
        Frame::new(MessageType::Read, 32, PayloadType::U8, Some(0.0), vec![0]),
        Frame::new(MessageType::Event, 32, PayloadType::U8, Some(0.25), vec![1]),
        Frame::new(MessageType::Event, 32, PayloadType::U8, Some(0.5), vec![0]),
    ];
    let mut log = std::fs::File::create(behavior.join("Behavior.bin"))?;
    for frame in &frames {
        log.write_all(&frame.encode())?;
    }

    std::fs::write(behavior.join("Rig/Weights.csv"), "t,grams\n0.0,21.4\n1.0,21.5\n")?;

    let manifest = root.join("contract.toml");
    std::fs::write(&manifest, MANIFEST)?;
    Ok(manifest)
}
