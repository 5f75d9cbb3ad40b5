//! # Integration Tests
//!
//! End-to-end scenarios across the workspace.
//!
//! Covers:
//! - manifest -> contract -> lazy loads on a synthetic session directory
//! - Harp logs with N registers -> N streams
//! - failure isolation between sibling streams
//! - caller-managed parallel loading
//! - QC over a loaded contract

#[cfg(test)]
mod fixtures {
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use ingestion::harp::{Frame, MessageType, PayloadType};

    pub const DEVICE_YML: &str = r#"
device: Behavior
whoAmI: 1216
registers:
  DigitalInputState:
    address: 32
    type: U8
    description: Digital input port state
  AnalogData:
    address: 44
    type: S16
    length: 2
    payloadSpec:
      AnalogInput0:
        offset: 0
      Encoder:
        offset: 1
"#;

    pub const MANIFEST: &str = r#"
name = "session"
root = "data"

[[groups]]
label = "behavior"

[[groups.collections]]
label = "Behavior"
source = { factory = "harp", path = "behavior/Behavior.bin", schema = { source = "file", path = "schemas/device.yml" } }

[[groups.collections]]
label = "Rig"
source = { factory = "file_pattern", path = "behavior/Rig", include = ["*.csv"], stream = { kind = "csv" }, descriptions = { Settings = "rig settings" } }

[[groups.collections]]
label = "SoftwareEvents"
source = { factory = "file_pattern", path = "behavior/SoftwareEvents", include = ["*.jsonl"], stream = { kind = "json", layout = "lines" } }

[[groups.collections]]
label = "Logs"
source = { factory = "file_pattern", path = "behavior/Logs", include = ["*.txt", "*.log"], exclude = ["debug*"], stream = { kind = "text" } }

[[groups.groups]]
label = "video"

[[groups.groups.collections]]
label = "Cameras"
source = { factory = "file_pattern", path = "behavior/VideoData", stream = { kind = "camera" } }

[[qc]]
suite = "harp_device"
target = "behavior/Behavior"
expected_who_am_i = 1216

[[qc]]
suite = "table"
target = "behavior/Rig"

[[qc]]
suite = "contract"
"#;

    fn u8_frame(mt: MessageType, address: u8, ts: f64, value: u8) -> Frame {
        Frame::new(mt, address, PayloadType::U8, Some(ts), vec![value])
    }

    fn analog_frame(mt: MessageType, ts: f64, a: i16, b: i16) -> Frame {
        let mut payload = a.to_le_bytes().to_vec();
        payload.extend_from_slice(&b.to_le_bytes());
        Frame::new(mt, 44, PayloadType::S16, Some(ts), payload)
    }

    pub fn behavior_frames() -> Vec<Frame> {
        vec![
            Frame::new(
                MessageType::Read,
                0,
                PayloadType::U16,
                Some(0.0),
                1216u16.to_le_bytes().to_vec(),
            ),
            u8_frame(MessageType::Read, 10, 0.0, 0),
            u8_frame(MessageType::Read, 32, 0.0, 0),
            analog_frame(MessageType::Read, 0.0, 0, 0),
            u8_frame(MessageType::Write, 10, 0.001, 1),
            u8_frame(MessageType::Event, 32, 0.5, 1),
            analog_frame(MessageType::Event, 0.6, 120, -3),
            u8_frame(MessageType::Event, 32, 1.0, 0),
            analog_frame(MessageType::Event, 1.1, 121, -2),
        ]
    }

    pub fn write_frames(path: &Path, frames: &[Frame]) {
        let mut file = std::fs::File::create(path).unwrap();
        for frame in frames {
            file.write_all(&frame.encode()).unwrap();
        }
    }

    fn write(path: PathBuf, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// Session directory matching `MANIFEST`; returns (tempdir, manifest path)
    pub fn session() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let behavior = data.join("behavior");

        write(data.join("schemas/device.yml"), DEVICE_YML);
        std::fs::create_dir_all(&behavior).unwrap();
        write_frames(&behavior.join("Behavior.bin"), &behavior_frames());

        write(behavior.join("Rig/Settings.csv"), "key,value\nport,COM3\nrate,100\n");
        write(behavior.join("Rig/Calibration.csv"), "t,weight\n0.0,1.5\n1.0,1.6\n");

        write(
            behavior.join("SoftwareEvents/Trials.jsonl"),
            "{\"timestamp\": 0.5, \"name\": \"trial\", \"data\": 1}\n\
             {\"timestamp\": 1.5, \"name\": \"trial\", \"data\": 2}\n",
        );

        write(behavior.join("Logs/operator.txt"), "mouse 42 looked sleepy\n");
        write(behavior.join("Logs/launcher.log"), "started\n");
        write(behavior.join("Logs/debug_trace.txt"), "noise\n");

        write(
            behavior.join("VideoData/FaceCamera/metadata.csv"),
            "ReferenceTime,CameraFrameNumber\n0.0,0\n0.033,1\n",
        );
        write(behavior.join("VideoData/FaceCamera/video.avi"), "");

        let manifest = dir.path().join("contract.toml");
        std::fs::write(&manifest, MANIFEST).unwrap();
        (dir, manifest)
    }
}

#[cfg(test)]
mod manifest_tests {
    use config_loader::{ConfigFormat, ConfigLoader};

    use crate::fixtures;

    #[test]
    fn test_manifest_round_trips_through_json() {
        let manifest = ConfigLoader::load_from_str(fixtures::MANIFEST, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&manifest).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["groups"][0]["collections"][0]["source"]["factory"], "harp");

        let again = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(again.collection_paths(), manifest.collection_paths());
        assert_eq!(
            manifest.collection_paths(),
            vec![
                "behavior/Behavior",
                "behavior/Rig",
                "behavior/SoftwareEvents",
                "behavior/Logs",
                "behavior/video/Cameras",
            ]
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::Ordering;

    use config_loader::ConfigLoader;
    use contracts::{
        ContractError, ContractGroup, DataContract, DataStream, DataStreamCollection, LoadState,
        StreamKind, Value,
    };
    use ingestion::harp::{Frame, MessageType, PayloadType};
    use ingestion::{MockReader, CONTENT_COLUMN};
    use qc::{runner_for, RunPolicy, Status};
    use stream_factory::{CollectionFactory, ContractBuilder, FactoryError, HarpCollectionFactory};

    use crate::fixtures;

    fn build() -> (tempfile::TempDir, DataContract, contracts::ContractManifest) {
        let (dir, path) = fixtures::session();
        let manifest = ConfigLoader::load_from_path(&path).unwrap();
        let contract = ContractBuilder::build(&manifest).unwrap();
        (dir, contract, manifest)
    }

    #[test]
    fn test_contract_from_manifest() {
        let (_dir, contract, _) = build();

        let names: Vec<_> = contract
            .walk_streams()
            .into_iter()
            .map(|(path, _)| path)
            .collect();
        for expected in [
            "behavior/Behavior/WhoAmI",
            "behavior/Behavior/OperationControl",
            "behavior/Behavior/DigitalInputState",
            "behavior/Behavior/AnalogData",
            "behavior/Rig/Calibration",
            "behavior/Rig/Settings",
            "behavior/SoftwareEvents/Trials",
            "behavior/Logs/launcher",
            "behavior/Logs/operator",
            "behavior/video/Cameras/FaceCamera",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
        assert_eq!(names.len(), 10);

        // Nothing is read until asked
        assert!(contract
            .walk_streams()
            .iter()
            .all(|(_, s)| s.state() == LoadState::Unloaded));
        assert_eq!(
            contract.stream("behavior/Rig/Settings").unwrap().description(),
            Some("rig settings")
        );
    }

    #[test]
    fn test_chained_lookup_and_load() {
        let (_dir, mut contract, _) = build();

        let behavior = contract.group("behavior").unwrap();
        let harp = behavior.collection("Behavior").unwrap();
        assert_eq!(harp["DigitalInputState"].kind(), StreamKind::Harp);
        assert_eq!(
            harp["DigitalInputState"].description(),
            Some("Digital input port state")
        );

        let analog = contract
            .stream_mut("behavior/Behavior/AnalogData")
            .unwrap()
            .load()
            .unwrap()
            .clone();
        assert_eq!(
            analog.columns(),
            &["Time", "AnalogInput0", "Encoder", "MessageType"]
        );
        assert_eq!(analog.len(), 3);
        assert_eq!(analog.rows()[1][1], Value::Int(120));
        assert_eq!(analog.rows()[1][2], Value::Int(-3));

        let logs = contract.collection("behavior/Logs").unwrap();
        assert!(!logs.contains("debug_trace"));

        let notes = contract
            .stream_mut("behavior/Logs/operator")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(
            notes.column(CONTENT_COLUMN).unwrap()[0].as_str(),
            Some("mouse 42 looked sleepy\n")
        );

        let camera = contract
            .stream_mut("behavior/video/Cameras/FaceCamera")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(camera.len(), 2);

        let events = contract
            .stream_mut("behavior/SoftwareEvents/Trials")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(events.index_column(), Some("timestamp"));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_harp_log_with_n_registers_has_n_streams() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("Device.bin");
        let frames: Vec<_> = (30u8..37)
            .map(|address| {
                Frame::new(
                    MessageType::Event,
                    address,
                    PayloadType::U32,
                    Some(f64::from(address)),
                    u32::from(address).to_le_bytes().to_vec(),
                )
            })
            .collect();
        fixtures::write_frames(&log, &frames);

        let collection = HarpCollectionFactory::new("Device", &log).build().unwrap();
        assert_eq!(collection.len(), 7);
        assert_eq!(collection.names().next(), Some("register_30"));
    }

    #[test]
    fn test_failure_is_isolated_to_one_stream() {
        let (dir, path) = fixtures::session();
        std::fs::write(
            dir.path().join("data/behavior/Rig/Broken.csv"),
            "a,b\n1,2\n3\n",
        )
        .unwrap();
        let manifest = ConfigLoader::load_from_path(&path).unwrap();
        let mut contract = ContractBuilder::build(&manifest).unwrap();

        let failures = contract.load_all(false).unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "behavior/Rig/Broken");
        assert!(matches!(failures[0].1, ContractError::Decode { .. }));

        let broken = contract.stream("behavior/Rig/Broken").unwrap();
        assert_eq!(broken.state(), LoadState::Failed);
        assert!(contract.stream("behavior/Rig/Settings").unwrap().is_loaded());

        let err = contract.load_all(true).unwrap_err();
        assert!(matches!(err, ContractError::Decode { .. }));
    }

    #[test]
    fn test_missing_collection_aborts_build() {
        let (dir, path) = fixtures::session();
        std::fs::remove_dir_all(dir.path().join("data/behavior/SoftwareEvents")).unwrap();
        let manifest = ConfigLoader::load_from_path(&path).unwrap();

        match ContractBuilder::build(&manifest).unwrap_err() {
            FactoryError::CollectionBuild { label, source } => {
                assert_eq!(label, "behavior/SoftwareEvents");
                assert!(matches!(source, ContractError::MissingSource { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_lazy_load_reads_once_across_contract() {
        let reader = MockReader::default();
        let calls = reader.calls();
        let mut collection = DataStreamCollection::new("Sensors");
        collection
            .try_insert(DataStream::new("LoadCellData", "unused", Box::new(reader)))
            .unwrap();
        let mut contract = DataContract::new("session")
            .with(
                "behavior",
                ContractGroup::new("behavior")
                    .with("LoadCells", collection)
                    .unwrap(),
            )
            .unwrap();

        for _ in 0..3 {
            contract
                .stream_mut("behavior/LoadCells/LoadCellData")
                .unwrap()
                .load()
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stream = contract
            .stream_mut("behavior/LoadCells/LoadCellData")
            .unwrap();
        stream.reload().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_parallel_load_with_scoped_threads() {
        let (_dir, mut contract, _) = build();

        let loaded: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = contract
                .streams_mut()
                .into_iter()
                .map(|(_, stream)| scope.spawn(move || stream.load().is_ok()))
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });

        assert_eq!(loaded, 10);
        assert!(contract.walk_streams().iter().all(|(_, s)| s.is_loaded()));
    }

    #[test]
    fn test_qc_over_session() {
        let (_dir, mut contract, manifest) = build();
        assert!(contract.load_all(true).unwrap().is_empty());

        let mut runner = runner_for(&contract, &manifest.qc).unwrap();
        let report = runner.run_all(&RunPolicy::default()).unwrap();

        let harp: Vec<_> = report
            .results
            .iter()
            .filter(|r| r.suite == "harp_device:behavior/Behavior")
            .collect();
        assert_eq!(harp.len(), 5);
        for result in &harp {
            let expected = if result.test == "request_response" {
                Status::Skipped
            } else {
                Status::Passed
            };
            assert_eq!(result.status, expected, "{}: {:?}", result.test, result.message);
        }

        // Settings.csv has no index column, so the monotonic check skips
        assert!(report
            .results
            .iter()
            .any(|r| r.suite == "table:behavior/Rig/Settings" && r.status == Status::Skipped));
        assert!(report.is_success());

        let strict = runner
            .run_all(&RunPolicy {
                elevated_skips: true,
                ..Default::default()
            })
            .unwrap();
        assert!(!strict.is_success());
    }

    #[test]
    fn test_load_statistics_over_session() {
        let (_dir, mut contract, _) = build();
        let mut stats = observability::LoadStatsAggregator::new();
        for (path, stream) in contract.streams_mut() {
            let kind = stream.kind().as_str();
            let rows = stream.load().map(|t| t.len());
            stats.update(&path, kind, rows.as_ref().copied(), std::time::Duration::ZERO);
        }
        let summary = stats.summary();
        assert_eq!(summary.loaded, 10);
        assert_eq!(summary.per_kind["harp"].loaded, 4);
        assert_eq!(summary.per_kind["csv"].loaded, 2);
    }
}
