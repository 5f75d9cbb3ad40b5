//! HarpDeviceSuite - checks every Harp device log should pass

use std::collections::BTreeMap;

use contracts::{DataStreamCollection, Table, Value};
use ingestion::harp::{MESSAGE_TYPE_COLUMN, TIME_COLUMN};
use serde_json::json;

use super::{first_decrease, loaded};
use crate::check::Check;
use crate::error::{QcError, Result};
use crate::suite::{QcTest, Suite};

const WHO_AM_I: &str = "WhoAmI";
const OPERATION_CONTROL: &str = "OperationControl";
const READ: &str = "READ";
const WRITE: &str = "WRITE";

/// Generic Harp device suite
///
/// Streams must be loaded before the suite runs. Request/response pairing
/// needs the collection of commands sent to the device and is skipped
/// without it.
pub struct HarpDeviceSuite<'a> {
    name: String,
    device: &'a DataStreamCollection,
    commands: Option<&'a DataStreamCollection>,
    expected_who_am_i: Option<u16>,
}

impl<'a> HarpDeviceSuite<'a> {
    pub fn new(device: &'a DataStreamCollection) -> Self {
        Self {
            name: format!("harp_device:{}", device.name()),
            device,
            commands: None,
            expected_who_am_i: None,
        }
    }

    /// Suite name shown in reports
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_commands(mut self, commands: &'a DataStreamCollection) -> Self {
        self.commands = Some(commands);
        self
    }

    pub fn expect_who_am_i(mut self, who_am_i: u16) -> Self {
        self.expected_who_am_i = Some(who_am_i);
        self
    }

    /// Last WhoAmI value in the log
    fn who_am_i(&self) -> Result<Option<i64>> {
        let stream = self.device.stream(WHO_AM_I)?;
        let table = loaded(stream)?;
        let column = value_column(table)
            .ok_or_else(|| QcError::missing_column(stream.name(), WHO_AM_I))?;
        Ok(table.rows().last().and_then(|row| row[column].as_i64()))
    }

    fn test_has_who_am_i(&self) -> Result<Vec<Check>> {
        let Some(stream) = self.device.get(WHO_AM_I) else {
            return Ok(vec![Check::fail("WhoAmI register is not in the log")]);
        };
        let Some(table) = stream.data() else {
            return Ok(vec![Check::fail("WhoAmI does not have loaded data")]);
        };
        if table.is_empty() {
            return Ok(vec![Check::fail("WhoAmI file is empty")]);
        }
        let check = match self.who_am_i()? {
            Some(value) if (0..=9999).contains(&value) => Check::pass().with_value(value),
            Some(value) => Check::fail("WhoAmI value is not in the range 0000-9999").with_value(value),
            None => Check::fail("WhoAmI value is not an integer"),
        };
        Ok(vec![check])
    }

    fn test_match_who_am_i(&self) -> Result<Vec<Check>> {
        let Some(expected) = self.expected_who_am_i else {
            return Ok(vec![Check::skip("No expected WhoAmI declared")]);
        };
        let actual = self.who_am_i()?;
        let check = if actual == Some(i64::from(expected)) {
            Check::pass()
                .with_value(true)
                .with_message("WhoAmI value matches the device's WhoAmI")
        } else {
            Check::fail("WhoAmI value does not match the device's WhoAmI")
                .with_value(false)
                .with_context(json!({ "expected": expected, "actual": actual }))
        };
        Ok(vec![check])
    }

    fn test_read_dump_is_complete(&self) -> Result<Vec<Check>> {
        let mut missing = Vec::new();
        for stream in self.device {
            let table = loaded(stream)?;
            let reads = rows_of_type(table, stream.name(), READ)?;
            if reads.is_empty() {
                missing.push(stream.name().to_string());
            }
        }

        let check = if missing.is_empty() {
            Check::pass()
                .with_value(true)
                .with_message("Read dump is complete")
        } else {
            Check::fail("Read dump is not complete")
                .with_value(false)
                .with_context(json!({ "missing_registers": missing }))
        };
        Ok(vec![check])
    }

    fn test_request_response(&self) -> Result<Vec<Check>> {
        let Some(commands) = self.commands else {
            return Ok(vec![Check::skip("No harp device commands provided")]);
        };

        let op_stream = commands.stream(OPERATION_CONTROL)?;
        let op_table = loaded(op_stream)?;
        let start = write_times(op_table, op_stream.name())?
            .first()
            .copied()
            .ok_or_else(|| QcError::check("OperationControl has no WRITE command"))?;

        let mut register_errors = Vec::new();
        for request in commands.iter().filter(|s| s.is_loaded()) {
            let Some(table) = request.data() else {
                continue;
            };
            let requests = write_times(table, request.name())?;
            if requests.is_empty() {
                continue;
            }
            let requests = requests.iter().filter(|t| **t >= start).count();

            // Responses are timestamped after the request by definition
            let responses = match self.device.get(request.name()).and_then(|s| s.data()) {
                Some(reply) => write_times(reply, request.name())?
                    .iter()
                    .filter(|t| **t >= start)
                    .count(),
                None => 0,
            };
            if requests != responses {
                register_errors.push(json!({
                    "register": request.name(),
                    "requests": requests,
                    "responses": responses,
                }));
            }
        }

        let check = if register_errors.is_empty() {
            Check::pass().with_message(
                "Request/Response check passed. All requests have a corresponding response.",
            )
        } else {
            Check::fail(
                "Request/Response check failed. Some requests do not have a corresponding response.",
            )
            .with_context(json!({ "register_errors": register_errors }))
        };
        Ok(vec![check])
    }

    fn test_monotonicity(&self) -> Result<Vec<Check>> {
        let mut register_errors = Vec::new();
        for stream in self.device {
            let table = loaded(stream)?;
            let time = table
                .column_index(TIME_COLUMN)
                .ok_or_else(|| QcError::missing_column(stream.name(), TIME_COLUMN))?;
            let message_type = table.column_index(MESSAGE_TYPE_COLUMN);

            let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
            for row in table.rows() {
                let Some(t) = row[time].as_f64() else {
                    continue;
                };
                let label = message_type
                    .and_then(|idx| row[idx].as_str())
                    .unwrap_or("ALL");
                groups.entry(label).or_default().push(t);
            }
            for (label, times) in groups {
                if let Some(row) = first_decrease(&times) {
                    register_errors.push(json!({
                        "register": stream.name(),
                        "message_type": label,
                        "first_decrease": row,
                    }));
                }
            }
        }

        let check = if register_errors.is_empty() {
            Check::pass().with_message("Monotonicity check passed. All registers are monotonic.")
        } else {
            Check::fail("Monotonicity check failed. Some registers are not monotonic.")
                .with_context(json!({ "register_errors": register_errors }))
        };
        Ok(vec![check])
    }
}

impl Suite for HarpDeviceSuite<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn tests(&self) -> Vec<QcTest<Self>> {
        vec![
            QcTest::new(
                "has_who_am_i",
                "WhoAmI register is present and holds a value in 0000-9999",
                Self::test_has_who_am_i,
            ),
            QcTest::new(
                "match_who_am_i",
                "WhoAmI value matches the expected device",
                Self::test_match_who_am_i,
            ),
            QcTest::new(
                "read_dump_is_complete",
                "Every register reported a READ",
                Self::test_read_dump_is_complete,
            ),
            QcTest::new(
                "request_response",
                "Every WRITE request has a corresponding response",
                Self::test_request_response,
            ),
            QcTest::new(
                "monotonicity",
                "Register timestamps are monotonic per message type",
                Self::test_monotonicity,
            ),
        ]
    }
}

/// First value column of a register table
fn value_column(table: &Table) -> Option<usize> {
    table
        .columns()
        .iter()
        .position(|c| c != TIME_COLUMN && c != MESSAGE_TYPE_COLUMN)
}

fn rows_of_type<'t>(table: &'t Table, stream: &str, label: &str) -> Result<Vec<&'t [Value]>> {
    let idx = table
        .column_index(MESSAGE_TYPE_COLUMN)
        .ok_or_else(|| QcError::missing_column(stream, MESSAGE_TYPE_COLUMN))?;
    Ok(table
        .rows()
        .iter()
        .filter(|row| row[idx].as_str() == Some(label))
        .map(Vec::as_slice)
        .collect())
}

/// Timestamps of WRITE messages, in log order
fn write_times(table: &Table, stream: &str) -> Result<Vec<f64>> {
    let time = table
        .column_index(TIME_COLUMN)
        .ok_or_else(|| QcError::missing_column(stream, TIME_COLUMN))?;
    Ok(rows_of_type(table, stream, WRITE)?
        .into_iter()
        .filter_map(|row| row[time].as_f64())
        .collect())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use contracts::DataStream;
    use ingestion::harp::{Frame, HarpRegisterReader, MessageType, PayloadType};

    use super::*;
    use crate::check::Status;
    use crate::suite::{RunPolicy, RunnableSuite};

    fn u8_frame(mt: MessageType, address: u8, ts: f64, value: u8) -> Frame {
        Frame::new(mt, address, PayloadType::U8, Some(ts), vec![value])
    }

    fn who_am_i_frame(ts: f64, value: u16) -> Frame {
        Frame::new(
            MessageType::Read,
            0,
            PayloadType::U16,
            Some(ts),
            value.to_le_bytes().to_vec(),
        )
    }

    fn write_log(path: &Path, frames: &[Frame]) {
        let mut file = std::fs::File::create(path).unwrap();
        for frame in frames {
            file.write_all(&frame.encode()).unwrap();
        }
    }

    /// Loaded collection with one stream per (address, name)
    fn loaded_device(name: &str, log: &Path, registers: &[(u8, &str)]) -> DataStreamCollection {
        let mut collection = DataStreamCollection::new(name);
        for (address, reg) in registers {
            let reader = HarpRegisterReader::new(*address, *reg);
            collection
                .try_insert(DataStream::new(*reg, log, Box::new(reader)))
                .unwrap();
        }
        collection.load_all(true).unwrap();
        collection
    }

    fn healthy_log(dir: &Path) -> std::path::PathBuf {
        let log = dir.join("device.bin");
        write_log(
            &log,
            &[
                who_am_i_frame(0.0, 1216),
                u8_frame(MessageType::Read, 10, 0.0, 0),
                u8_frame(MessageType::Read, 32, 0.0, 0),
                u8_frame(MessageType::Write, 10, 0.5, 1),
                u8_frame(MessageType::Event, 32, 1.0, 1),
                u8_frame(MessageType::Write, 32, 1.5, 3),
                u8_frame(MessageType::Event, 32, 2.0, 2),
            ],
        );
        log
    }

    const REGISTERS: [(u8, &str); 3] = [(0, "WhoAmI"), (10, "OperationControl"), (32, "Port")];

    fn status_of(results: &[crate::check::QcResult], test: &str) -> Status {
        results.iter().find(|r| r.test == test).unwrap().status
    }

    #[test]
    fn test_healthy_device_passes() {
        let dir = tempfile::tempdir().unwrap();
        let log = healthy_log(dir.path());
        let device = loaded_device("Behavior", &log, &REGISTERS);

        let mut suite = HarpDeviceSuite::new(&device).expect_who_am_i(1216);
        let results = suite.run(&RunPolicy::default()).unwrap();

        assert_eq!(results.len(), 5);
        assert_eq!(results[0].value, Some(json!(1216)));
        assert_eq!(status_of(&results, "has_who_am_i"), Status::Passed);
        assert_eq!(status_of(&results, "match_who_am_i"), Status::Passed);
        assert_eq!(status_of(&results, "read_dump_is_complete"), Status::Passed);
        assert_eq!(status_of(&results, "request_response"), Status::Skipped);
        assert_eq!(status_of(&results, "monotonicity"), Status::Passed);
        assert_eq!(results[0].suite, "harp_device:Behavior");
    }

    #[test]
    fn test_who_am_i_mismatch_and_missing_expectation() {
        let dir = tempfile::tempdir().unwrap();
        let log = healthy_log(dir.path());
        let device = loaded_device("Behavior", &log, &REGISTERS);

        let results = HarpDeviceSuite::new(&device)
            .expect_who_am_i(1234)
            .run(&RunPolicy::default())
            .unwrap();
        assert_eq!(status_of(&results, "match_who_am_i"), Status::Failed);

        let results = HarpDeviceSuite::new(&device)
            .run(&RunPolicy::default())
            .unwrap();
        assert_eq!(status_of(&results, "match_who_am_i"), Status::Skipped);
    }

    #[test]
    fn test_who_am_i_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("device.bin");
        write_log(&log, &[who_am_i_frame(0.0, 12000)]);
        let device = loaded_device("Odd", &log, &[(0, "WhoAmI")]);

        let results = HarpDeviceSuite::new(&device)
            .run(&RunPolicy::default())
            .unwrap();
        assert_eq!(results[0].status, Status::Failed);
        assert_eq!(results[0].value, Some(json!(12000)));
    }

    #[test]
    fn test_incomplete_read_dump_and_non_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("device.bin");
        write_log(
            &log,
            &[
                who_am_i_frame(0.0, 1216),
                u8_frame(MessageType::Event, 32, 2.0, 1),
                u8_frame(MessageType::Event, 32, 1.0, 2),
            ],
        );
        let device = loaded_device("Behavior", &log, &[(0, "WhoAmI"), (32, "Port")]);

        let results = HarpDeviceSuite::new(&device)
            .run(&RunPolicy::default())
            .unwrap();
        let dump = results
            .iter()
            .find(|r| r.test == "read_dump_is_complete")
            .unwrap();
        assert_eq!(dump.status, Status::Failed);
        assert_eq!(dump.context, Some(json!({ "missing_registers": ["Port"] })));

        let mono = results.iter().find(|r| r.test == "monotonicity").unwrap();
        assert_eq!(mono.status, Status::Failed);
        assert_eq!(
            mono.context.as_ref().unwrap()["register_errors"][0]["message_type"],
            "EVENT"
        );
    }

    #[test]
    fn test_request_response_pairing() {
        let dir = tempfile::tempdir().unwrap();
        let log = healthy_log(dir.path());
        let device = loaded_device("Behavior", &log, &REGISTERS);

        let commands_log = dir.path().join("commands.bin");
        write_log(
            &commands_log,
            &[
                u8_frame(MessageType::Write, 10, 0.4, 1),
                u8_frame(MessageType::Write, 32, 1.4, 3),
                u8_frame(MessageType::Write, 32, 1.6, 4),
            ],
        );
        let commands = loaded_device(
            "BehaviorCommands",
            &commands_log,
            &[(10, "OperationControl"), (32, "Port")],
        );

        let results = HarpDeviceSuite::new(&device)
            .with_commands(&commands)
            .run(&RunPolicy::default())
            .unwrap();
        let check = results
            .iter()
            .find(|r| r.test == "request_response")
            .unwrap();
        assert_eq!(check.status, Status::Failed);
        assert_eq!(
            check.context,
            Some(json!({
                "register_errors": [{ "register": "Port", "requests": 2, "responses": 1 }]
            }))
        );
    }

    #[test]
    fn test_unloaded_device_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let log = healthy_log(dir.path());
        let mut device = DataStreamCollection::new("Behavior");
        device
            .try_insert(DataStream::new(
                "WhoAmI",
                &log,
                Box::new(HarpRegisterReader::new(0, "WhoAmI")),
            ))
            .unwrap();

        let results = HarpDeviceSuite::new(&device)
            .expect_who_am_i(1216)
            .run(&RunPolicy::default())
            .unwrap();
        assert_eq!(status_of(&results, "has_who_am_i"), Status::Failed);
        assert_eq!(status_of(&results, "match_who_am_i"), Status::Error);
        assert_eq!(status_of(&results, "read_dump_is_complete"), Status::Error);
    }
}
