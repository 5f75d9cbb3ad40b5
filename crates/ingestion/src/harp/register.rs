//! Harp register stream reader

use std::path::Path;

use chrono::{DateTime, TimeDelta, Utc};
use contracts::{
    ContractError, InferenceMode, StreamKind, StreamReader, Table, Value,
};
use tracing::trace;

use super::frame::{Frame, PayloadType};
use super::read_frames;
use super::schema::{MemberColumn, RegisterSchema};

/// Index column of every register table
pub const TIME_COLUMN: &str = "Time";
/// Message type column, present when `keep_message_type` is set
pub const MESSAGE_TYPE_COLUMN: &str = "MessageType";

/// Reads the frames of one register address from a Harp log
///
/// The source may be a per-register file or a multiplexed log; frames of
/// other addresses are skipped.
#[derive(Debug, Clone)]
pub struct HarpRegisterReader {
    address: u8,
    name: String,
    inference: InferenceMode,
    register: Option<RegisterSchema>,
    keep_message_type: bool,
    epoch: Option<DateTime<Utc>>,
}

impl HarpRegisterReader {
    pub fn new(address: u8, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
            inference: InferenceMode::default(),
            register: None,
            keep_message_type: true,
            epoch: None,
        }
    }

    pub fn with_inference(mut self, inference: InferenceMode) -> Self {
        self.inference = inference;
        self
    }

    /// Decode using the schema entry instead of the inference mode
    pub fn with_schema(mut self, register: RegisterSchema) -> Self {
        self.register = Some(register);
        self
    }

    pub fn with_message_type(mut self, keep: bool) -> Self {
        self.keep_message_type = keep;
        self
    }

    /// Report `Time` as `epoch` plus the device seconds
    pub fn with_epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.epoch = Some(epoch);
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn schema_type(&self, path: &Path) -> Result<Option<PayloadType>, ContractError> {
        match &self.register {
            Some(reg) => reg
                .payload_type()
                .map(Some)
                .map_err(|msg| ContractError::decode(path, format!("register {}: {msg}", self.name))),
            None => Ok(None),
        }
    }

    fn frame_values(
        &self,
        frame: &Frame,
        schema_type: Option<PayloadType>,
        path: &Path,
    ) -> Result<Vec<Value>, ContractError> {
        match schema_type {
            Some(expected) if expected != frame.payload_type => Err(ContractError::decode(
                path,
                format!(
                    "register {} (address {}) declared as {expected}, frame carries {}",
                    self.name, self.address, frame.payload_type
                ),
            )),
            Some(expected) => Ok(frame.typed_values(expected)),
            None => Ok(frame.values(self.inference)),
        }
    }

    /// Value columns for rows at most `width` elements wide
    fn value_columns(&self, width: usize) -> Vec<MemberColumn> {
        if let Some(reg) = &self.register {
            let members = reg.member_columns();
            if !members.is_empty() {
                return members;
            }
        }
        if width <= 1 {
            vec![MemberColumn::element(&self.name, 0)]
        } else {
            (0..width)
                .map(|i| MemberColumn::element(format!("{}_{i}", self.name), i))
                .collect()
        }
    }

    fn time_value(&self, seconds: Option<f64>, path: &Path) -> Result<Value, ContractError> {
        let (Some(seconds), Some(epoch)) = (seconds, self.epoch) else {
            return Ok(seconds.map(Value::Float).unwrap_or(Value::Null));
        };
        // Harp clocks tick in multiples of 32 us; microseconds are exact
        let delta = TimeDelta::microseconds((seconds * 1e6).round() as i64);
        epoch
            .checked_add_signed(delta)
            .map(Value::Timestamp)
            .ok_or_else(|| {
                ContractError::decode(
                    path,
                    format!("register {}: time {seconds}s out of range from epoch", self.name),
                )
            })
    }
}

impl StreamReader for HarpRegisterReader {
    fn kind(&self) -> StreamKind {
        StreamKind::Harp
    }

    fn read(&self, path: &Path) -> Result<Table, ContractError> {
        let frames = read_frames(path)?;
        let schema_type = self.schema_type(path)?;

        let mut decoded = Vec::new();
        for frame in frames.iter().filter(|f| f.address == self.address) {
            let values = self.frame_values(frame, schema_type, path)?;
            decoded.push((frame, values));
        }
        trace!(register = %self.name, frames = decoded.len(), "register frames decoded");
        metrics::counter!("contract_loader_harp_frames_total").increment(decoded.len() as u64);

        let width = decoded.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let value_columns = self.value_columns(width);

        let mut columns = vec![TIME_COLUMN.to_string()];
        columns.extend(value_columns.iter().map(|c| c.name.clone()));
        if self.keep_message_type {
            columns.push(MESSAGE_TYPE_COLUMN.to_string());
        }
        let mut table = Table::new(columns).with_index(TIME_COLUMN);

        for (frame, values) in decoded {
            let mut row = Vec::with_capacity(table.width());
            row.push(self.time_value(frame.timestamp, path)?);
            row.extend(value_columns.iter().map(|c| c.extract(&values)));
            if self.keep_message_type {
                row.push(Value::Text(frame.message_label()));
            }
            table.push_row(row, path)?;
        }
        Ok(table)
    }
}
