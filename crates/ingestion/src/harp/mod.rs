//! Harp device logs
//!
//! - `frame`: wire codec
//! - `schema`: device.yml model
//! - `register`: per-register [`contracts::StreamReader`]

mod frame;
mod register;
mod schema;

use std::collections::BTreeSet;
use std::path::Path;

use contracts::{ContractError, InferenceMode};

pub use frame::{parse_frames, Frame, FrameReader, MessageType, PayloadType};
pub use register::{HarpRegisterReader, MESSAGE_TYPE_COLUMN, TIME_COLUMN};
pub use schema::{DeviceSchema, MemberColumn, PayloadMember, RegisterSchema};

/// Names of the registers every Harp device implements, by address
pub const COMMON_REGISTERS: [&str; 20] = [
    "WhoAmI",
    "HardwareVersionHigh",
    "HardwareVersionLow",
    "AssemblyVersion",
    "CoreVersionHigh",
    "CoreVersionLow",
    "FirmwareVersionHigh",
    "FirmwareVersionLow",
    "TimestampSeconds",
    "TimestampMicroseconds",
    "OperationControl",
    "ResetDevice",
    "DeviceName",
    "SerialNumber",
    "ClockConfiguration",
    "TimestampOffset",
    "UniqueId",
    "Tag",
    "Heartbeat",
    "Version",
];

/// Address of the WhoAmI register
pub const WHO_AM_I_ADDRESS: u8 = 0;

/// Common register name for `address`, if it is one
pub fn common_register_name(address: u8) -> Option<&'static str> {
    COMMON_REGISTERS.get(usize::from(address)).copied()
}

/// Read and parse a whole log file
pub fn read_frames(path: &Path) -> Result<Vec<Frame>, ContractError> {
    let data = std::fs::read(path).map_err(|e| ContractError::from_io(path, e))?;
    parse_frames(&data).map_err(|e| e.into_contract(path))
}

/// Distinct register addresses present in a log, ascending
pub fn scan_addresses(path: &Path) -> Result<BTreeSet<u8>, ContractError> {
    Ok(read_frames(path)?.iter().map(|f| f.address).collect())
}

/// Address of the first frame of a log
pub fn first_address(path: &Path) -> Result<Option<u8>, ContractError> {
    let data = std::fs::read(path).map_err(|e| ContractError::from_io(path, e))?;
    match FrameReader::new(&data).next() {
        Some(Ok(frame)) => Ok(Some(frame.address)),
        Some(Err(e)) => Err(e.into_contract(path)),
        None => Ok(None),
    }
}

/// Last WhoAmI value reported in a set of frames
pub fn who_am_i(frames: &[Frame]) -> Option<u16> {
    frames
        .iter()
        .rev()
        .filter(|f| f.address == WHO_AM_I_ADDRESS)
        .find_map(|f| {
            f.values(InferenceMode::PayloadType)
                .first()
                .and_then(|v| v.as_i64())
                .and_then(|v| u16::try_from(v).ok())
        })
}
