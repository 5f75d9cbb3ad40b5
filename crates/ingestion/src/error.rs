//! Ingestion error types
//!
//! Frame-level errors carry no file path; readers attach it when converting
//! into [`ContractError`].

use std::path::Path;

use contracts::ContractError;
use thiserror::Error;

/// Harp framing error at a byte offset of the input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Input ends inside a frame
    #[error("truncated frame: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Length byte too small for the declared header
    #[error("invalid frame length {length}")]
    InvalidLength { offset: usize, length: u8 },

    /// Message type byte is not Read / Write / Event
    #[error("unknown message type 0x{value:02x}")]
    UnknownMessageType { offset: usize, value: u8 },

    /// Payload type byte is not a known element type
    #[error("unknown payload type 0x{value:02x}")]
    UnknownPayloadType { offset: usize, value: u8 },

    /// Payload length is not a multiple of the element size
    #[error("payload of {len} bytes is not a multiple of element size {element_size}")]
    PayloadSize {
        offset: usize,
        len: usize,
        element_size: usize,
    },

    /// Checksum byte does not match the frame contents
    #[error("checksum mismatch: expected 0x{expected:02x}, found 0x{actual:02x}")]
    Checksum {
        offset: usize,
        expected: u8,
        actual: u8,
    },
}

impl FrameError {
    /// Byte offset of the frame that failed to parse
    pub fn offset(&self) -> usize {
        match self {
            FrameError::Truncated { offset, .. }
            | FrameError::InvalidLength { offset, .. }
            | FrameError::UnknownMessageType { offset, .. }
            | FrameError::UnknownPayloadType { offset, .. }
            | FrameError::PayloadSize { offset, .. }
            | FrameError::Checksum { offset, .. } => *offset,
        }
    }

    /// Attach the source path
    pub fn into_contract(self, path: &Path) -> ContractError {
        ContractError::protocol_parse(path, self.offset(), self.to_string())
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, ContractError>;
