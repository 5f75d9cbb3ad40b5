//! Harp binary frame codec
//!
//! Frame layout (little endian):
//!
//! | byte   | field                                               |
//! |--------|-----------------------------------------------------|
//! | 0      | message type (1 Read, 2 Write, 3 Event; 0x08 error) |
//! | 1      | length of everything after this byte                |
//! | 2      | address                                             |
//! | 3      | port (255 = device)                                 |
//! | 4      | payload type (0x10 = timestamped)                   |
//! | 5..11  | u32 seconds + u16 ticks of 32 µs, if timestamped    |
//! | ..     | payload                                             |
//! | last   | checksum, wrapping sum of all previous bytes        |

use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use contracts::{InferenceMode, Value};

use crate::error::FrameError;

const ERROR_FLAG: u8 = 0x08;
const TIMESTAMP_FLAG: u8 = 0x10;
const TICK_SECONDS: f64 = 32e-6;
/// address + port + payload type + checksum
const MIN_LENGTH: usize = 4;
const TIMESTAMP_LEN: usize = 6;

/// Frame message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Read,
    Write,
    Event,
}

impl MessageType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(MessageType::Read),
            2 => Some(MessageType::Write),
            3 => Some(MessageType::Event),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            MessageType::Read => 1,
            MessageType::Write => 2,
            MessageType::Event => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Read => "READ",
            MessageType::Write => "WRITE",
            MessageType::Event => "EVENT",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadType {
    U8,
    S8,
    U16,
    S16,
    U32,
    S32,
    U64,
    S64,
    Float,
}

impl PayloadType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(PayloadType::U8),
            0x81 => Some(PayloadType::S8),
            0x02 => Some(PayloadType::U16),
            0x82 => Some(PayloadType::S16),
            0x04 => Some(PayloadType::U32),
            0x84 => Some(PayloadType::S32),
            0x08 => Some(PayloadType::U64),
            0x88 => Some(PayloadType::S64),
            0x44 => Some(PayloadType::Float),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            PayloadType::U8 => 0x01,
            PayloadType::S8 => 0x81,
            PayloadType::U16 => 0x02,
            PayloadType::S16 => 0x82,
            PayloadType::U32 => 0x04,
            PayloadType::S32 => 0x84,
            PayloadType::U64 => 0x08,
            PayloadType::S64 => 0x88,
            PayloadType::Float => 0x44,
        }
    }

    /// Element size in bytes
    pub fn size(&self) -> usize {
        match self {
            PayloadType::U8 | PayloadType::S8 => 1,
            PayloadType::U16 | PayloadType::S16 => 2,
            PayloadType::U32 | PayloadType::S32 | PayloadType::Float => 4,
            PayloadType::U64 | PayloadType::S64 => 8,
        }
    }
}

impl FromStr for PayloadType {
    type Err = String;

    /// Parse the register type names used in device schemas (`U8`, `S16`, `Float`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "U8" => Ok(PayloadType::U8),
            "S8" => Ok(PayloadType::S8),
            "U16" => Ok(PayloadType::U16),
            "S16" => Ok(PayloadType::S16),
            "U32" => Ok(PayloadType::U32),
            "S32" => Ok(PayloadType::S32),
            "U64" => Ok(PayloadType::U64),
            "S64" => Ok(PayloadType::S64),
            "Float" => Ok(PayloadType::Float),
            other => Err(format!("unknown register type '{other}'")),
        }
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayloadType::U8 => "U8",
            PayloadType::S8 => "S8",
            PayloadType::U16 => "U16",
            PayloadType::S16 => "S16",
            PayloadType::U32 => "U32",
            PayloadType::S32 => "S32",
            PayloadType::U64 => "U64",
            PayloadType::S64 => "S64",
            PayloadType::Float => "Float",
        };
        f.write_str(name)
    }
}

/// One decoded Harp message
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub message_type: MessageType,
    pub is_error: bool,
    pub address: u8,
    pub port: u8,
    pub payload_type: PayloadType,
    /// Seconds, when the frame is timestamped
    pub timestamp: Option<f64>,
    pub payload: Bytes,
}

impl Frame {
    /// Device-port frame without error flag
    pub fn new(
        message_type: MessageType,
        address: u8,
        payload_type: PayloadType,
        timestamp: Option<f64>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            message_type,
            is_error: false,
            address,
            port: 255,
            payload_type,
            timestamp,
            payload: payload.into(),
        }
    }

    /// `READ` / `WRITE` / `EVENT`, suffixed `_ERROR` when the error bit is set
    pub fn message_label(&self) -> String {
        if self.is_error {
            format!("{}_ERROR", self.message_type)
        } else {
            self.message_type.to_string()
        }
    }

    /// Number of payload elements
    pub fn element_count(&self) -> usize {
        self.payload.len() / self.payload_type.size()
    }

    /// Decode payload elements under the given inference mode
    pub fn values(&self, mode: InferenceMode) -> Vec<Value> {
        match mode {
            InferenceMode::PayloadType => self.typed_values(self.payload_type),
            InferenceMode::RawBytes => self
                .payload
                .iter()
                .map(|b| Value::UInt(u64::from(*b)))
                .collect(),
        }
    }

    /// Decode payload elements as `ty`, ignoring any trailing partial element
    pub fn typed_values(&self, ty: PayloadType) -> Vec<Value> {
        let mut buf = self.payload.clone();
        let mut out = Vec::with_capacity(buf.len() / ty.size());
        while buf.remaining() >= ty.size() {
            let value = match ty {
                PayloadType::U8 => Value::UInt(u64::from(buf.get_u8())),
                PayloadType::S8 => Value::Int(i64::from(buf.get_i8())),
                PayloadType::U16 => Value::UInt(u64::from(buf.get_u16_le())),
                PayloadType::S16 => Value::Int(i64::from(buf.get_i16_le())),
                PayloadType::U32 => Value::UInt(u64::from(buf.get_u32_le())),
                PayloadType::S32 => Value::Int(i64::from(buf.get_i32_le())),
                PayloadType::U64 => Value::UInt(buf.get_u64_le()),
                PayloadType::S64 => Value::Int(buf.get_i64_le()),
                PayloadType::Float => Value::Float(f64::from(buf.get_f32_le())),
            };
            out.push(value);
        }
        out
    }

    /// Serialize into wire format, checksum included
    pub fn encode(&self) -> Bytes {
        let ts_len = if self.timestamp.is_some() { TIMESTAMP_LEN } else { 0 };
        let length = MIN_LENGTH + ts_len + self.payload.len();
        let mut buf = BytesMut::with_capacity(length + 2);

        let mut type_byte = self.message_type.code();
        if self.is_error {
            type_byte |= ERROR_FLAG;
        }
        buf.put_u8(type_byte);
        buf.put_u8(length as u8);
        buf.put_u8(self.address);
        buf.put_u8(self.port);

        let mut payload_byte = self.payload_type.code();
        if self.timestamp.is_some() {
            payload_byte |= TIMESTAMP_FLAG;
        }
        buf.put_u8(payload_byte);

        if let Some(ts) = self.timestamp {
            let seconds = ts.floor();
            let ticks = ((ts - seconds) / TICK_SECONDS).round();
            buf.put_u32_le(seconds as u32);
            buf.put_u16_le(ticks as u16);
        }
        buf.put_slice(&self.payload);

        let checksum = checksum(&buf);
        buf.put_u8(checksum);
        buf.freeze()
    }
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Iterator over the frames of a byte buffer
///
/// Yields one error and then stops at the first malformed frame.
pub struct FrameReader<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> FrameReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            failed: false,
        }
    }

    fn parse_at(&self, offset: usize) -> Result<(Frame, usize), FrameError> {
        let rest = &self.data[offset..];
        if rest.len() < 2 {
            return Err(FrameError::Truncated {
                offset,
                needed: 2,
                available: rest.len(),
            });
        }

        let length = rest[1];
        if usize::from(length) < MIN_LENGTH {
            return Err(FrameError::InvalidLength { offset, length });
        }
        let total = usize::from(length) + 2;
        if rest.len() < total {
            return Err(FrameError::Truncated {
                offset,
                needed: total,
                available: rest.len(),
            });
        }

        let frame = &rest[..total];
        let expected = checksum(&frame[..total - 1]);
        let actual = frame[total - 1];
        if expected != actual {
            return Err(FrameError::Checksum {
                offset,
                expected,
                actual,
            });
        }

        let mut buf = &frame[..total - 1];
        let type_byte = buf.get_u8();
        let message_type = MessageType::from_code(type_byte & !ERROR_FLAG).ok_or(
            FrameError::UnknownMessageType {
                offset,
                value: type_byte,
            },
        )?;
        buf.advance(1);
        let address = buf.get_u8();
        let port = buf.get_u8();
        let payload_byte = buf.get_u8();
        let payload_type = PayloadType::from_code(payload_byte & !TIMESTAMP_FLAG).ok_or(
            FrameError::UnknownPayloadType {
                offset,
                value: payload_byte,
            },
        )?;

        let timestamp = if payload_byte & TIMESTAMP_FLAG != 0 {
            if buf.remaining() < TIMESTAMP_LEN {
                return Err(FrameError::InvalidLength { offset, length });
            }
            let seconds = buf.get_u32_le();
            let ticks = buf.get_u16_le();
            Some(f64::from(seconds) + f64::from(ticks) * TICK_SECONDS)
        } else {
            None
        };

        if buf.remaining() % payload_type.size() != 0 {
            return Err(FrameError::PayloadSize {
                offset,
                len: buf.remaining(),
                element_size: payload_type.size(),
            });
        }

        let frame = Frame {
            message_type,
            is_error: type_byte & ERROR_FLAG != 0,
            address,
            port,
            payload_type,
            timestamp,
            payload: Bytes::copy_from_slice(buf),
        };
        Ok((frame, total))
    }
}

impl Iterator for FrameReader<'_> {
    type Item = Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }
        match self.parse_at(self.offset) {
            Ok((frame, consumed)) => {
                self.offset += consumed;
                Some(Ok(frame))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse every frame of `data`
pub fn parse_frames(data: &[u8]) -> Result<Vec<Frame>, FrameError> {
    FrameReader::new(data).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(address: u8, ts: f64, value: u16) -> Frame {
        Frame::new(
            MessageType::Event,
            address,
            PayloadType::U16,
            Some(ts),
            value.to_le_bytes().to_vec(),
        )
    }

    #[test]
    fn test_encode_layout() {
        let bytes = Frame::new(MessageType::Read, 0, PayloadType::U8, None, vec![7u8]).encode();
        // type, length, address, port, payload type, payload, checksum
        assert_eq!(bytes.len(), 7);
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[1], 5);
        assert_eq!(bytes[3], 255);
        assert_eq!(bytes[4], 0x01);
        assert_eq!(bytes[5], 7);
        let sum = bytes[..6].iter().fold(0u8, |a, b| a.wrapping_add(*b));
        assert_eq!(bytes[6], sum);
    }

    #[test]
    fn test_parse_sequence_of_frames() {
        let mut data = Vec::new();
        data.extend_from_slice(&event(32, 1.5, 10).encode());
        data.extend_from_slice(&event(33, 2.0, 20).encode());

        let frames = parse_frames(&data).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].address, 32);
        assert_eq!(frames[1].address, 33);
        let ts = frames[0].timestamp.unwrap();
        assert!((ts - 1.5).abs() < TICK_SECONDS);
        assert_eq!(
            frames[1].values(InferenceMode::PayloadType),
            vec![Value::UInt(20)]
        );
    }

    #[test]
    fn test_error_flag_and_label() {
        let mut frame = event(40, 0.0, 1);
        frame.message_type = MessageType::Write;
        frame.is_error = true;
        let parsed = parse_frames(&frame.encode()).unwrap();
        assert!(parsed[0].is_error);
        assert_eq!(parsed[0].message_label(), "WRITE_ERROR");
    }

    #[test]
    fn test_signed_and_float_payloads() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&(-3i16).to_le_bytes());
        payload.extend_from_slice(&(5i16).to_le_bytes());
        let frame = Frame::new(MessageType::Event, 44, PayloadType::S16, None, payload);
        let parsed = &parse_frames(&frame.encode()).unwrap()[0];
        assert_eq!(
            parsed.values(InferenceMode::PayloadType),
            vec![Value::Int(-3), Value::Int(5)]
        );

        let frame = Frame::new(
            MessageType::Event,
            45,
            PayloadType::Float,
            None,
            1.25f32.to_le_bytes().to_vec(),
        );
        let parsed = &parse_frames(&frame.encode()).unwrap()[0];
        assert_eq!(
            parsed.values(InferenceMode::PayloadType),
            vec![Value::Float(1.25)]
        );
    }

    #[test]
    fn test_raw_bytes_mode() {
        let frame = event(32, 0.0, 0x0102);
        assert_eq!(
            frame.values(InferenceMode::RawBytes),
            vec![Value::UInt(2), Value::UInt(1)]
        );
    }

    #[test]
    fn test_checksum_mismatch_reports_offset() {
        let first = event(32, 0.0, 1).encode();
        let mut second = event(33, 0.0, 2).encode().to_vec();
        let last = second.len() - 1;
        second[last] = second[last].wrapping_add(1);

        let mut data = first.to_vec();
        data.extend_from_slice(&second);
        let err = parse_frames(&data).unwrap_err();
        assert!(matches!(err, FrameError::Checksum { .. }));
        assert_eq!(err.offset(), first.len());
    }

    #[test]
    fn test_truncated_frame() {
        let bytes = event(32, 0.0, 1).encode();
        let err = parse_frames(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { offset: 0, .. }));
    }

    #[test]
    fn test_unknown_payload_type() {
        let mut bytes = Frame::new(MessageType::Event, 32, PayloadType::U8, None, vec![1u8])
            .encode()
            .to_vec();
        bytes[4] = 0x03;
        let last = bytes.len() - 1;
        bytes[last] = checksum(&bytes[..last]);
        let err = parse_frames(&bytes).unwrap_err();
        assert!(matches!(
            err,
            FrameError::UnknownPayloadType { value: 0x03, .. }
        ));
    }

    #[test]
    fn test_payload_not_multiple_of_element_size() {
        let mut bytes = Frame::new(MessageType::Event, 32, PayloadType::U8, None, vec![1u8, 2, 3])
            .encode()
            .to_vec();
        bytes[4] = PayloadType::U16.code();
        let last = bytes.len() - 1;
        bytes[last] = checksum(&bytes[..last]);
        assert!(matches!(
            parse_frames(&bytes),
            Err(FrameError::PayloadSize { .. })
        ));
    }

    #[test]
    fn test_schema_type_names() {
        assert_eq!("S32".parse::<PayloadType>(), Ok(PayloadType::S32));
        assert!("U128".parse::<PayloadType>().is_err());
        assert_eq!(PayloadType::Float.to_string(), "Float");
    }
}
