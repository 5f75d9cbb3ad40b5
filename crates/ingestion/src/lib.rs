//! # Ingestion
//!
//! Stream readers: decode one source file or directory into a [`contracts::Table`].
//!
//! Responsibilities:
//! - CSV, JSON (document / lines), text and camera readers
//! - Harp binary log codec, device schemas and per-register readers
//! - Map a manifest [`contracts::StreamSpec`] to a boxed reader
//!
//! ## Usage Example
//!
//! ```no_run
//! use contracts::{DataStream, StreamSpec};
//! use ingestion::reader_for;
//!
//! let mut stream = DataStream::from_path("session/Rig.csv", reader_for(&StreamSpec::csv()));
//! let table = stream.load().unwrap();
//! println!("{} rows", table.len());
//! ```
//!
//! ## Mock Testing
//!
//! ```
//! use contracts::DataStream;
//! use ingestion::MockReader;
//!
//! let reader = MockReader::default();
//! let calls = reader.calls();
//! let mut stream = DataStream::new("mock", "unused", Box::new(reader));
//! stream.load().unwrap();
//! stream.load().unwrap();
//! assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
//! ```

mod error;
pub mod harp;
mod mock;
mod readers;

// Re-exports
pub use error::{FrameError, Result};
pub use harp::HarpRegisterReader;
pub use mock::{MockReader, MockReaderConfig};
pub use readers::{
    json_to_value, parse_cell, reader_for, CameraReader, CsvReader, JsonReader, TextReader,
    CONTENT_COLUMN, TIMESTAMP_COLUMN,
};
