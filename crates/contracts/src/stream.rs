//! DataStream - one named, lazily loaded unit of recorded data
//!
//! The decoding strategy is a [`StreamReader`] chosen at construction time.
//! `load()` memoizes the first successful read.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{ContractError, Table};

/// Stream decoding strategy tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Csv,
    Json,
    Text,
    Camera,
    Harp,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Csv => "csv",
            StreamKind::Json => "json",
            StreamKind::Text => "text",
            StreamKind::Camera => "camera",
            StreamKind::Harp => "harp",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoding strategy trait
///
/// One implementation per stream kind. A reader owns no file handles between
/// calls; every `read` opens, decodes and closes its source.
pub trait StreamReader: Send + Sync {
    /// Stream kind produced by this reader
    fn kind(&self) -> StreamKind;

    /// Read and decode the source at `path`
    ///
    /// # Errors
    /// - `MissingSource` when the path is absent
    /// - `Decode` / `ProtocolParse` when the content is malformed
    fn read(&self, path: &Path) -> Result<Table, ContractError>;
}

/// Load state of a stream, inspectable without triggering a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Unloaded,
    Loaded,
    Failed,
}

/// Lazily loaded data stream
pub struct DataStream {
    name: String,
    path: PathBuf,
    description: Option<String>,
    reader: Box<dyn StreamReader>,
    data: Option<Table>,
    last_error: Option<String>,
}

impl DataStream {
    /// Create a stream with an explicit name
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        reader: Box<dyn StreamReader>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            description: None,
            reader,
            data: None,
            last_error: None,
        }
    }

    /// Create a stream named after the file stem of `path`
    pub fn from_path(path: impl Into<PathBuf>, reader: Box<dyn StreamReader>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(name, path, reader)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> StreamKind {
        self.reader.kind()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn state(&self) -> LoadState {
        match (&self.data, &self.last_error) {
            (Some(_), _) => LoadState::Loaded,
            (None, Some(_)) => LoadState::Failed,
            (None, None) => LoadState::Unloaded,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    /// Message of the most recent failed load, cleared by a successful one
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Loaded data, without triggering a load
    pub fn data(&self) -> Option<&Table> {
        self.data.as_ref()
    }

    /// Load the stream, reading the source only on the first successful call
    ///
    /// # Errors
    /// Reader errors are returned unchanged; the stream stays unloaded and a
    /// later call retries.
    pub fn load(&mut self) -> Result<&Table, ContractError> {
        let table = match self.data.take() {
            Some(table) => table,
            None => self.read_source()?,
        };
        let table: &Table = self.data.insert(table);
        Ok(table)
    }

    /// Discard any cached data and read the source again
    pub fn reload(&mut self) -> Result<&Table, ContractError> {
        self.data = None;
        self.load()
    }

    /// Drop cached data
    pub fn unload(&mut self) {
        self.data = None;
        self.last_error = None;
    }

    fn read_source(&mut self) -> Result<Table, ContractError> {
        let kind = self.reader.kind();
        let started = Instant::now();
        debug!(stream = %self.name, kind = %kind, path = %self.path.display(), "loading stream");

        match self.reader.read(&self.path) {
            Ok(table) => {
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                metrics::counter!("contract_loader_streams_loaded_total", "kind" => kind.as_str())
                    .increment(1);
                metrics::histogram!("contract_loader_load_rows", "kind" => kind.as_str())
                    .record(table.len() as f64);
                metrics::histogram!("contract_loader_load_ms", "kind" => kind.as_str())
                    .record(elapsed_ms);
                debug!(
                    stream = %self.name,
                    rows = table.len(),
                    columns = table.width(),
                    elapsed_ms,
                    "stream loaded"
                );
                self.last_error = None;
                Ok(table)
            }
            Err(e) => {
                metrics::counter!(
                    "contract_loader_stream_load_failures_total",
                    "kind" => kind.as_str(),
                    "error" => e.kind()
                )
                .increment(1);
                warn!(stream = %self.name, error = %e, "stream load failed");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

impl fmt::Debug for DataStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStream")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("kind", &self.kind())
            .field("state", &self.state())
            .finish()
    }
}
