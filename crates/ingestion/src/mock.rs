//! Mock stream reader
//!
//! For tests that need to observe how often a source is read, or to inject
//! decode failures, without touching the filesystem.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use contracts::{ContractError, StreamKind, StreamReader, Table, Value};
use tracing::trace;

/// Mock reader configuration
#[derive(Debug, Clone)]
pub struct MockReaderConfig {
    /// Kind reported by the reader
    pub kind: StreamKind,

    /// Rows in the produced table
    pub rows: usize,

    /// Number of initial calls that fail with a decode error
    pub fail_first: usize,
}

impl Default for MockReaderConfig {
    fn default() -> Self {
        Self {
            kind: StreamKind::Csv,
            rows: 3,
            fail_first: 0,
        }
    }
}

/// Reader producing a synthetic `Time` / `Value` table
///
/// The call counter is shared, so it stays observable after the reader is
/// boxed into a stream.
#[derive(Debug, Clone, Default)]
pub struct MockReader {
    config: MockReaderConfig,
    calls: Arc<AtomicUsize>,
}

impl MockReader {
    pub fn new(config: MockReaderConfig) -> Self {
        Self {
            config,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Reader that always fails
    pub fn failing() -> Self {
        Self::new(MockReaderConfig {
            fail_first: usize::MAX,
            ..Default::default()
        })
    }

    /// Shared handle to the call counter
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    /// Number of `read` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StreamReader for MockReader {
    fn kind(&self) -> StreamKind {
        self.config.kind
    }

    fn read(&self, path: &Path) -> Result<Table, ContractError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        trace!(path = %path.display(), call, "mock read");
        if call < self.config.fail_first {
            return Err(ContractError::decode(path, "mock decode failure"));
        }

        let mut table = Table::new(["Time", "Value"]).with_index("Time");
        for i in 0..self.config.rows {
            table.push_row(
                vec![Value::Float(i as f64 * 0.1), Value::Int(i as i64)],
                path,
            )?;
        }
        Ok(table)
    }
}
