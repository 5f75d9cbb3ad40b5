//! Plain-text reader

use std::path::Path;

use contracts::{ContractError, StreamKind, StreamReader, Table, Value};

/// Column holding the file contents
pub const CONTENT_COLUMN: &str = "content";

/// Whole file as a single-row table
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReader;

impl StreamReader for TextReader {
    fn kind(&self) -> StreamKind {
        StreamKind::Text
    }

    fn read(&self, path: &Path) -> Result<Table, ContractError> {
        let bytes = std::fs::read(path).map_err(|e| ContractError::from_io(path, e))?;
        let content = String::from_utf8(bytes)
            .map_err(|e| ContractError::decode(path, format!("not valid UTF-8: {e}")))?;
        let mut table = Table::new([CONTENT_COLUMN]);
        table.push_row(vec![Value::Text(content)], path)?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_content() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "rig notes\nline two").unwrap();
        let table = TextReader.read(file.path()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.column(CONTENT_COLUMN).unwrap()[0].as_str(),
            Some("rig notes\nline two")
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), [0xff, 0xfe]).unwrap();
        assert!(matches!(
            TextReader.read(file.path()),
            Err(ContractError::Decode { .. })
        ));
    }
}
