//! Delimited text (CSV) reader

use std::fs::File;
use std::path::Path;

use contracts::{ContractError, StreamKind, StreamReader, Table, Value};

/// Delimited text with optional header row
#[derive(Debug, Clone)]
pub struct CsvReader {
    delimiter: char,
    has_header: bool,
    index: Option<String>,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_header: true,
            index: None,
        }
    }
}

impl CsvReader {
    pub fn new(delimiter: char, has_header: bool, index: Option<String>) -> Self {
        Self {
            delimiter,
            has_header,
            index,
        }
    }

    pub fn with_index(mut self, column: impl Into<String>) -> Self {
        self.index = Some(column.into());
        self
    }
}

/// Typed view of a CSV cell
///
/// Empty cells become `Null`; integers, floats and booleans are recognised
/// before falling back to text.
pub fn parse_cell(cell: &str) -> Value {
    let cell = cell.trim();
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(v) = cell.parse::<i64>() {
        return Value::Int(v);
    }
    if let Ok(v) = cell.parse::<f64>() {
        return Value::Float(v);
    }
    match cell {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::Text(cell.to_string()),
    }
}

impl StreamReader for CsvReader {
    fn kind(&self) -> StreamKind {
        StreamKind::Csv
    }

    fn read(&self, path: &Path) -> Result<Table, ContractError> {
        let delimiter = u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                ContractError::decode(path, format!("delimiter {:?} is not ASCII", self.delimiter))
            })?;

        let file = File::open(path).map_err(|e| ContractError::from_io(path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.has_header)
            .flexible(true)
            .from_reader(file);

        let csv_err = |e: csv::Error| ContractError::decode(path, e.to_string());

        let header: Option<Vec<String>> = if self.has_header {
            let headers = reader.headers().map_err(csv_err)?;
            Some(headers.iter().map(str::to_string).collect())
        } else {
            None
        };

        let mut records = reader.records();
        let mut pending = None;
        let columns: Vec<String> = match header {
            Some(columns) => columns,
            None => match records.next() {
                Some(first) => {
                    let first = first.map_err(csv_err)?;
                    let columns = (0..first.len()).map(|i| i.to_string()).collect();
                    pending = Some(first);
                    columns
                }
                None => Vec::new(),
            },
        };

        let mut table = Table::new(columns);
        if let Some(first) = pending {
            table.push_row(first.iter().map(parse_cell).collect(), path)?;
        }
        for record in records {
            let record = record.map_err(csv_err)?;
            table.push_row(record.iter().map(parse_cell).collect(), path)?;
        }

        match &self.index {
            Some(index) if table.column_index(index).is_none() => Err(ContractError::decode(
                path,
                format!("index column '{index}' not found"),
            )),
            Some(index) => Ok(table.with_index(index.as_str())),
            None => Ok(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn test_header_and_typed_cells() {
        let file = write("Seconds,Value,Flag,Label\n0.5,3,true,a\n1.0,,false,b\n");
        let table = CsvReader::default()
            .with_index("Seconds")
            .read(file.path())
            .unwrap();
        assert_eq!(table.columns(), &["Seconds", "Value", "Flag", "Label"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.index_column(), Some("Seconds"));
        assert_eq!(
            table.rows()[0],
            vec![
                Value::Float(0.5),
                Value::Int(3),
                Value::Bool(true),
                Value::from("a")
            ]
        );
        assert_eq!(table.rows()[1][1], Value::Null);
    }

    #[test]
    fn test_headerless_with_delimiter() {
        let file = write("1;2\n3;4\n");
        let table = CsvReader::new(';', false, None).read(file.path()).unwrap();
        assert_eq!(table.columns(), &["0", "1"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1][0], Value::Int(3));
    }

    #[test]
    fn test_ragged_row_is_decode_error() {
        let file = write("a,b\n1,2\n3\n");
        let err = CsvReader::default().read(file.path()).unwrap_err();
        assert!(matches!(err, ContractError::Decode { .. }));
    }

    #[test]
    fn test_unknown_index_column() {
        let file = write("a,b\n1,2\n");
        let err = CsvReader::default()
            .with_index("Time")
            .read(file.path())
            .unwrap_err();
        assert!(err.to_string().contains("Time"));
    }

    #[test]
    fn test_missing_file() {
        let err = CsvReader::default()
            .read(Path::new("/nonexistent/data.csv"))
            .unwrap_err();
        assert!(matches!(err, ContractError::MissingSource { .. }));
    }
}
