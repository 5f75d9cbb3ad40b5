//! JSON readers: single document or one object per line

use std::collections::HashSet;
use std::path::Path;

use contracts::{ContractError, JsonLayout, StreamKind, StreamReader, Table, Value};
use serde_json::{Map, Value as JsonValue};

/// Column promoted to the table index when present
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Reads a JSON document or JSON-lines file into rows of objects
#[derive(Debug, Clone, Default)]
pub struct JsonReader {
    layout: JsonLayout,
}

impl JsonReader {
    pub fn new(layout: JsonLayout) -> Self {
        Self { layout }
    }

    /// One object per non-empty line
    pub fn lines() -> Self {
        Self::new(JsonLayout::Lines)
    }

    fn objects(&self, content: &str, path: &Path) -> Result<Vec<Map<String, JsonValue>>, ContractError> {
        let parse_err =
            |line: Option<usize>, e: serde_json::Error| match line {
                Some(n) => ContractError::decode(path, format!("line {n}: {e}")),
                None => ContractError::decode(path, e.to_string()),
            };

        match self.layout {
            JsonLayout::Document => {
                let doc: JsonValue =
                    serde_json::from_str(content).map_err(|e| parse_err(None, e))?;
                match doc {
                    JsonValue::Object(obj) => Ok(vec![obj]),
                    JsonValue::Array(items) => items
                        .into_iter()
                        .enumerate()
                        .map(|(i, item)| match item {
                            JsonValue::Object(obj) => Ok(obj),
                            _ => Err(ContractError::decode(
                                path,
                                format!("array element {i} is not an object"),
                            )),
                        })
                        .collect(),
                    _ => Err(ContractError::decode(
                        path,
                        "document is neither an object nor an array of objects",
                    )),
                }
            }
            JsonLayout::Lines => {
                let mut out = Vec::new();
                for (n, line) in content.lines().enumerate() {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<JsonValue>(line).map_err(|e| parse_err(Some(n + 1), e))? {
                        JsonValue::Object(obj) => out.push(obj),
                        _ => {
                            return Err(ContractError::decode(
                                path,
                                format!("line {} is not an object", n + 1),
                            ))
                        }
                    }
                }
                Ok(out)
            }
        }
    }
}

/// Scalar JSON values map directly; arrays and objects are kept as compact JSON text
pub fn json_to_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(v) = n.as_i64() {
                Value::Int(v)
            } else if let Some(v) = n.as_u64() {
                Value::UInt(v)
            } else {
                n.as_f64().map(Value::Float).unwrap_or(Value::Null)
            }
        }
        JsonValue::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

impl StreamReader for JsonReader {
    fn kind(&self) -> StreamKind {
        StreamKind::Json
    }

    fn read(&self, path: &Path) -> Result<Table, ContractError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ContractError::from_io(path, e))?;
        let objects = self.objects(&content, path)?;

        let mut columns: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for obj in &objects {
            for key in obj.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }

        let mut table = Table::new(columns.clone());
        for obj in &objects {
            let row = columns
                .iter()
                .map(|c| obj.get(c).map(json_to_value).unwrap_or(Value::Null))
                .collect();
            table.push_row(row, path)?;
        }
        Ok(table.with_index(TIMESTAMP_COLUMN))
    }
}
