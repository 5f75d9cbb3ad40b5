//! TableSuite - shape checks for any tabular stream

use contracts::DataStream;
use serde_json::json;

use super::{first_decrease, loaded};
use crate::check::Check;
use crate::error::Result;
use crate::suite::{QcTest, Suite};

/// Checks one loaded stream: non-empty, expected columns present, index monotonic
pub struct TableSuite<'a> {
    name: String,
    stream: &'a DataStream,
    expected_columns: Vec<String>,
}

impl<'a> TableSuite<'a> {
    pub fn new(stream: &'a DataStream) -> Self {
        Self {
            name: format!("table:{}", stream.name()),
            stream,
            expected_columns: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn expect_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_columns
            .extend(columns.into_iter().map(Into::into));
        self
    }

    fn test_not_empty(&self) -> Result<Vec<Check>> {
        let table = loaded(self.stream)?;
        let check = if table.is_empty() {
            Check::fail("Table has no rows").with_value(0)
        } else {
            Check::pass().with_value(table.len())
        };
        Ok(vec![check])
    }

    fn test_expected_columns(&self) -> Result<Vec<Check>> {
        if self.expected_columns.is_empty() {
            return Ok(vec![Check::skip("No expected columns declared")]);
        }
        let table = loaded(self.stream)?;
        let missing: Vec<&str> = self
            .expected_columns
            .iter()
            .filter(|c| table.column_index(c).is_none())
            .map(String::as_str)
            .collect();

        let check = if missing.is_empty() {
            Check::pass()
        } else {
            Check::fail("Expected columns are missing")
                .with_context(json!({ "missing_columns": missing, "columns": table.columns() }))
        };
        Ok(vec![check])
    }

    fn test_index_monotonic(&self) -> Result<Vec<Check>> {
        let table = loaded(self.stream)?;
        let Some(values) = table.index_values() else {
            return Ok(vec![Check::skip("Table has no index column")]);
        };
        let numeric: Option<Vec<f64>> = values
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| v.as_f64())
            .collect();
        let Some(numeric) = numeric else {
            return Ok(vec![Check::warn("Index is not numeric")]);
        };

        let check = match first_decrease(&numeric) {
            None => Check::pass(),
            Some(row) => Check::fail("Index is not monotonic").with_context(json!({
                "index": table.index_column(),
                "first_decrease": row,
            })),
        };
        Ok(vec![check])
    }
}

impl Suite for TableSuite<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn tests(&self) -> Vec<QcTest<Self>> {
        vec![
            QcTest::new("not_empty", "Table has at least one row", Self::test_not_empty),
            QcTest::new(
                "expected_columns",
                "Declared columns are present",
                Self::test_expected_columns,
            ),
            QcTest::new(
                "index_monotonic",
                "Index values never decrease",
                Self::test_index_monotonic,
            ),
        ]
    }
}
