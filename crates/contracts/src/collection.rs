//! DataStreamCollection - ordered, keyed set of streams from one source

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;
use std::path::{Path, PathBuf};

use crate::{ContractError, DataStream};

/// Ordered mapping from stream name to [`DataStream`]
///
/// Names are unique. Insertion order is preserved.
#[derive(Debug, Default)]
pub struct DataStreamCollection {
    name: String,
    source: Option<PathBuf>,
    streams: Vec<DataStream>,
    by_name: HashMap<String, usize>,
}

impl DataStreamCollection {
    /// Create an empty collection
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Record the path the collection was built from
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Insert a stream under its own name
    ///
    /// # Errors
    /// `DuplicateStream` if the name is already present.
    pub fn try_insert(&mut self, stream: DataStream) -> Result<(), ContractError> {
        if self.by_name.contains_key(stream.name()) {
            return Err(ContractError::duplicate(&self.name, stream.name()));
        }
        self.by_name
            .insert(stream.name().to_string(), self.streams.len());
        self.streams.push(stream);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&DataStream> {
        self.by_name.get(name).map(|&i| &self.streams[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DataStream> {
        self.by_name.get(name).map(|&i| &mut self.streams[i])
    }

    /// Lookup returning a `NotFound` error instead of `None`
    pub fn stream(&self, name: &str) -> Result<&DataStream, ContractError> {
        self.get(name)
            .ok_or_else(|| ContractError::not_found(&self.name, name))
    }

    pub fn stream_mut(&mut self, name: &str) -> Result<&mut DataStream, ContractError> {
        let container = self.name.clone();
        self.get_mut(name)
            .ok_or_else(|| ContractError::not_found(container, name))
    }

    /// Stream names in collection order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.streams.iter().map(|s| s.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataStream> {
        self.streams.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DataStream> {
        self.streams.iter_mut()
    }

    /// Load every stream
    ///
    /// Non-strict mode keeps going and returns the failures by stream name;
    /// strict mode returns the first error.
    pub fn load_all(&mut self, strict: bool) -> Result<Vec<(String, ContractError)>, ContractError> {
        let mut failures = Vec::new();
        for stream in &mut self.streams {
            let result = stream.load().map(|_| ());
            if let Err(e) = result {
                if strict {
                    return Err(e);
                }
                failures.push((stream.name().to_string(), e));
            }
        }
        Ok(failures)
    }

    /// Plain-text table of name / kind / load state
    pub fn summary_table(&self) -> String {
        let mut rows = vec![[
            "Stream Name".to_string(),
            "Stream Type".to_string(),
            "Is Loaded".to_string(),
        ]];
        for stream in &self.streams {
            rows.push([
                stream.name().to_string(),
                stream.kind().to_string(),
                if stream.is_loaded() { "Yes" } else { "No" }.to_string(),
            ]);
        }

        let widths: Vec<usize> = (0..3)
            .map(|i| rows.iter().map(|r| r[i].len()).max().unwrap_or(0))
            .collect();

        let mut out = String::new();
        for (n, row) in rows.iter().enumerate() {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{cell:<w$}"))
                .collect();
            out.push_str(cells.join(" | ").trim_end());
            out.push('\n');
            if n == 0 {
                let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
                out.push_str(&rule.join("-|-"));
                out.push('\n');
            }
        }
        out
    }
}

impl Index<&str> for DataStreamCollection {
    type Output = DataStream;

    /// # Panics
    /// If no stream has that name. [`DataStreamCollection::stream`] is the
    /// fallible form.
    fn index(&self, name: &str) -> &DataStream {
        match self.get(name) {
            Some(stream) => stream,
            None => panic!(
                "stream '{name}' not found in collection '{}'; use `stream()` for a fallible lookup",
                self.name
            ),
        }
    }
}

impl<'a> IntoIterator for &'a DataStreamCollection {
    type Item = &'a DataStream;
    type IntoIter = std::slice::Iter<'a, DataStream>;

    fn into_iter(self) -> Self::IntoIter {
        self.streams.iter()
    }
}

impl fmt::Display for DataStreamCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::test_support::CountingReader;

    fn stream(name: &str) -> DataStream {
        let (reader, _) = CountingReader::new();
        DataStream::new(name, format!("/data/{name}"), Box::new(reader))
    }

    #[test]
    fn test_insert_preserves_order() {
        let mut c = DataStreamCollection::new("LoadCells");
        for n in ["b", "a", "c"] {
            c.try_insert(stream(n)).unwrap();
        }
        assert_eq!(c.names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(c["a"].name(), "a");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut c = DataStreamCollection::new("LoadCells");
        c.try_insert(stream("a")).unwrap();
        let err = c.try_insert(stream("a")).unwrap_err();
        assert!(matches!(err, ContractError::DuplicateStream { .. }));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_missing_lookup_is_not_found() {
        let c = DataStreamCollection::new("LoadCells");
        assert!(matches!(
            c.stream("nope"),
            Err(ContractError::NotFound { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "use `stream()`")]
    fn test_index_panics_on_missing() {
        let c = DataStreamCollection::new("LoadCells");
        let _ = &c["nope"];
    }

    #[test]
    fn test_load_all_isolates_failures() {
        let mut c = DataStreamCollection::new("mixed");
        c.try_insert(stream("good")).unwrap();
        c.try_insert(DataStream::new(
            "bad",
            "/data/bad",
            Box::new(CountingReader::failing()),
        ))
        .unwrap();
        c.try_insert(stream("also_good")).unwrap();

        let failures = c.load_all(false).unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "bad");
        assert!(c["good"].is_loaded());
        assert!(c["also_good"].is_loaded());
        assert!(!c["bad"].is_loaded());
    }

    #[test]
    fn test_load_all_strict_stops() {
        let mut c = DataStreamCollection::new("mixed");
        c.try_insert(DataStream::new(
            "bad",
            "/data/bad",
            Box::new(CountingReader::failing()),
        ))
        .unwrap();
        c.try_insert(stream("good")).unwrap();
        assert!(c.load_all(true).is_err());
        assert!(!c["good"].is_loaded());
    }

    #[test]
    fn test_summary_table() {
        let mut c = DataStreamCollection::new("x");
        c.try_insert(stream("Analog")).unwrap();
        c.get_mut("Analog").unwrap().load().unwrap();
        let table = c.summary_table();
        assert!(table.starts_with("Stream Name"));
        assert!(table.contains("Analog"));
        assert!(table.contains("Yes"));
    }
}
