//! FilePatternFactory - one stream per file matched by glob patterns

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use contracts::{ContractError, DataStream, DataStreamCollection, StreamSpec};
use glob::Pattern;
use ingestion::reader_for;
use tracing::{debug, info, instrument};

use crate::factory::CollectionFactory;

/// Glob-driven collection factory
///
/// Patterns are relative to the root directory. Matches from all include
/// patterns are merged, excluded paths removed, and the result sorted by
/// path. Each match becomes a stream named after its file stem.
#[derive(Debug, Clone)]
pub struct FilePatternFactory {
    name: String,
    root: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
    spec: StreamSpec,
    allow_empty: bool,
    descriptions: BTreeMap<String, String>,
}

impl FilePatternFactory {
    /// Factory matching every entry of `root` until include patterns are added
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>, spec: StreamSpec) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            include: Vec::new(),
            exclude: Vec::new(),
            spec,
            allow_empty: false,
            descriptions: BTreeMap::new(),
        }
    }

    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Return an empty collection instead of `EmptyCollection` when nothing matches
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    /// Attach a description to the stream built from the file with this stem
    pub fn describe(mut self, stem: impl Into<String>, description: impl Into<String>) -> Self {
        self.descriptions.insert(stem.into(), description.into());
        self
    }

    pub fn with_descriptions(mut self, descriptions: BTreeMap<String, String>) -> Self {
        self.descriptions.extend(descriptions);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn include_patterns(&self) -> Vec<String> {
        if self.include.is_empty() {
            vec!["*".to_string()]
        } else {
            self.include.clone()
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        match self.spec {
            StreamSpec::Camera { .. } => path.is_dir(),
            _ => path.is_file(),
        }
    }

    /// Matched source paths, sorted and de-duplicated
    pub fn matches(&self) -> Result<Vec<PathBuf>, ContractError> {
        if !self.root.is_dir() {
            return Err(ContractError::missing_source(
                &self.root,
                "collection root is not a directory",
            ));
        }

        let excludes = self
            .exclude
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    ContractError::config_validation(
                        format!("{}.exclude", self.name),
                        format!("invalid pattern '{p}': {e}"),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let escaped_root = Pattern::escape(&self.root.to_string_lossy());
        let mut found = BTreeSet::new();
        for pattern in self.include_patterns() {
            let full = format!("{escaped_root}/{pattern}");
            let entries = glob::glob(&full).map_err(|e| {
                ContractError::config_validation(
                    format!("{}.include", self.name),
                    format!("invalid pattern '{pattern}': {e}"),
                )
            })?;
            for entry in entries {
                let path = entry.map_err(|e| {
                    let path = e.path().to_path_buf();
                    ContractError::from_io(path, e.into_error())
                })?;
                if !self.accepts(&path) {
                    continue;
                }
                let relative = path.strip_prefix(&self.root).unwrap_or(path.as_path());
                if excludes.iter().any(|ex| ex.matches_path(relative)) {
                    debug!(path = %path.display(), "excluded");
                    continue;
                }
                found.insert(path);
            }
        }
        Ok(found.into_iter().collect())
    }
}

impl CollectionFactory for FilePatternFactory {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_pattern_factory_build",
        skip(self),
        fields(collection = %self.name, root = %self.root.display())
    )]
    fn build(&self) -> Result<DataStreamCollection, ContractError> {
        let paths = self.matches()?;
        if paths.is_empty() && !self.allow_empty {
            return Err(ContractError::EmptyCollection {
                path: self.root.clone(),
                patterns: self.include_patterns(),
            });
        }

        let mut collection = DataStreamCollection::new(&self.name).with_source(&self.root);
        for path in paths {
            debug!(path = %path.display(), "stream discovered");
            let mut stream = DataStream::from_path(path, reader_for(&self.spec));
            if let Some(description) = self.descriptions.get(stream.name()) {
                stream = stream.with_description(description.clone());
            }
            collection.try_insert(stream)?;
        }

        info!(streams = collection.len(), "collection built");
        Ok(collection)
    }
}
