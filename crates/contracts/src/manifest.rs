//! ContractManifest - Config Loader output
//!
//! Declarative description of a data contract: which collections exist,
//! how each is discovered on disk, and which QC suites run against them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Complete contract manifest
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContractManifest {
    /// Contract name, used as the root label
    #[validate(length(min = 1, message = "contract name cannot be empty"))]
    pub name: String,

    /// Session root; relative source paths resolve against it
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Top-level groups
    #[serde(default)]
    #[validate(nested)]
    pub groups: Vec<GroupManifest>,

    /// QC suites to run
    #[serde(default)]
    #[validate(nested)]
    pub qc: Vec<QcManifest>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

/// Labelled group of sub-groups and collections
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GroupManifest {
    #[validate(length(min = 1, message = "group label cannot be empty"))]
    pub label: String,

    #[serde(default)]
    #[validate(nested)]
    pub groups: Vec<GroupManifest>,

    #[serde(default)]
    #[validate(nested)]
    pub collections: Vec<CollectionManifest>,
}

/// One collection and the factory that builds it
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CollectionManifest {
    #[validate(length(min = 1, message = "collection label cannot be empty"))]
    pub label: String,

    pub source: SourceManifest,
}

/// Collection factory selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "factory", rename_all = "snake_case")]
pub enum SourceManifest {
    /// One stream per file matched by glob patterns
    FilePattern {
        path: PathBuf,
        #[serde(default = "default_include")]
        include: Vec<String>,
        #[serde(default)]
        exclude: Vec<String>,
        stream: StreamSpec,
        #[serde(default)]
        allow_empty: bool,
        /// Stream description keyed by file stem
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        descriptions: BTreeMap<String, String>,
    },
    /// One stream per register of a Harp device log
    Harp {
        path: PathBuf,
        #[serde(default)]
        inference: InferenceMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<SchemaHint>,
        #[serde(default = "default_true")]
        include_common_registers: bool,
        #[serde(default = "default_true")]
        keep_message_type: bool,
        /// Time zero of the device clock; register `Time` becomes absolute when set
        #[serde(default, skip_serializing_if = "Option::is_none")]
        epoch: Option<DateTime<Utc>>,
    },
}

fn default_include() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

impl SourceManifest {
    pub fn path(&self) -> &Path {
        match self {
            SourceManifest::FilePattern { path, .. } | SourceManifest::Harp { path, .. } => path,
        }
    }

    fn path_mut(&mut self) -> &mut PathBuf {
        match self {
            SourceManifest::FilePattern { path, .. } | SourceManifest::Harp { path, .. } => path,
        }
    }
}

/// Reader options for file-pattern collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamSpec {
    Csv {
        #[serde(default = "default_delimiter")]
        delimiter: char,
        #[serde(default = "default_true")]
        has_header: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<String>,
    },
    Json {
        #[serde(default)]
        layout: JsonLayout,
    },
    Text,
    Camera {
        #[serde(default = "default_camera_metadata")]
        metadata: String,
        #[serde(default = "default_video_extensions")]
        video_extensions: Vec<String>,
    },
}

fn default_delimiter() -> char {
    ','
}

fn default_camera_metadata() -> String {
    "metadata.csv".to_string()
}

fn default_video_extensions() -> Vec<String> {
    vec!["avi".to_string(), "mp4".to_string()]
}

impl StreamSpec {
    /// CSV with default options
    pub fn csv() -> Self {
        StreamSpec::Csv {
            delimiter: default_delimiter(),
            has_header: true,
            index: None,
        }
    }

    /// Camera directory with default metadata name and video extensions
    pub fn camera() -> Self {
        StreamSpec::Camera {
            metadata: default_camera_metadata(),
            video_extensions: default_video_extensions(),
        }
    }
}

/// JSON file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonLayout {
    /// A single object or an array of objects
    #[default]
    Document,
    /// One object per line
    Lines,
}

/// How register payloads not described by a schema are decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceMode {
    /// Trust each frame's payload-type byte
    #[default]
    PayloadType,
    /// Decode payloads as unsigned bytes
    RawBytes,
}

/// Where to find the device schema of a Harp log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SchemaHint {
    /// Explicit device.yml
    File { path: PathBuf },
    /// Read WhoAmI from register 0, then pick the matching schema in `search_dir`
    Register0 { search_dir: PathBuf },
    /// Known WhoAmI, matching schema in `search_dir`
    WhoAmI { who_am_i: u16, search_dir: PathBuf },
}

/// QC suite declaration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QcManifest {
    pub suite: QcSuiteKind,

    /// Label path of the collection under test (`group/.../collection`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "qc target cannot be empty"))]
    pub target: Option<String>,

    /// Harp: expected WhoAmI value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_who_am_i: Option<u16>,

    /// Harp: label path of the commands collection for request/response checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<String>,

    /// Table: columns every stream must carry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected_columns: Vec<String>,
}

/// Built-in QC suites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QcSuiteKind {
    HarpDevice,
    Table,
    Contract,
}

impl ContractManifest {
    /// Resolve `root` against `base` and every source path against `root`
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.root.is_relative() {
            self.root = base.join(&self.root);
        }
        let root = self.root.clone();
        for group in &mut self.groups {
            group.resolve_paths(&root);
        }
    }

    /// Label paths of every declared collection, depth first
    pub fn collection_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        for group in &self.groups {
            group.collect_paths(&group.label, &mut out);
        }
        out
    }

    /// Total number of collections
    pub fn collection_count(&self) -> usize {
        self.collection_paths().len()
    }
}

impl GroupManifest {
    fn resolve_paths(&mut self, root: &Path) {
        for collection in &mut self.collections {
            let path = collection.source.path_mut();
            if path.is_relative() {
                *path = root.join(&*path);
            }
            if let SourceManifest::Harp {
                schema: Some(hint), ..
            } = &mut collection.source
            {
                let dir = match hint {
                    SchemaHint::File { path } => path,
                    SchemaHint::Register0 { search_dir } => search_dir,
                    SchemaHint::WhoAmI { search_dir, .. } => search_dir,
                };
                if dir.is_relative() {
                    *dir = root.join(&*dir);
                }
            }
        }
        for group in &mut self.groups {
            group.resolve_paths(root);
        }
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        for collection in &self.collections {
            out.push(format!("{prefix}/{}", collection.label));
        }
        for group in &self.groups {
            group.collect_paths(&format!("{prefix}/{}", group.label), out);
        }
    }
}
