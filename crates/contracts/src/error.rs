//! Layered error definitions
//!
//! Categorized by source: config / source files / decoding / lookup

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Source Errors =====
    /// File or directory backing a stream is absent
    #[error("missing source '{}': {message}", path.display())]
    MissingSource { path: PathBuf, message: String },

    /// Factory matched zero sources
    #[error("no sources matched {patterns:?} in '{}'", path.display())]
    EmptyCollection { path: PathBuf, patterns: Vec<String> },

    // ===== Decoding Errors =====
    /// Content is malformed for the declared stream kind
    #[error("decode error in '{}': {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// Binary framing does not match the expected header/payload layout
    #[error("protocol parse error in '{}' at byte {offset}: {message}", path.display())]
    ProtocolParse {
        path: PathBuf,
        offset: usize,
        message: String,
    },

    // ===== Structure Errors =====
    /// Two streams (or contract nodes) share the same key
    #[error("duplicate key '{key}' in '{container}'")]
    DuplicateStream { container: String, key: String },

    /// Lookup by label chain failed
    #[error("'{key}' not found in '{container}'")]
    NotFound { container: String, key: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create missing source error
    pub fn missing_source(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::MissingSource {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create decode error
    pub fn decode(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create protocol parse error
    pub fn protocol_parse(path: impl AsRef<Path>, offset: usize, message: impl Into<String>) -> Self {
        Self::ProtocolParse {
            path: path.as_ref().to_path_buf(),
            offset,
            message: message.into(),
        }
    }

    /// Create duplicate key error
    pub fn duplicate(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DuplicateStream {
            container: container.into(),
            key: key.into(),
        }
    }

    /// Create lookup error
    pub fn not_found(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            container: container.into(),
            key: key.into(),
        }
    }

    /// Map an IO error on `path` to the matching contract error.
    ///
    /// `NotFound` becomes [`ContractError::MissingSource`], anything else stays `Io`.
    pub fn from_io(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::missing_source(path, err.to_string())
        } else {
            Self::Io(err)
        }
    }

    /// Stable short name of the error category (used for metrics labels)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } => "config_parse",
            Self::ConfigValidation { .. } => "config_validation",
            Self::MissingSource { .. } => "missing_source",
            Self::EmptyCollection { .. } => "empty_collection",
            Self::Decode { .. } => "decode",
            Self::ProtocolParse { .. } => "protocol_parse",
            Self::DuplicateStream { .. } => "duplicate",
            Self::NotFound { .. } => "not_found",
            Self::Io(_) => "io",
        }
    }
}
