//! # Config Loader
//!
//! Reads a contract manifest from disk and hands back a validated
//! [`ContractManifest`] whose paths are absolute.
//!
//! TOML is the primary format; JSON is accepted for generated manifests.
//! The format follows the file extension. Given a session directory, the
//! loader looks for one of [`MANIFEST_FILE_NAMES`] inside it.
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let manifest = ConfigLoader::load_from_path(Path::new("session/contract.toml")).unwrap();
//! for path in manifest.collection_paths() {
//!     println!("{path}");
//! }
//! ```

mod parser;
mod validator;

pub use contracts::ContractManifest;
pub use parser::ConfigFormat;

use std::path::{Path, PathBuf};

use contracts::ContractError;

/// Manifest names looked up, in order, when a directory is given
pub const MANIFEST_FILE_NAMES: [&str; 2] = ["contract.toml", "contract.json"];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Read, validate and resolve a manifest
    ///
    /// `path` is a manifest file or a directory holding one. Relative paths
    /// in the manifest are taken from the manifest's own directory.
    pub fn load_from_path(path: &Path) -> Result<ContractManifest, ContractError> {
        let file = Self::manifest_file(path)?;
        let format = Self::detect_format(&file)?;
        let content =
            std::fs::read_to_string(&file).map_err(|e| ContractError::from_io(&file, e))?;

        let mut manifest = Self::load_from_str(&content, format)?;
        manifest.resolve_paths(file.parent().unwrap_or_else(|| Path::new(".")));
        Ok(manifest)
    }

    /// Parse and validate; paths stay as written
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ContractManifest, ContractError> {
        let manifest = parser::parse(content, format)?;
        validator::validate(&manifest)?;
        Ok(manifest)
    }

    pub fn to_toml(manifest: &ContractManifest) -> Result<String, ContractError> {
        toml::to_string_pretty(manifest)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(manifest: &ContractManifest) -> Result<String, ContractError> {
        serde_json::to_string_pretty(manifest)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    fn manifest_file(path: &Path) -> Result<PathBuf, ContractError> {
        if !path.is_dir() {
            return Ok(path.to_path_buf());
        }
        MANIFEST_FILE_NAMES
            .iter()
            .map(|name| path.join(name))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| {
                ContractError::missing_source(
                    path,
                    format!("no manifest found (looked for {})", MANIFEST_FILE_NAMES.join(", ")),
                )
            })
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;
        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use contracts::{QcSuiteKind, SchemaHint, SourceManifest};

    use super::*;

    const MINIMAL_TOML: &str = r#"
name = "session"
root = "data"

[[groups]]
label = "behavior"

[[groups.collections]]
label = "Behavior"
source = { factory = "harp", path = "behavior/Behavior.harp", inference = "raw_bytes", epoch = "2024-03-01T12:00:00Z", schema = { source = "file", path = "schemas/device.yml" } }

[[groups.collections]]
label = "SoftwareEvents"
source = { factory = "file_pattern", path = "behavior/SoftwareEvents", include = ["*.json"], stream = { kind = "json", layout = "lines" } }

[[groups.groups]]
label = "cameras"

[[groups.groups.collections]]
label = "Cameras"
source = { factory = "file_pattern", path = "behavior/VideoData", stream = { kind = "camera" } }

[[qc]]
suite = "harp_device"
target = "behavior/Behavior"
expected_who_am_i = 1216
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let manifest = result.unwrap();
        assert_eq!(manifest.name, "session");
        assert_eq!(manifest.collection_count(), 3);
        assert_eq!(manifest.qc[0].suite, QcSuiteKind::HarpDevice);
    }

    #[test]
    fn test_round_trip_toml() {
        let m = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&m).unwrap();
        let m2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(m.name, m2.name);
        assert_eq!(m.collection_paths(), m2.collection_paths());
    }

    #[test]
    fn test_round_trip_json() {
        let m = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&m).unwrap();
        let m2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(m.collection_paths(), m2.collection_paths());
    }

    #[test]
    fn test_load_from_path_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.toml");
        std::fs::write(&path, MINIMAL_TOML).unwrap();

        let m = ConfigLoader::load_from_path(&path).unwrap();
        let data = dir.path().join("data");
        assert_eq!(m.root, data);
        match &m.groups[0].collections[0].source {
            SourceManifest::Harp {
                path,
                schema: Some(SchemaHint::File { path: schema }),
                epoch,
                ..
            } => {
                assert_eq!(path, &data.join("behavior/Behavior.harp"));
                assert_eq!(schema, &data.join("schemas/device.yml"));
                assert_eq!(epoch.map(|e| e.timestamp()), Some(1_709_294_400));
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_load_from_session_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load_from_path(dir.path()).unwrap_err();
        assert!(matches!(err, ContractError::MissingSource { .. }));

        let m = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        std::fs::write(
            dir.path().join("contract.json"),
            ConfigLoader::to_json(&m).unwrap(),
        )
        .unwrap();
        let loaded = ConfigLoader::load_from_path(dir.path()).unwrap();
        assert_eq!(loaded.root, dir.path().join("data"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigLoader::load_from_path(&PathBuf::from("contract.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::load_from_path(&PathBuf::from("/nonexistent/contract.toml"))
            .unwrap_err();
        assert!(matches!(err, ContractError::MissingSource { .. }));
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
name = "session"

[[groups]]
label = "behavior"

[[qc]]
suite = "table"
target = "behavior/Nothing"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(matches!(
            result,
            Err(ContractError::ConfigValidation { .. })
        ));
    }
}
