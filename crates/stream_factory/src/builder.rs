//! ContractBuilder - assemble a DataContract from a ContractManifest

use contracts::{
    CollectionManifest, ContractGroup, ContractManifest, DataContract, GroupManifest,
    SourceManifest,
};
use tracing::{info, instrument};

use crate::error::{FactoryError, Result};
use crate::factory::CollectionFactory;
use crate::file_pattern::FilePatternFactory;
use crate::harp::HarpCollectionFactory;

/// Contract builder
///
/// Builds every declared collection with its factory. The first failing
/// collection aborts the build; no partially built contract is returned.
pub struct ContractBuilder;

impl ContractBuilder {
    /// Factory for one declared collection
    pub fn factory_for(collection: &CollectionManifest) -> Box<dyn CollectionFactory> {
        let label = collection.label.as_str();
        match &collection.source {
            SourceManifest::FilePattern {
                path,
                include,
                exclude,
                stream,
                allow_empty,
                descriptions,
            } => {
                let mut factory = FilePatternFactory::new(label, path, stream.clone())
                    .allow_empty(*allow_empty)
                    .with_descriptions(descriptions.clone());
                for pattern in include {
                    factory = factory.include(pattern);
                }
                for pattern in exclude {
                    factory = factory.exclude(pattern);
                }
                Box::new(factory)
            }
            SourceManifest::Harp {
                path,
                inference,
                schema,
                include_common_registers,
                keep_message_type,
                epoch,
            } => {
                let mut factory = HarpCollectionFactory::new(label, path)
                    .inference(*inference)
                    .include_common_registers(*include_common_registers)
                    .keep_message_type(*keep_message_type);
                if let Some(hint) = schema {
                    factory = factory.schema(hint.clone());
                }
                if let Some(epoch) = epoch {
                    factory = factory.epoch(*epoch);
                }
                Box::new(factory)
            }
        }
    }

    /// Build the whole contract
    ///
    /// Paths in the manifest are used as given; resolve them first when the
    /// manifest came from a file.
    #[instrument(
        name = "contract_builder_build",
        skip(manifest),
        fields(contract = %manifest.name, collections = manifest.collection_count())
    )]
    pub fn build(manifest: &ContractManifest) -> Result<DataContract> {
        let mut contract = DataContract::new(&manifest.name);
        for group in &manifest.groups {
            let built = Self::build_group(group, &group.label)?;
            contract.root_mut().try_insert(&group.label, built)?;
        }

        let streams = contract.walk_streams().len();
        info!(streams, "contract built");
        Ok(contract)
    }

    fn build_group(manifest: &GroupManifest, path: &str) -> Result<ContractGroup> {
        let mut group = ContractGroup::new(&manifest.label);
        for collection in &manifest.collections {
            let label_path = format!("{path}/{}", collection.label);
            let built = Self::factory_for(collection)
                .build()
                .map_err(|e| FactoryError::collection_build(&label_path, e))?;
            group.try_insert(&collection.label, built)?;
        }
        for sub in &manifest.groups {
            let built = Self::build_group(sub, &format!("{path}/{}", sub.label))?;
            group.try_insert(&sub.label, built)?;
        }
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use contracts::{ContractError, InferenceMode, StreamSpec};

    use super::*;

    fn csv_collection(label: &str, path: PathBuf, allow_empty: bool) -> CollectionManifest {
        CollectionManifest {
            label: label.to_string(),
            source: SourceManifest::FilePattern {
                path,
                include: vec!["*.csv".to_string()],
                exclude: Vec::new(),
                stream: StreamSpec::csv(),
                allow_empty,
                descriptions: BTreeMap::new(),
            },
        }
    }

    fn manifest(root: &std::path::Path) -> ContractManifest {
        ContractManifest {
            name: "session".to_string(),
            root: root.to_path_buf(),
            groups: vec![GroupManifest {
                label: "behavior".to_string(),
                groups: vec![GroupManifest {
                    label: "nested".to_string(),
                    groups: Vec::new(),
                    collections: vec![csv_collection("Empty", root.join("empty"), true)],
                }],
                collections: vec![csv_collection("Rig", root.to_path_buf(), false)],
            }],
            qc: Vec::new(),
        }
    }

    #[test]
    fn test_build_nested_contract() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        std::fs::write(dir.path().join("Settings.csv"), "a\n1\n").unwrap();

        let contract = ContractBuilder::build(&manifest(dir.path())).unwrap();
        assert!(contract.stream("behavior/Rig/Settings").is_ok());
        assert!(contract
            .group("behavior")
            .unwrap()
            .group("nested")
            .unwrap()
            .collection("Empty")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_failing_collection_is_labelled() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContractBuilder::build(&manifest(dir.path())).unwrap_err();
        match &err {
            FactoryError::CollectionBuild { label, .. } => assert_eq!(label, "behavior/Rig"),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(
            err.contract_error(),
            ContractError::EmptyCollection { .. }
        ));
    }

    #[test]
    fn test_factory_for_harp() {
        let collection = CollectionManifest {
            label: "LoadCells".to_string(),
            source: SourceManifest::Harp {
                path: PathBuf::from("/nonexistent/LoadCells"),
                inference: InferenceMode::RawBytes,
                schema: None,
                include_common_registers: true,
                keep_message_type: true,
                epoch: None,
            },
        };
        let factory = ContractBuilder::factory_for(&collection);
        assert_eq!(factory.name(), "LoadCells");
        assert!(matches!(
            factory.build(),
            Err(ContractError::MissingSource { .. })
        ));
    }
}
