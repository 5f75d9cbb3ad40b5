//! HarpCollectionFactory - one stream per register of a Harp device log

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use contracts::{
    ContractError, DataStream, DataStreamCollection, InferenceMode, SchemaHint,
};
use ingestion::harp::{
    common_register_name, first_address, read_frames, scan_addresses, who_am_i, DeviceSchema,
    HarpRegisterReader, WHO_AM_I_ADDRESS,
};
use tracing::{debug, info, instrument, warn};

use crate::factory::CollectionFactory;

/// Register discovered in a log: address and the file holding its frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterSource {
    pub address: u8,
    pub path: PathBuf,
}

/// Harp device collection factory
///
/// The source is either a single multiplexed `.bin` log or a device
/// directory of per-register `<Device>_<address>.bin` files.
#[derive(Debug, Clone)]
pub struct HarpCollectionFactory {
    name: String,
    path: PathBuf,
    inference: InferenceMode,
    schema: Option<SchemaHint>,
    include_common_registers: bool,
    keep_message_type: bool,
    epoch: Option<DateTime<Utc>>,
}

impl HarpCollectionFactory {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            inference: InferenceMode::default(),
            schema: None,
            include_common_registers: true,
            keep_message_type: true,
            epoch: None,
        }
    }

    pub fn inference(mut self, mode: InferenceMode) -> Self {
        self.inference = mode;
        self
    }

    pub fn schema(mut self, hint: SchemaHint) -> Self {
        self.schema = Some(hint);
        self
    }

    pub fn include_common_registers(mut self, include: bool) -> Self {
        self.include_common_registers = include;
        self
    }

    pub fn keep_message_type(mut self, keep: bool) -> Self {
        self.keep_message_type = keep;
        self
    }

    /// Reference time of the device clock's zero
    pub fn epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.epoch = Some(epoch);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registers present in the source, ascending by address
    pub fn discover(&self) -> Result<Vec<RegisterSource>, ContractError> {
        if self.path.is_file() {
            let addresses = scan_addresses(&self.path)?;
            return Ok(addresses
                .into_iter()
                .map(|address| RegisterSource {
                    address,
                    path: self.path.clone(),
                })
                .collect());
        }
        if !self.path.is_dir() {
            return Err(ContractError::missing_source(&self.path, "harp log not found"));
        }

        let pattern = format!("{}/*.bin", glob::Pattern::escape(&self.path.to_string_lossy()));
        let entries = glob::glob(&pattern)
            .map_err(|e| ContractError::config_validation(&self.name, e.to_string()))?;

        let mut sources = Vec::new();
        for entry in entries {
            let file = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                ContractError::from_io(path, e.into_error())
            })?;
            let address = match address_from_stem(&file) {
                Some(address) => address,
                None => first_address(&file)?.ok_or_else(|| {
                    ContractError::decode(&file, "cannot determine register address")
                })?,
            };
            sources.push(RegisterSource {
                address,
                path: file,
            });
        }
        sources.sort_by(|a, b| a.address.cmp(&b.address).then_with(|| a.path.cmp(&b.path)));
        Ok(sources)
    }

    /// Resolve the schema hint, if any
    pub fn resolve_schema(
        &self,
        sources: &[RegisterSource],
    ) -> Result<Option<DeviceSchema>, ContractError> {
        let hint = match &self.schema {
            Some(hint) => hint,
            None => return Ok(None),
        };
        let schema = match hint {
            SchemaHint::File { path } => DeviceSchema::from_path(path)?,
            SchemaHint::WhoAmI {
                who_am_i,
                search_dir,
            } => DeviceSchema::find_by_who_am_i(search_dir, *who_am_i)?,
            SchemaHint::Register0 { search_dir } => {
                let source = sources
                    .iter()
                    .find(|s| s.address == WHO_AM_I_ADDRESS)
                    .ok_or_else(|| {
                        ContractError::missing_source(&self.path, "WhoAmI register not found")
                    })?;
                let frames = read_frames(&source.path)?;
                let value = who_am_i(&frames).ok_or_else(|| {
                    ContractError::missing_source(&source.path, "WhoAmI register holds no value")
                })?;
                debug!(who_am_i = value, "WhoAmI read from register 0");
                DeviceSchema::find_by_who_am_i(search_dir, value)?
            }
        };
        Ok(Some(schema))
    }

    fn register_name(&self, address: u8, schema: Option<&DeviceSchema>) -> String {
        if let Some((name, _)) = schema.and_then(|s| s.register(address)) {
            return name.to_string();
        }
        if self.include_common_registers {
            if let Some(name) = common_register_name(address) {
                return name.to_string();
            }
        }
        format!("register_{address}")
    }
}

/// Numeric suffix after the last `_` of the file stem
fn address_from_stem(path: &Path) -> Option<u8> {
    let stem = path.file_stem()?.to_str()?;
    let (_, suffix) = stem.rsplit_once('_')?;
    suffix.parse().ok()
}

impl CollectionFactory for HarpCollectionFactory {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "harp_collection_factory_build",
        skip(self),
        fields(collection = %self.name, path = %self.path.display())
    )]
    fn build(&self) -> Result<DataStreamCollection, ContractError> {
        let sources = self.discover()?;
        if sources.is_empty() {
            warn!("harp log holds no registers");
        }
        let schema = self.resolve_schema(&sources)?;
        if let Some(schema) = &schema {
            info!(device = %schema.device, who_am_i = schema.who_am_i, "device schema loaded");
        }

        let mut collection = DataStreamCollection::new(&self.name).with_source(&self.path);
        for source in sources {
            let name = self.register_name(source.address, schema.as_ref());
            let mut reader = HarpRegisterReader::new(source.address, name.clone())
                .with_inference(self.inference)
                .with_message_type(self.keep_message_type);
            if let Some(epoch) = self.epoch {
                reader = reader.with_epoch(epoch);
            }
            let mut description = None;
            if let Some((_, register)) = schema.as_ref().and_then(|s| s.register(source.address)) {
                reader = reader.with_schema(register.clone());
                description = register.description.clone();
            }

            let mut stream = DataStream::new(name, source.path, Box::new(reader));
            if let Some(description) = description {
                stream = stream.with_description(description);
            }
            collection.try_insert(stream)?;
        }

        info!(streams = collection.len(), "collection built");
        Ok(collection)
    }
}
