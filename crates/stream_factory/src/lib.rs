//! # Stream Factory
//!
//! Collection factories and contract assembly.
//!
//! Responsibilities:
//! - Discover sources on disk and build `DataStreamCollection`s
//! - Build a `DataContract` from a `ContractManifest`
//! - Abort the build on the first failing collection
//!
//! ## Factories
//!
//! - [`FilePatternFactory`]: glob patterns over a directory, one stream per file
//! - [`HarpCollectionFactory`]: Harp device log, one stream per register

pub mod builder;
pub mod error;
pub mod factory;
pub mod file_pattern;
pub mod harp;

pub use builder::ContractBuilder;
pub use contracts::{ContractManifest, DataContract, DataStreamCollection};
pub use error::{FactoryError, Result};
pub use factory::CollectionFactory;
pub use file_pattern::FilePatternFactory;
pub use harp::{HarpCollectionFactory, RegisterSource};
