//! # Contracts
//!
//! Data-contract primitives shared by every crate in the workspace.
//! Business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Data Model
//! - [`DataStream`]: one named source, decoded lazily into a [`Table`]
//! - [`DataStreamCollection`]: ordered, uniquely keyed streams from one source
//! - [`DataContract`]: collections arranged under semantic labels
//! - [`ContractManifest`]: declarative description consumed by the builders

mod collection;
mod contract;
mod error;
mod manifest;
mod stream;
mod table;

pub use collection::DataStreamCollection;
pub use contract::{ContractGroup, ContractNode, DataContract};
pub use error::*;
pub use manifest::*;
pub use stream::{DataStream, LoadState, StreamKind, StreamReader};
pub use table::{Table, Value};
