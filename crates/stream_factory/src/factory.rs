//! CollectionFactory trait

use contracts::{ContractError, DataStreamCollection};

/// Configuration object that produces exactly one collection
///
/// Implementations hold configuration only; every `build` call scans the
/// source again and returns a fresh collection with unloaded streams.
pub trait CollectionFactory {
    /// Name given to the built collection
    fn name(&self) -> &str;

    /// Discover sources and construct one stream per discovery
    ///
    /// # Errors
    /// - `MissingSource` when the source path is absent
    /// - `EmptyCollection` when nothing was discovered and empty results are not allowed
    /// - `DuplicateStream` when two discoveries map to the same stream name
    fn build(&self) -> Result<DataStreamCollection, ContractError>;
}
