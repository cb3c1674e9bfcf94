use shardreg_storage::StorageError;

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid shard state: {0}")]
    InvalidState(#[from] validator::ValidationErrors),
    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),
    #[error("Incomplete slice for {floc}: {found} of {expected} shards")]
    IncompleteSlice {
        floc: String,
        expected: u32,
        found: usize,
    },
}
