use async_trait::async_trait;
use envconfig::Envconfig;
use serde_json::Value;

use crate::traits::*;

#[cfg(feature = "file")]
use crate::file::FileAttributeStore;

#[cfg(feature = "memory")]
use crate::memory::MemoryAttributeStore;

#[derive(Envconfig, Clone, Debug, Default)]
pub struct StoreConfig {
    /// JSON snapshot file; the in-memory store is used when unset.
    #[envconfig(from = "SHARDREG_STORE_PATH")]
    pub path: Option<String>,
}

impl StoreConfig {
    pub async fn open(&self) -> StorageResult<DynAttributeStore> {
        match &self.path {
            #[cfg(feature = "file")]
            Some(path) => {
                tracing::info!("open file attribute store at {}", path);
                let store = FileAttributeStore::open(path).await?;
                Ok(DynAttributeStore::File(store))
            }
            #[cfg(not(feature = "file"))]
            Some(_) => Err(crate::StorageError::Backend(
                "file store requested but the 'file' feature is disabled"
                    .into(),
            )),
            #[cfg(feature = "memory")]
            None => {
                tracing::info!("open in-memory attribute store");
                Ok(DynAttributeStore::Memory(MemoryAttributeStore::new()))
            }
            #[cfg(not(feature = "memory"))]
            None => Err(crate::StorageError::Backend(
                "no store path set and the 'memory' feature is disabled".into(),
            )),
        }
    }
}

/// A store chosen at runtime without exposing the concrete backend type.
#[derive(Clone)]
pub enum DynAttributeStore {
    #[cfg(feature = "memory")]
    Memory(MemoryAttributeStore),
    #[cfg(feature = "file")]
    File(FileAttributeStore),
}

#[async_trait]
impl AttributeStore for DynAttributeStore {
    async fn put(&self, key: &[&str], value: Value) -> StorageResult<()> {
        match self {
            #[cfg(feature = "memory")]
            DynAttributeStore::Memory(s) => s.put(key, value).await,
            #[cfg(feature = "file")]
            DynAttributeStore::File(s) => s.put(key, value).await,
        }
    }

    async fn scan(
        &self,
        prefix: &[&str],
        visitor: &mut RecordVisitor<'_>,
    ) -> StorageResult<()> {
        match self {
            #[cfg(feature = "memory")]
            DynAttributeStore::Memory(s) => s.scan(prefix, visitor).await,
            #[cfg(feature = "file")]
            DynAttributeStore::File(s) => s.scan(prefix, visitor).await,
        }
    }

    async fn remove(&self, key: &[&str]) -> StorageResult<bool> {
        match self {
            #[cfg(feature = "memory")]
            DynAttributeStore::Memory(s) => s.remove(key).await,
            #[cfg(feature = "file")]
            DynAttributeStore::File(s) => s.remove(key).await,
        }
    }

    async fn remove_prefix(&self, prefix: &[&str]) -> StorageResult<usize> {
        match self {
            #[cfg(feature = "memory")]
            DynAttributeStore::Memory(s) => s.remove_prefix(prefix).await,
            #[cfg(feature = "file")]
            DynAttributeStore::File(s) => s.remove_prefix(prefix).await,
        }
    }
}
