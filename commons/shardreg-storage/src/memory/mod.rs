use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::table::RecordTable;
use crate::traits::*;

/// Process-local store; contents are lost when the last clone is dropped.
#[derive(Clone, Default)]
pub struct MemoryAttributeStore {
    table: Arc<RwLock<RecordTable>>,
}

impl MemoryAttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AttributeStore for MemoryAttributeStore {
    async fn put(&self, key: &[&str], value: Value) -> StorageResult<()> {
        let key = owned_key(key)?;
        let mut table = self.table.write().await;
        table.put(key, value);
        Ok(())
    }

    async fn scan(
        &self,
        prefix: &[&str],
        visitor: &mut RecordVisitor<'_>,
    ) -> StorageResult<()> {
        let table = self.table.read().await;
        table.scan(prefix, visitor);
        Ok(())
    }

    async fn remove(&self, key: &[&str]) -> StorageResult<bool> {
        let key = owned_key(key)?;
        let mut table = self.table.write().await;
        Ok(table.remove(&key))
    }

    async fn remove_prefix(&self, prefix: &[&str]) -> StorageResult<usize> {
        let mut table = self.table.write().await;
        Ok(table.remove_prefix(prefix))
    }
}
