use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;

pub type StorageResult<T> = Result<T, StorageError>;

/// Called once per record during a scan with `(record_id, key, value)`.
/// Returning `false` stops the scan.
pub type RecordVisitor<'a> =
    dyn FnMut(u64, &[String], &Value) -> bool + Send + 'a;

/// Durable key/value store addressed by composite keys.
///
/// Keys are sequences of parts; a scan visits every record whose key starts
/// with the given prefix, in key order. Record ids are assigned when a key is
/// first written and survive later overwrites of the same key.
#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Insert or overwrite the value stored under `key`.
    async fn put(&self, key: &[&str], value: Value) -> StorageResult<()>;

    async fn scan(
        &self,
        prefix: &[&str],
        visitor: &mut RecordVisitor<'_>,
    ) -> StorageResult<()>;

    /// Delete one record. Returns whether it existed.
    async fn remove(&self, key: &[&str]) -> StorageResult<bool>;

    /// Delete every record under `prefix`. Returns how many were deleted.
    async fn remove_prefix(&self, prefix: &[&str]) -> StorageResult<usize>;
}

pub(crate) fn owned_key(key: &[&str]) -> StorageResult<Vec<String>> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("empty key".into()));
    }
    Ok(key.iter().map(|part| part.to_string()).collect())
}
