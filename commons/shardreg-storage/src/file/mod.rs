use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{fs, sync::RwLock};
use tracing::debug;

use crate::table::{Record, RecordTable};
use crate::traits::*;

#[derive(Serialize, Deserialize, Default)]
struct Snapshot {
    next_id: u64,
    records: Vec<Record>,
}

/// Store kept in memory and snapshotted to a JSON file after every mutation.
///
/// The snapshot is written to a sibling temp file and renamed over the
/// target, so a crash leaves either the old or the new snapshot on disk.
/// Mutations are applied to a copy of the table that only replaces the live
/// one once its snapshot is written; a failed write changes nothing.
#[derive(Clone)]
pub struct FileAttributeStore {
    path: Arc<PathBuf>,
    table: Arc<RwLock<RecordTable>>,
}

impl FileAttributeStore {
    /// Open the store at `path`, loading the existing snapshot if there is one.
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let table = match fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                debug!(
                    "loaded {} records from {}",
                    snapshot.records.len(),
                    path.display()
                );
                RecordTable::from_records(snapshot.records, snapshot.next_id)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                RecordTable::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Arc::new(path),
            table: Arc::new(RwLock::new(table)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, table: &RecordTable) -> StorageResult<()> {
        let snapshot = Snapshot {
            next_id: table.next_id(),
            records: table.to_records(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, self.path.as_path()).await?;
        Ok(())
    }
}

#[async_trait]
impl AttributeStore for FileAttributeStore {
    async fn put(&self, key: &[&str], value: Value) -> StorageResult<()> {
        let key = owned_key(key)?;
        let mut table = self.table.write().await;
        let mut next = table.clone();
        next.put(key, value);
        self.flush(&next).await?;
        *table = next;
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
        let mut next = table.clone();
        let removed = next.remove(&key);
        if removed {
            self.flush(&next).await?;
            *table = next;
        }
        Ok(removed)
    }

    async fn remove_prefix(&self, prefix: &[&str]) -> StorageResult<usize> {
        let mut table = self.table.write().await;
        let mut next = table.clone();
        let removed = next.remove_prefix(prefix);
        if removed > 0 {
            self.flush(&next).await?;
            *table = next;
        }
        Ok(removed)
    }
}
