#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{SeedableRng, rngs::StdRng};
use serde_json::Value;
use shardreg::{RegistryConfig, ShardRegistry};
use shardreg_models::{
    Floc, SearchParameters, Shard, ShardInstance, ShardState, StoreRef,
};
use shardreg_storage::{
    AttributeStore, RecordVisitor, StorageResult, memory::MemoryAttributeStore,
};

/// Memory store that counts how often the registry touches it.
#[derive(Clone, Default)]
pub struct CountingStore {
    pub inner: MemoryAttributeStore,
    puts: Arc<AtomicUsize>,
    scans: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.puts.store(0, Ordering::SeqCst);
        self.scans.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl AttributeStore for CountingStore {
    async fn put(&self, key: &[&str], value: Value) -> StorageResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, value).await
    }

    async fn scan(
        &self,
        prefix: &[&str],
        visitor: &mut RecordVisitor<'_>,
    ) -> StorageResult<()> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.inner.scan(prefix, visitor).await
    }

    async fn remove(&self, key: &[&str]) -> StorageResult<bool> {
        self.inner.remove(key).await
    }

    async fn remove_prefix(&self, prefix: &[&str]) -> StorageResult<usize> {
        self.inner.remove_prefix(prefix).await
    }
}

pub fn registry(store: &CountingStore) -> ShardRegistry {
    registry_with(store, RegistryConfig::default())
}

pub fn registry_with(
    store: &CountingStore,
    config: RegistryConfig,
) -> ShardRegistry {
    ShardRegistry::builder(Arc::new(store.clone()))
        .config(config)
        .rng(StdRng::seed_from_u64(42))
        .build()
}

pub fn workspace_floc(shards: u32) -> Floc {
    Floc::new([StoreRef::workspace_spaces_store()], shards)
        .with_content(true)
        .with_template("rerank")
}

pub fn archive_floc(shards: u32) -> Floc {
    Floc::new([StoreRef::archive_spaces_store()], shards)
        .with_template("rerank")
}

pub fn both_stores_floc(shards: u32) -> Floc {
    Floc::new(
        [
            StoreRef::workspace_spaces_store(),
            StoreRef::archive_spaces_store(),
        ],
        shards,
    )
}

pub fn instance(floc: &Floc, shard: u32, base_url: &str) -> ShardInstance {
    ShardInstance::new(
        Shard::new(floc.clone(), shard),
        base_url,
        "meep",
        1234,
    )
}

pub fn state(floc: &Floc, shard: u32, base_url: &str) -> ShardState {
    ShardState::new(instance(floc, shard, base_url))
        .with_property("coreName", format!("core-{shard}"))
}

pub fn state_at(
    floc: &Floc,
    shard: u32,
    base_url: &str,
    at: DateTime<Utc>,
) -> ShardState {
    state(floc, shard, base_url).with_last_updated(at)
}

pub fn workspace_params() -> SearchParameters {
    SearchParameters::new().with_store(StoreRef::workspace_spaces_store())
}

pub fn archive_params() -> SearchParameters {
    SearchParameters::new().with_store(StoreRef::archive_spaces_store())
}
