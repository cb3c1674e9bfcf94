use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{ShardMethod, StoreRef};

/// A family of shard configurations: every shard that together indexes one
/// set of stores with a fixed shard count.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate,
)]
pub struct Floc {
    #[validate(length(min = 1, message = "Floc must cover at least one store"))]
    pub stores: BTreeSet<StoreRef>,
    #[validate(range(min = 1, message = "Floc must have at least one shard"))]
    pub number_of_shards: u32,
    #[serde(default)]
    pub shard_method: ShardMethod,
    #[serde(default)]
    pub has_content: bool,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Floc {
    pub fn new(
        stores: impl IntoIterator<Item = StoreRef>,
        number_of_shards: u32,
    ) -> Self {
        Self {
            stores: stores.into_iter().collect(),
            number_of_shards,
            shard_method: ShardMethod::default(),
            has_content: false,
            template: String::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_shard_method(mut self, method: ShardMethod) -> Self {
        self.shard_method = method;
        self
    }

    pub fn with_content(mut self, has_content: bool) -> Self {
        self.has_content = has_content;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// True when every requested store is indexed by this floc.
    pub fn covers(&self, stores: &BTreeSet<StoreRef>) -> bool {
        stores.is_subset(&self.stores)
    }
}

impl fmt::Display for Floc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stores: Vec<String> =
            self.stores.iter().map(|s| s.to_string()).collect();
        write!(
            f,
            "floc[{}; shards={}; {}]",
            stores.join(","),
            self.number_of_shards,
            self.shard_method
        )
    }
}

/// One logical partition of a floc.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate,
)]
pub struct Shard {
    #[validate(nested)]
    pub floc: Floc,
    pub instance: u32,
}

impl Shard {
    pub fn new(floc: Floc, instance: u32) -> Self {
        Self { floc, instance }
    }
}

/// A running replica of a shard.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate,
)]
pub struct ShardInstance {
    #[validate(nested)]
    pub shard: Shard,
    #[validate(length(min = 1, message = "Base URL cannot be empty"))]
    pub base_url: String,
    #[validate(length(min = 1, message = "Host name cannot be empty"))]
    pub host_name: String,
    pub port: u16,
}

impl ShardInstance {
    pub fn new(
        shard: Shard,
        base_url: impl Into<String>,
        host_name: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            shard,
            base_url: base_url.into(),
            host_name: host_name.into(),
            port,
        }
    }

    #[inline]
    pub fn floc(&self) -> &Floc {
        &self.shard.floc
    }
}

impl fmt::Display for ShardInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}{}#{}",
            self.host_name, self.port, self.base_url, self.shard.instance
        )
    }
}

/// Snapshot of a shard instance as last reported by the instance itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ShardState {
    #[validate(nested)]
    pub shard_instance: ShardInstance,
    #[serde(default)]
    pub master: bool,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub last_indexed_tx_id: u64,
    #[serde(default)]
    pub last_indexed_tx_commit_time: i64,
    #[serde(default)]
    pub last_indexed_change_set_id: u64,
    #[serde(default)]
    pub last_indexed_change_set_commit_time: i64,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ShardState {
    pub fn new(shard_instance: ShardInstance) -> Self {
        Self {
            shard_instance,
            master: true,
            last_updated: Utc::now(),
            last_indexed_tx_id: 0,
            last_indexed_tx_commit_time: 0,
            last_indexed_change_set_id: 0,
            last_indexed_change_set_commit_time: 0,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_master(mut self, master: bool) -> Self {
        self.master = master;
        self
    }

    pub fn with_last_updated(mut self, last_updated: DateTime<Utc>) -> Self {
        self.last_updated = last_updated;
        self
    }

    pub fn with_last_indexed_tx_id(mut self, tx_id: u64) -> Self {
        self.last_indexed_tx_id = tx_id;
        self
    }

    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn shard(&self) -> &Shard {
        &self.shard_instance.shard
    }

    #[inline]
    pub fn floc(&self) -> &Floc {
        &self.shard_instance.shard.floc
    }
}
