use std::{fmt, str::FromStr};

use chrono::TimeDelta;
use envconfig::Envconfig;

pub const DEFAULT_STORE_KEY: &str = ".SHARD_STATE";

/// How `index_slice` chooses among the flocs covering a query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlocSelection {
    /// Most shards wins; equal counts go to the floc discovered first.
    #[default]
    ShardCount,
    /// Highest `last_indexed_tx_id` reported by any live replica wins; shard
    /// count and discovery order break ties.
    IndexProgress,
}

impl FlocSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlocSelection::ShardCount => "shard-count",
            FlocSelection::IndexProgress => "index-progress",
        }
    }
}

impl fmt::Display for FlocSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug)]
#[error("unknown floc selection '{0}', expected shard-count or index-progress")]
pub struct ParseFlocSelectionError(String);

impl FromStr for FlocSelection {
    type Err = ParseFlocSelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shard-count" => Ok(FlocSelection::ShardCount),
            "index-progress" => Ok(FlocSelection::IndexProgress),
            other => Err(ParseFlocSelectionError(other.to_string())),
        }
    }
}

#[derive(Envconfig, Clone, Debug)]
pub struct RegistryConfig {
    #[envconfig(from = "SHARDREG_STORE_KEY", default = ".SHARD_STATE")]
    pub store_key: String,
    #[envconfig(from = "SHARDREG_PURGE_ON_INIT", default = "false")]
    pub purge_on_init: bool,
    /// Instances not heard from for this long are aged out. No default: the
    /// right value depends on how often shard nodes report.
    #[envconfig(from = "SHARDREG_INSTANCE_TIMEOUT_SECS")]
    pub instance_timeout_secs: Option<u64>,
    #[envconfig(from = "SHARDREG_MAX_REPLICA_TX_LAG")]
    pub max_replica_tx_lag: Option<u64>,
    #[envconfig(from = "SHARDREG_REQUIRE_COMPLETE_SLICE", default = "false")]
    pub require_complete_slice: bool,
    #[envconfig(from = "SHARDREG_RNG_SEED")]
    pub rng_seed: Option<u64>,
    #[envconfig(from = "SHARDREG_FLOC_SELECTION", default = "shard-count")]
    pub floc_selection: FlocSelection,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            store_key: DEFAULT_STORE_KEY.to_string(),
            purge_on_init: false,
            instance_timeout_secs: None,
            max_replica_tx_lag: None,
            require_complete_slice: false,
            rng_seed: None,
            floc_selection: FlocSelection::default(),
        }
    }
}

impl RegistryConfig {
    pub fn instance_timeout(&self) -> Option<TimeDelta> {
        self.instance_timeout_secs.map(|secs| {
            TimeDelta::try_seconds(secs.min(i64::MAX as u64) as i64)
                .unwrap_or(TimeDelta::MAX)
        })
    }
}
