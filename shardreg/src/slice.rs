use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use shardreg_models::{Floc, ShardInstance, ShardState};

/// Which replicas may serve a query.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplicaPolicy {
    /// Replicas not updated within this window are ignored.
    pub instance_timeout: Option<TimeDelta>,
    /// Replicas trailing the shard's most advanced replica by more than this
    /// many transactions are ignored.
    pub max_tx_lag: Option<u64>,
}

impl ReplicaPolicy {
    pub fn is_expired(&self, state: &ShardState, now: DateTime<Utc>) -> bool {
        match self.instance_timeout {
            Some(timeout) => {
                now.signed_duration_since(state.last_updated) > timeout
            }
            None => false,
        }
    }
}

/// Candidate replicas of one floc, grouped by shard number.
#[derive(Debug, Default)]
pub struct SliceIndex {
    shards: BTreeMap<u32, Vec<ShardState>>,
}

impl SliceIndex {
    pub fn build<'a>(
        floc: &Floc,
        states: impl IntoIterator<Item = &'a ShardState>,
        policy: &ReplicaPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let mut shards: BTreeMap<u32, Vec<ShardState>> = BTreeMap::new();
        for state in states {
            if state.floc() != floc || policy.is_expired(state, now) {
                continue;
            }
            shards
                .entry(state.shard().instance)
                .or_default()
                .push(state.clone());
        }
        if let Some(max_lag) = policy.max_tx_lag {
            for replicas in shards.values_mut() {
                let newest = replicas
                    .iter()
                    .map(|s| s.last_indexed_tx_id)
                    .max()
                    .unwrap_or_default();
                replicas.retain(|s| newest - s.last_indexed_tx_id <= max_lag);
            }
        }
        shards.retain(|_, replicas| !replicas.is_empty());
        // input order follows cache iteration; picks must depend on the rng
        // alone
        for replicas in shards.values_mut() {
            replicas.sort_by(|a, b| replica_key(a).cmp(&replica_key(b)));
        }
        Self { shards }
    }

    /// Number of shards with at least one usable replica.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn replicas(&self, shard: u32) -> &[ShardState] {
        self.shards.get(&shard).map(Vec::as_slice).unwrap_or_default()
    }

    /// One uniformly chosen replica per shard, ordered by shard number.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ShardInstance> {
        self.shards
            .values()
            .map(|replicas| {
                let idx = rng.random_range(0..replicas.len());
                replicas[idx].shard_instance.clone()
            })
            .collect()
    }
}

fn replica_key(state: &ShardState) -> (&str, &str, u16) {
    let instance = &state.shard_instance;
    (&instance.base_url, &instance.host_name, instance.port)
}
