use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use rand::{SeedableRng, rngs::StdRng};
use serde_json::Value;
use shardreg_models::{
    Floc, SearchParameters, Shard, ShardInstance, ShardState,
};
use shardreg_storage::AttributeStore;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    cache::{SccCache, SimpleCache},
    collector::ShardStateCollector,
    config::{FlocSelection, RegistryConfig},
    error::RegistryError,
    floc::KnownFlocs,
    slice::{ReplicaPolicy, SliceIndex},
};

pub type StateCache = Arc<dyn SimpleCache<ShardInstance, ShardState>>;
pub type TokenCache = Arc<dyn SimpleCache<ShardInstance, String>>;

/// Flocs as seen through the state cache, with every cached replica grouped
/// under its shard.
pub type FlocView = HashMap<Floc, HashMap<Shard, Vec<ShardState>>>;

pub struct ShardRegistryBuilder {
    store: Arc<dyn AttributeStore>,
    config: RegistryConfig,
    state_cache: Option<StateCache>,
    token_cache: Option<TokenCache>,
    rng: Option<StdRng>,
}

impl ShardRegistryBuilder {
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state_cache(mut self, cache: StateCache) -> Self {
        self.state_cache = Some(cache);
        self
    }

    pub fn token_cache(mut self, cache: TokenCache) -> Self {
        self.token_cache = Some(cache);
        self
    }

    /// Overrides `rng_seed` from the config.
    pub fn rng(mut self, rng: StdRng) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn build(self) -> ShardRegistry {
        let rng = self.rng.unwrap_or_else(|| match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        });
        let policy = ReplicaPolicy {
            instance_timeout: self.config.instance_timeout(),
            max_tx_lag: self.config.max_replica_tx_lag,
        };
        ShardRegistry {
            store: self.store,
            policy,
            config: self.config,
            states: self
                .state_cache
                .unwrap_or_else(|| Arc::new(SccCache::new())),
            tokens: self
                .token_cache
                .unwrap_or_else(|| Arc::new(SccCache::new())),
            flocs: KnownFlocs::new(),
            rng: Mutex::new(rng),
        }
    }
}

/// Tracks which shard instances exist and picks a query slice out of them.
///
/// Shard nodes report their state through [`register_shard_state`]; query
/// routing asks [`index_slice`] for one replica per shard of the floc that
/// best covers the requested stores. Every state is written through to the
/// [`AttributeStore`], so a registry started later (or one whose cache is
/// missing entries) recovers the view by scanning the store.
///
/// [`register_shard_state`]: ShardRegistry::register_shard_state
/// [`index_slice`]: ShardRegistry::index_slice
pub struct ShardRegistry {
    store: Arc<dyn AttributeStore>,
    config: RegistryConfig,
    policy: ReplicaPolicy,
    states: StateCache,
    tokens: TokenCache,
    flocs: KnownFlocs,
    rng: Mutex<StdRng>,
}

impl ShardRegistry {
    pub fn builder(store: Arc<dyn AttributeStore>) -> ShardRegistryBuilder {
        ShardRegistryBuilder {
            store,
            config: RegistryConfig::default(),
            state_cache: None,
            token_cache: None,
            rng: None,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub async fn init(&self) -> Result<(), RegistryError> {
        if self.config.purge_on_init {
            info!("purge on init is enabled");
            self.purge().await?;
        }
        Ok(())
    }

    /// Record the latest state of a shard instance, replacing any earlier
    /// one. The instance keeps the same persisted record across calls.
    pub async fn register_shard_state(
        &self,
        state: ShardState,
    ) -> Result<(), RegistryError> {
        state.validate()?;
        let instance = state.shard_instance.clone();
        let token = self.token_for(&instance).await?;
        let value = serde_json::to_value(&state)?;
        self.store
            .put(&[self.config.store_key.as_str(), token.as_str()], value)
            .await?;
        self.states.put(instance.clone(), state);
        if self.flocs.register(instance.floc()) {
            info!("register new {}", instance.floc());
        }
        debug!("registered shard instance {instance} ({token})");
        Ok(())
    }

    async fn token_for(
        &self,
        instance: &ShardInstance,
    ) -> Result<String, RegistryError> {
        if let Some(token) = self.tokens.get(instance) {
            return Ok(token);
        }
        self.scan_persisted().await?;
        if let Some(token) = self.tokens.get(instance) {
            return Ok(token);
        }
        let fresh = Uuid::new_v4().to_string();
        Ok(self.tokens.put_if_absent(instance.clone(), fresh))
    }

    /// Read every persisted state. Tokens and flocs found are remembered;
    /// the states themselves are left to the caller.
    async fn scan_persisted(
        &self,
    ) -> Result<ShardStateCollector, RegistryError> {
        let mut collector = ShardStateCollector::default();
        self.store
            .scan(
                &[self.config.store_key.as_str()],
                &mut |id: u64, key: &[String], value: &Value| {
                    collector.handle_record(id, key, value)
                },
            )
            .await?;
        for (instance, token) in collector.tokens() {
            self.tokens.put_if_absent(instance.clone(), token.clone());
        }
        for state in collector.states() {
            if self.flocs.register(state.floc()) {
                info!("discover persisted {}", state.floc());
            }
        }
        debug!(
            "scanned {} persisted shard states ({} skipped)",
            collector.len(),
            collector.skipped()
        );
        Ok(collector)
    }

    /// Pick one replica for every shard of the floc serving `params`,
    /// ordered by shard number.
    ///
    /// Returns an empty slice when no known floc covers the requested
    /// stores. Shards without a usable replica are left out unless
    /// `require_complete_slice` is set, in which case the call fails.
    pub async fn index_slice(
        &self,
        params: &SearchParameters,
    ) -> Result<Vec<ShardInstance>, RegistryError> {
        let mut scanned = None;
        if self.flocs.covering(&params.stores).is_empty() {
            debug!("no known floc covers {:?}, rescanning", params.stores);
            scanned = Some(self.scan_persisted().await?);
        }
        let Some(floc) = self.select_floc(params, &mut scanned).await? else {
            debug!("no floc found for {:?}", params.stores);
            return Ok(Vec::new());
        };

        let expected = floc.number_of_shards;
        let mut index = self.build_index(&floc);
        if index.shard_count() < expected as usize {
            debug!(
                "cache has {} of {} shards for {floc}, repairing from store",
                index.shard_count(),
                expected
            );
            let collector = match scanned {
                Some(collector) => collector,
                None => self.scan_persisted().await?,
            };
            let merged = self.merge_states(collector.states_for(&floc));
            debug!("merged {merged} persisted states for {floc}");
            index = self.build_index(&floc);
        }

        let slice = {
            let mut rng =
                self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            index.pick(&mut *rng)
        };
        if slice.len() < expected as usize {
            if self.config.require_complete_slice {
                return Err(RegistryError::IncompleteSlice {
                    floc: floc.to_string(),
                    expected,
                    found: slice.len(),
                });
            }
            warn!(
                "incomplete slice for {floc}: {} of {expected} shards",
                slice.len()
            );
        }
        Ok(slice)
    }

    async fn select_floc(
        &self,
        params: &SearchParameters,
        scanned: &mut Option<ShardStateCollector>,
    ) -> Result<Option<Floc>, RegistryError> {
        let stores = &params.stores;
        if self.config.floc_selection == FlocSelection::ShardCount {
            return Ok(self.flocs.best_match(stores));
        }
        let candidates = self.flocs.covering(stores);
        let unseen = candidates
            .iter()
            .any(|(floc, _)| self.cached_states(floc).is_empty());
        if unseen && scanned.is_none() {
            *scanned = Some(self.scan_persisted().await?);
        }
        if let Some(collector) = scanned.as_ref() {
            for (floc, _) in &candidates {
                self.merge_states(collector.states_for(floc));
            }
        }
        let now = Utc::now();
        Ok(self
            .flocs
            .best_match_by(stores, |floc| self.index_progress(floc, now)))
    }

    /// Highest transaction indexed by any live replica of `floc`.
    fn index_progress(&self, floc: &Floc, now: DateTime<Utc>) -> Option<u64> {
        self.cached_states(floc)
            .iter()
            .filter(|state| !self.policy.is_expired(state, now))
            .map(|state| state.last_indexed_tx_id)
            .max()
    }

    fn build_index(&self, floc: &Floc) -> SliceIndex {
        let states = self.cached_states(floc);
        SliceIndex::build(floc, &states, &self.policy, Utc::now())
    }

    fn cached_states(&self, floc: &Floc) -> Vec<ShardState> {
        self.states
            .keys()
            .into_iter()
            .filter(|instance| instance.floc() == floc)
            .filter_map(|instance| self.states.get(&instance))
            .collect()
    }

    /// Copy persisted states into the cache unless the cache already holds
    /// something newer for the same instance.
    fn merge_states<'a>(
        &self,
        states: impl IntoIterator<Item = &'a ShardState>,
    ) -> usize {
        let mut merged = 0;
        for state in states {
            let newer = self
                .states
                .get(&state.shard_instance)
                .is_none_or(|cached| {
                    state.last_updated >= cached.last_updated
                });
            if newer {
                self.states.put(state.shard_instance.clone(), state.clone());
                merged += 1;
            }
        }
        merged
    }

    /// Load every persisted state into the cache. Returns how many cache
    /// entries were added or refreshed.
    pub async fn reload(&self) -> Result<usize, RegistryError> {
        let collector = self.scan_persisted().await?;
        let merged = self.merge_states(collector.states());
        info!("reloaded {merged} of {} persisted states", collector.len());
        Ok(merged)
    }

    /// Forget every shard instance, cached and persisted. Returns the number
    /// of persisted records removed.
    pub async fn purge(&self) -> Result<usize, RegistryError> {
        let removed = self
            .store
            .remove_prefix(&[self.config.store_key.as_str()])
            .await?;
        self.states.clear();
        self.tokens.clear();
        self.flocs.clear();
        info!("purged shard registry, {removed} persisted states removed");
        Ok(removed)
    }

    /// Remove instances not updated within `instance_timeout_secs`, from the
    /// cache and the store. Flocs left without any instance are forgotten.
    /// Returns the number of instances removed.
    pub async fn purge_aged_out_shards(&self) -> Result<usize, RegistryError> {
        let Some(timeout) = self.config.instance_timeout() else {
            return Err(RegistryError::MissingConfig(
                "SHARDREG_INSTANCE_TIMEOUT_SECS",
            ));
        };
        let policy = ReplicaPolicy {
            instance_timeout: Some(timeout),
            max_tx_lag: None,
        };
        let now = Utc::now();
        let collector = self.scan_persisted().await?;

        let mut aged = HashSet::new();
        let mut live = HashSet::new();
        for (token, state) in collector.entries() {
            let instance = &state.shard_instance;
            let cached_fresh = self
                .states
                .get(instance)
                .is_some_and(|cached| !policy.is_expired(&cached, now));
            if cached_fresh || !policy.is_expired(state, now) {
                live.insert(state.floc().clone());
                continue;
            }
            self.store
                .remove(&[self.config.store_key.as_str(), token.as_str()])
                .await?;
            aged.insert(instance.clone());
        }
        for instance in self.states.keys() {
            match self.states.get(&instance) {
                Some(state) if policy.is_expired(&state, now) => {
                    aged.insert(instance);
                }
                Some(state) => {
                    live.insert(state.floc().clone());
                }
                None => {}
            }
        }
        for instance in &aged {
            self.states.remove(instance);
            self.tokens.remove(instance);
            debug!("aged out shard instance {instance}");
        }
        self.flocs.retain(|floc| live.contains(floc));
        info!("purged {} aged out shard instances", aged.len());
        Ok(aged.len())
    }

    pub fn flocs(&self) -> FlocView {
        let mut view: FlocView = HashMap::new();
        for instance in self.states.keys() {
            let Some(state) = self.states.get(&instance) else {
                continue;
            };
            view.entry(instance.floc().clone())
                .or_default()
                .entry(instance.shard.clone())
                .or_default()
                .push(state);
        }
        view
    }

    /// Known flocs in the order they were discovered.
    pub fn known_flocs(&self) -> Vec<Floc> {
        self.flocs.snapshot()
    }

    pub fn shard_state(&self, instance: &ShardInstance) -> Option<ShardState> {
        self.states.get(instance)
    }

    pub fn is_sharded(&self) -> bool {
        self.flocs
            .snapshot()
            .iter()
            .any(|floc| floc.number_of_shards > 1)
    }
}
