use serde::Deserialize;
use serde_json::Value;
use shardreg_models::{Floc, ShardInstance, ShardState};
use tracing::warn;

/// Accumulates the shard states found by a full scan of the store.
#[derive(Default, Debug)]
pub struct ShardStateCollector {
    states: Vec<(String, ShardState)>,
    skipped: usize,
}

impl ShardStateCollector {
    /// Visit one persisted record. Records under other key shapes or with a
    /// value that is not a shard state are skipped.
    pub fn handle_record(
        &mut self,
        id: u64,
        key: &[String],
        value: &Value,
    ) -> bool {
        let Some(token) = key.get(1) else {
            warn!("record {id} has no instance token in key {key:?}, skipping");
            self.skipped += 1;
            return true;
        };
        match ShardState::deserialize(value) {
            Ok(state) => self.states.push((token.clone(), state)),
            Err(e) => {
                warn!("record {id} ({token}) is not a shard state: {e}");
                self.skipped += 1;
            }
        }
        true
    }

    pub fn tokens(&self) -> impl Iterator<Item = (&ShardInstance, &String)> {
        self.states
            .iter()
            .map(|(token, state)| (&state.shard_instance, token))
    }

    pub fn states(&self) -> impl Iterator<Item = &ShardState> {
        self.states.iter().map(|(_, state)| state)
    }

    pub fn states_for<'a>(
        &'a self,
        floc: &'a Floc,
    ) -> impl Iterator<Item = &'a ShardState> + 'a {
        self.states().filter(move |state| state.floc() == floc)
    }

    /// Persisted records as `(token, state)` pairs.
    pub fn entries(&self) -> &[(String, ShardState)] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
