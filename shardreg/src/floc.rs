use std::{
    cmp::Reverse,
    collections::BTreeSet,
    sync::atomic::{AtomicU64, Ordering},
};

use shardreg_models::{Floc, StoreRef};

/// Flocs the registry has seen, each tagged with the order it was discovered.
///
/// Safe for concurrent registration and iteration. Grows monotonically until
/// a purge.
#[derive(Default)]
pub struct KnownFlocs {
    flocs: scc::HashMap<Floc, u64>,
    seq: AtomicU64,
}

impl KnownFlocs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `floc`; a floc seen before keeps its original position.
    pub fn register(&self, floc: &Floc) -> bool {
        if self.flocs.contains(floc) {
            return false;
        }
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.flocs.insert(floc.clone(), seq).is_ok()
    }

    /// The floc covering every store in `stores` with the most shards.
    /// Equal shard counts go to the floc discovered first.
    pub fn best_match(&self, stores: &BTreeSet<StoreRef>) -> Option<Floc> {
        self.best_match_by(stores, |_| ())
    }

    /// Like [`best_match`](Self::best_match), but flocs are ranked by `rank`
    /// first; shard count and discovery order only break ties.
    pub fn best_match_by<K: Ord>(
        &self,
        stores: &BTreeSet<StoreRef>,
        mut rank: impl FnMut(&Floc) -> K,
    ) -> Option<Floc> {
        self.covering(stores)
            .into_iter()
            .map(|(floc, seq)| {
                let key = (rank(&floc), floc.number_of_shards, Reverse(seq));
                (key, floc)
            })
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, floc)| floc)
    }

    /// Flocs covering every store in `stores`, in discovery order.
    pub fn covering(&self, stores: &BTreeSet<StoreRef>) -> Vec<(Floc, u64)> {
        let mut found = Vec::new();
        self.flocs.scan(|floc, seq| {
            if floc.covers(stores) {
                found.push((floc.clone(), *seq));
            }
        });
        found.sort_by_key(|(_, seq)| *seq);
        found
    }

    /// All known flocs in discovery order.
    pub fn snapshot(&self) -> Vec<Floc> {
        let mut flocs = Vec::with_capacity(self.flocs.len());
        self.flocs.scan(|floc, seq| flocs.push((*seq, floc.clone())));
        flocs.sort_by_key(|(seq, _)| *seq);
        flocs.into_iter().map(|(_, floc)| floc).collect()
    }

    pub fn retain(&self, mut keep: impl FnMut(&Floc) -> bool) {
        self.flocs.retain(|floc, _| keep(floc));
    }

    pub fn clear(&self) {
        self.flocs.clear();
    }

    pub fn len(&self) -> usize {
        self.flocs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flocs.is_empty()
    }
}
