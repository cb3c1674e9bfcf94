use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::StoreRef;

/// The part of a search request that decides routing: the stores it targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParameters {
    pub stores: BTreeSet<StoreRef>,
}

impl SearchParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_store(&mut self, store: StoreRef) {
        self.stores.insert(store);
    }

    pub fn with_store(mut self, store: StoreRef) -> Self {
        self.add_store(store);
        self
    }
}

impl FromIterator<StoreRef> for SearchParameters {
    fn from_iter<T: IntoIterator<Item = StoreRef>>(iter: T) -> Self {
        Self {
            stores: iter.into_iter().collect(),
        }
    }
}
