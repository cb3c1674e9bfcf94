use std::hash::Hash;

/// Concurrent key/value cache the registry keeps in front of the store.
///
/// Implementations must be safe for concurrent use; the registry never adds
/// locking of its own around cache calls.
pub trait SimpleCache<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;

    fn put(&self, key: K, value: V);

    /// Insert `value` unless the key is present. Returns the value the cache
    /// holds afterwards, which is the existing one if there was a race.
    fn put_if_absent(&self, key: K, value: V) -> V;

    fn remove(&self, key: &K) -> Option<V>;

    fn keys(&self) -> Vec<K>;

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Default [`SimpleCache`] backed by a lock-free `scc::HashMap`.
pub struct SccCache<K, V> {
    map: scc::HashMap<K, V>,
}

impl<K, V> SccCache<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            map: scc::HashMap::new(),
        }
    }
}

impl<K, V> Default for SccCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SimpleCache<K, V> for SccCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    #[inline]
    fn get(&self, key: &K) -> Option<V> {
        self.map.read(key, |_, v| v.clone())
    }

    #[inline]
    fn put(&self, key: K, value: V) {
        self.map.upsert(key, value);
    }

    fn put_if_absent(&self, key: K, value: V) -> V {
        match self.map.insert(key, value.clone()) {
            Ok(()) => value,
            Err((key, value)) => {
                self.map.read(&key, |_, v| v.clone()).unwrap_or(value)
            }
        }
    }

    fn remove(&self, key: &K) -> Option<V> {
        self.map.remove(key).map(|(_, v)| v)
    }

    fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.map.len());
        self.map.scan(|k, _| keys.push(k.clone()));
        keys
    }

    fn clear(&self) {
        self.map.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}
