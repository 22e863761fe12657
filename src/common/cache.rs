use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// Cross-job cache keyed by immutable version identifiers.
///
/// Jobs running in parallel share one instance through the scheduler. Entries
/// are handed out as `Arc` clones, so an entry's referent stays alive for as
/// long as a job holds it even if the entry is evicted in the meantime.
#[derive(Debug)]
pub struct SharedCache<K, V> {
    entries: Mutex<HashMap<K, Arc<V>>>,
}

impl<K: Eq + Hash + Clone, V> SharedCache<K, V> {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Look up `key`, computing and inserting the value on a miss.
    pub fn lock_and_access<F>(&self, key: &K, compute: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        let mut entries = self.entries.lock().expect("shared cache poisoned");
        if let Some(existing) = entries.get(key) {
            return Arc::clone(existing);
        }
        let value = Arc::new(compute());
        entries.insert(key.clone(), Arc::clone(&value));
        value
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.lock().expect("shared cache poisoned").get(key).map(Arc::clone)
    }

    pub fn evict(&self, key: &K) -> Option<Arc<V>> {
        self.entries.lock().expect("shared cache poisoned").remove(key)
    }
}

impl<K: Eq + Hash + Clone, V> Default for SharedCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
