use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// Callback receiving entries that leave the map without being replaced.
pub type EvictFn<K, V> = Box<dyn Fn(K, V) + Send + Sync>;

/// Thread-safe bounded map with least-recently-used eviction.
///
/// Reads and writes both refresh recency. Every operation runs under one short synchronous
/// critical section, so a mutation is never observed half-done. The eviction callback runs after
/// the lock is released.
pub struct BoundedLru<K, V> {
    inner: Mutex<LruCache<K, V>>,
    on_evict: Option<EvictFn<K, V>>,
}

impl<K, V> BoundedLru<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create an empty map holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            on_evict: None,
        }
    }

    /// Install a callback for capacity evictions and entries rejected by [`Self::get_if`].
    pub fn with_eviction(mut self, on_evict: impl Fn(K, V) + Send + Sync + 'static) -> Self {
        self.on_evict = Some(Box::new(on_evict));
        self
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up `key` and mark it most-recently-used.
    #[cfg(test)]
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_if(key, |_| true)
    }

    /// Look up `key`, keeping the entry only if `keep` accepts it.
    ///
    /// An accepted entry is promoted and cloned out. A rejected entry is removed and passed to the
    /// eviction callback; the lookup then behaves as a miss.
    pub fn get_if(&self, key: &K, keep: impl FnOnce(&V) -> bool) -> Option<V> {
        let rejected = {
            let mut guard = self.inner.lock();
            let accepted = match guard.get(key) {
                None => return None,
                Some(v) => keep(v).then(|| v.clone()),
            };
            if accepted.is_some() {
                return accepted;
            }
            guard.pop_entry(key)
        };

        if let Some((k, v)) = rejected {
            self.evicted(k, v);
        }
        None
    }

    /// Insert or overwrite `key` as most-recently-used.
    ///
    /// Returns the value previously stored under `key`, if any. When the insert pushes the map
    /// past capacity, the least-recently-used entry goes to the eviction callback.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let displaced = self.inner.lock().push(key.clone(), value);
        match displaced {
            Some((k, old)) if k == key => Some(old),
            Some((k, old)) => {
                self.evicted(k, old);
                None
            }
            None => None,
        }
    }

    /// Keys from most- to least-recently-used.
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().iter().map(|(k, _)| k.clone()).collect()
    }

    fn evicted(&self, key: K, value: V) {
        if let Some(f) = self.on_evict.as_ref() {
            f(key, value);
        }
    }
}

impl<K: Hash + Eq, V> std::fmt::Debug for BoundedLru<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.inner.lock();
        f.debug_struct("BoundedLru")
            .field("len", &guard.len())
            .field("capacity", &guard.cap())
            .field("has_eviction_callback", &self.on_evict.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/lru.rs"]
mod tests;
