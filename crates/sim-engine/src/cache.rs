//! Injected TTL cache abstraction.
//!
//! A plain keyed store with a timestamp per entry. Staleness beyond the
//! TTL forces recomputation on next access (lazy invalidation); there is
//! no background sweep. Owned and injected by the process so a
//! multi-instance deployment can swap in a shared store without touching
//! the engines.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<V> {
    stored_at: Instant,
    value: V,
}

/// Time-bounded keyed cache. TTL expiry is the only invalidation path.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    /// Drop one entry eagerly (used when a purchase must be visible
    /// before the TTL lapses).
    pub fn invalidate(&self, key: &K) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
    }

    pub(crate) fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if now.duration_since(entry.stored_at) < self.ttl => {
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub(crate) fn insert_at(&self, key: K, value: V, now: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, Entry { stored_at: now, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_served() {
        let cache: TtlCache<i64, u8> = TtlCache::new(Duration::from_secs(60));
        let t = Instant::now();
        cache.insert_at(1, 42, t);
        assert_eq!(cache.get_at(&1, t + Duration::from_secs(59)), Some(42));
    }

    #[test]
    fn stale_entry_is_purged_lazily() {
        let cache: TtlCache<i64, u8> = TtlCache::new(Duration::from_secs(60));
        let t = Instant::now();
        cache.insert_at(1, 42, t);
        assert_eq!(cache.get_at(&1, t + Duration::from_secs(60)), None);
        // The stale entry is gone, not just hidden.
        assert_eq!(cache.get_at(&1, t), None);
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache: TtlCache<&str, String> = TtlCache::new(Duration::from_secs(60));
        cache.insert("rep", "100".to_string());
        cache.invalidate(&"rep");
        assert_eq!(cache.get(&"rep"), None);
    }
}
