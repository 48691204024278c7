// ── TTL cache ──
//
// A small time-bounded cache owned by whichever component creates it.
// Uses tokio's clock so paused-time tests can expire entries.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value, if it is younger than the TTL.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn is_fresh(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, (Instant::now(), value));
    }

    pub fn invalidate(&self, key: &K) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.insert("registry", 1);
        assert_eq!(cache.get(&"registry"), Some(1));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.is_fresh(&"registry"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&"registry"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn instances_are_independent() {
        let a = TtlCache::new(Duration::from_secs(10));
        let b: TtlCache<&str, i32> = TtlCache::new(Duration::from_secs(10));
        a.insert("k", 1);
        assert!(b.get(&"k").is_none());
        a.invalidate(&"k");
        assert!(a.get(&"k").is_none());
    }
}
