use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::RngExt;
use tokio::time::Instant;

struct StoredEntry<V> {
    value: V,
    expires_at: Instant,
}

/// In-memory key/value cache with a per-entry time-to-live.
///
/// Entries live for the lifetime of the process only.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, StoredEntry<V>>>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Debug, V: Clone> TtlCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, StoredEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a value with a time-to-live (TTL).
    /// Expired entries under other keys are dropped on the way.
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub fn put(&self, key: K, value: V, ttl: Duration) {
        let now = Instant::now();
        let Some(expires_at) = now.checked_add(ttl) else {
            tracing::warn!("TTL overflow, not caching");
            return;
        };

        let mut entries = self.entries();
        entries.retain(|_, entry| now < entry.expires_at);
        entries.insert(key, StoredEntry { value, expires_at });
        tracing::debug!(entries = entries.len(), "Stored entry");
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries();

        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => {
                tracing::debug!("Key found and still fresh");
                Some(entry.value.clone())
            }
            Some(_) => {
                tracing::debug!("Key found but expired");
                entries.remove(key);
                None
            }
            None => {
                tracing::debug!("Key not found");
                None
            }
        }
    }
}

/// Spread a TTL by ±10% so entries written together do not expire together.
pub fn jittered(ttl: Duration) -> Duration {
    let jitter: f64 = rand::rng().random_range(0.9..1.1);
    ttl.mul_f64(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_is_returned() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.put("london".to_string(), 7, Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get(&"london".to_string()), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_evicted() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.put("london".to_string(), 7, Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get(&"london".to_string()), None);
        assert!(cache.entries().is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_keeps_one_entry() {
        let cache: TtlCache<&str, &str> = TtlCache::new();
        cache.put("k", "old", Duration::from_secs(60));
        cache.put("k", "new", Duration::from_secs(60));
        assert_eq!(cache.get(&"k"), Some("new"));
        assert_eq!(cache.entries().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_drops_expired_entries_never_read_again() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        for i in 0..500 {
            cache.put(format!("city {i}"), i, Duration::from_secs(60));
        }
        assert_eq!(cache.entries().len(), 500);

        tokio::time::advance(Duration::from_secs(61)).await;
        cache.put("lisbon".to_string(), 1, Duration::from_secs(60));

        assert_eq!(cache.entries().len(), 1);
        assert_eq!(cache.get(&"lisbon".to_string()), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_keeps_fresh_entries() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.put("short".to_string(), 1, Duration::from_secs(10));
        cache.put("long".to_string(), 2, Duration::from_secs(600));

        tokio::time::advance(Duration::from_secs(11)).await;
        cache.put("new".to_string(), 3, Duration::from_secs(60));

        assert_eq!(cache.entries().len(), 2);
        assert_eq!(cache.get(&"long".to_string()), Some(2));
    }

    #[test]
    fn test_jitter_stays_within_ten_percent() {
        let ttl = Duration::from_secs(600);
        for _ in 0..100 {
            let spread = jittered(ttl);
            assert!(spread >= Duration::from_secs(540));
            assert!(spread <= Duration::from_secs(660));
        }
    }
}
