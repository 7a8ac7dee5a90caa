//! Short-lived cache for market-data lookups.
//!
//! Entries are keyed by ticker. Expiry is checked on read, and a read that
//! finds a stale entry removes it. There is no background sweeper.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Cache entry with TTL
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Utc::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

pub struct TtlCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn with_ttl_secs(ttl_secs: i64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Get a cached value if present and not expired; expired entries are evicted
    pub fn get(&self, key: &str) -> Option<T> {
        {
            let cache = self.entries.read().ok()?;
            match cache.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired() => return Some(entry.data.clone()),
                Some(_) => {}
            }
        }

        if let Ok(mut cache) = self.entries.write() {
            // Re-check: a writer may have refreshed the entry in between.
            if cache.get(key).is_some_and(|entry| entry.is_expired()) {
                cache.remove(key);
            }
        }
        None
    }

    pub fn insert(&self, key: &str, value: T) {
        let entry = CacheEntry::new(value, self.ttl);

        if let Ok(mut cache) = self.entries.write() {
            cache.insert(key.to_string(), entry);
        }
    }

    /// Number of stored entries, including expired ones not yet read
    pub fn len(&self) -> usize {
        self.entries.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_window() {
        let cache = TtlCache::with_ttl_secs(300);
        cache.insert("NVDA", 42.0_f64);

        assert_eq!(cache.get("NVDA"), Some(42.0));
        assert_eq!(cache.get("AAPL"), None);
    }

    #[test]
    fn test_zero_ttl_is_always_expired() {
        let cache = TtlCache::with_ttl_secs(0);
        cache.insert("NVDA", 1u32);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("NVDA"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_expired_read_evicts_only_that_key() {
        let cache = TtlCache::with_ttl_secs(300);
        cache.insert("NVDA", 1u32);
        cache.insert("AAPL", 2u32);
        if let Ok(mut entries) = cache.entries.write() {
            if let Some(entry) = entries.get_mut("NVDA") {
                entry.expires_at = Utc::now() - Duration::seconds(1);
            }
        }

        assert_eq!(cache.get("NVDA"), None);
        assert_eq!(cache.get("AAPL"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_replaces_entry() {
        let cache = TtlCache::with_ttl_secs(300);
        assert!(cache.is_empty());

        cache.insert("TSLA", "old".to_string());
        cache.insert("TSLA", "new".to_string());

        assert_eq!(cache.get("TSLA").as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
    }
}
