//! In-memory embedding cache using moka.
//!
//! Keys are blake3 hashes of normalized text; concurrent reads are safe and
//! inserts are atomic. Hit/miss counters feed the run report's
//! cache_hit_rate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;

/// Normalized-text embedding cache.
pub struct EmbeddingCache {
    cache: Cache<String, Vec<f32>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    /// Create a new cache with the given capacity and TTL.
    pub fn new(max_entries: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();
        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get an embedding by cache key, counting the hit or miss.
    pub fn get(&self, key: &str) -> Option<Vec<f32>> {
        let value = self.cache.get(key);
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Insert an embedding keyed by normalized-text hash.
    pub fn insert(&self, key: String, embedding: Vec<f32>) {
        self.cache.insert(key, embedding);
    }

    /// Number of entries currently in the cache.
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit rate since construction, 0.0 when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// (hits, misses) since construction.
    pub fn counters(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let cache = EmbeddingCache::new(100, 3600);
        cache.insert("k1".to_string(), vec![1.0, 2.0]);
        assert_eq!(cache.get("k1"), Some(vec![1.0, 2.0]));
    }

    #[test]
    fn miss_returns_none() {
        let cache = EmbeddingCache::new(100, 3600);
        assert_eq!(cache.get("nope"), None);
    }

    #[test]
    fn hit_rate_accounts_lookups() {
        let cache = EmbeddingCache::new(100, 3600);
        cache.insert("k".to_string(), vec![1.0]);
        let _ = cache.get("k");
        let _ = cache.get("absent");
        assert!((cache.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
