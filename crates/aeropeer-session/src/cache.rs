//! Process-local validity cache with TTL-based staleness.
//!
//! Entries age from the moment the store last answered for a session,
//! not from the last read: `get` never refreshes a timestamp, and a
//! fresh `put` always overwrites rather than merges. There is no
//! recency ordering; eviction is purely TTL-based and runs as an
//! opportunistic full scan once the entry count passes the ceiling.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::config::CacheConfig;

/// A single cached validity decision.
#[derive(Debug, Clone, Copy)]
pub struct CacheEntry {
    /// Last-known validity of the session.
    pub valid: bool,

    /// When the store last answered for this session.
    pub checked_at: Instant,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    pub fn new(valid: bool) -> Self {
        Self {
            valid,
            checked_at: Instant::now(),
        }
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    /// Current number of entries, stale ones included.
    pub size: usize,

    /// Entry ceiling before pruning fires.
    pub max_entries: usize,
}

/// Time-bounded map from session id to last-known validity.
///
/// The cache is process-scoped shared state: cloning is cheap and all
/// clones view the same entries. It holds no persistence and resets on
/// process restart; the worst case after a restart is one extra store
/// round trip per session.
pub struct ValidityCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    config: CacheConfig,
}

impl ValidityCache {
    /// Create an empty cache.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a session's last-known validity.
    ///
    /// Returns `None` when no entry exists or the entry's age has
    /// reached the TTL. Stale entries are left in place; removal
    /// happens lazily during the next prune pass.
    pub async fn get(&self, session_id: &str) -> Option<CacheEntry> {
        let entries = self.entries.read().await;
        match entries.get(session_id) {
            Some(entry) if entry.checked_at.elapsed() < self.config.ttl => {
                trace!(session_id = %session_id, valid = entry.valid, "Validity cache hit");
                Some(*entry)
            }
            Some(_) => {
                trace!(session_id = %session_id, "Validity cache entry stale");
                None
            }
            None => None,
        }
    }

    /// Record a validator decision, overwriting any previous entry.
    ///
    /// When the insert pushes the cache past its ceiling, a prune pass
    /// runs in the same critical section.
    pub async fn put(&self, session_id: &str, valid: bool) {
        let mut entries = self.entries.write().await;
        entries.insert(session_id.to_string(), CacheEntry::new(valid));

        trace!(
            session_id = %session_id,
            valid = valid,
            cache_size = entries.len(),
            "Validity cached"
        );

        if entries.len() > self.config.max_entries {
            Self::prune_locked(&mut entries, &self.config);
        }
    }

    /// Remove the entry for a session, returning it if present.
    ///
    /// Used when the store confirms a revocation: the entry must go
    /// before the response is sent so a stale positive cannot re-admit
    /// the session within the TTL window.
    pub async fn remove(&self, session_id: &str) -> Option<CacheEntry> {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(session_id);
        if removed.is_some() {
            debug!(session_id = %session_id, "Validity cache entry removed");
        }
        removed
    }

    /// Evict stale entries if the cache has grown past its ceiling.
    ///
    /// A no-op below the ceiling. Returns the number of evicted
    /// entries. This is the only eviction mechanism; it runs on insert
    /// rather than on a background timer.
    pub async fn prune(&self) -> usize {
        let mut entries = self.entries.write().await;
        Self::prune_locked(&mut entries, &self.config)
    }

    fn prune_locked(entries: &mut HashMap<String, CacheEntry>, config: &CacheConfig) -> usize {
        if entries.len() <= config.max_entries {
            return 0;
        }

        let before = entries.len();
        entries.retain(|_, entry| entry.checked_at.elapsed() < config.ttl);
        let evicted = before - entries.len();

        if evicted > 0 {
            debug!(
                evicted = evicted,
                cache_size = entries.len(),
                "Pruned stale validity entries"
            );
        }

        evicted
    }

    /// Current number of entries, stale ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.read().await.len(),
            max_entries: self.config.max_entries,
        }
    }
}

impl Clone for ValidityCache {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            config: self.config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_put_and_get() {
        let cache = ValidityCache::new(CacheConfig::new());

        cache.put("session-1", true).await;

        let entry = cache.get("session-1").await.unwrap();
        assert!(entry.valid);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let cache = ValidityCache::new(CacheConfig::new());
        assert!(cache.get("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn test_stale_entry_behaves_as_absent() {
        let config = CacheConfig::new().with_ttl(Duration::from_millis(50));
        let cache = ValidityCache::new(config);

        cache.put("session-1", true).await;
        assert!(cache.get("session-1").await.is_some());

        sleep(Duration::from_millis(80)).await;

        // Past the TTL the entry must not be trusted
        assert!(cache.get("session-1").await.is_none());
        // But it has not been physically removed
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = ValidityCache::new(CacheConfig::new());

        cache.put("session-1", true).await;
        cache.put("session-1", false).await;

        let entry = cache.get("session-1").await.unwrap();
        assert!(!entry.valid);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let cache = ValidityCache::new(CacheConfig::new());

        cache.put("session-1", true).await;
        let removed = cache.remove("session-1").await;

        assert!(removed.is_some());
        assert!(cache.get("session-1").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_missing() {
        let cache = ValidityCache::new(CacheConfig::new());
        assert!(cache.remove("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn test_prune_noop_below_ceiling() {
        let config = CacheConfig::new()
            .with_ttl(Duration::from_millis(10))
            .with_max_entries(100);
        let cache = ValidityCache::new(config);

        for i in 0..10 {
            cache.put(&format!("session-{i}"), true).await;
        }

        sleep(Duration::from_millis(30)).await;

        // All entries are stale, but the ceiling was never crossed
        assert_eq!(cache.prune().await, 0);
        assert_eq!(cache.len().await, 10);
    }

    #[tokio::test]
    async fn test_insert_past_ceiling_prunes_stale_entries() {
        let config = CacheConfig::new()
            .with_ttl(Duration::from_millis(50))
            .with_max_entries(5);
        let cache = ValidityCache::new(config);

        for i in 0..5 {
            cache.put(&format!("stale-{i}"), true).await;
        }
        sleep(Duration::from_millis(80)).await;

        // Sixth insert crosses the ceiling and sweeps the stale five
        cache.put("fresh", true).await;

        assert_eq!(cache.len().await, 1);
        assert!(cache.get("fresh").await.is_some());
    }

    #[tokio::test]
    async fn test_prune_keeps_fresh_entries() {
        let config = CacheConfig::new()
            .with_ttl(Duration::from_millis(100))
            .with_max_entries(3);
        let cache = ValidityCache::new(config);

        cache.put("a", true).await;
        cache.put("b", false).await;
        cache.put("c", true).await;
        cache.put("d", true).await;

        // Ceiling crossed but nothing is stale yet, so nothing goes
        assert_eq!(cache.len().await, 4);
        assert!(cache.get("a").await.is_some());
        assert!(cache.get("d").await.is_some());
    }

    #[tokio::test]
    async fn test_shared_view_across_clones() {
        let cache = ValidityCache::new(CacheConfig::new());
        let clone = cache.clone();

        cache.put("session-1", true).await;

        assert!(clone.get("session-1").await.is_some());
    }

    #[tokio::test]
    async fn test_stats() {
        let config = CacheConfig::new().with_max_entries(500);
        let cache = ValidityCache::new(config);

        cache.put("session-1", true).await;
        cache.put("session-2", false).await;

        let stats = cache.stats().await;
        assert_eq!(stats.size, 2);
        assert_eq!(stats.max_entries, 500);
    }
}
