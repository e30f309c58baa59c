//! Configuration for the validity cache.

use std::time::Duration;

/// Default time-to-live for a cached validity result (30 seconds).
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Default entry ceiling before a prune pass fires.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Configuration for the validity cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum age at which a cached validity result is still trusted.
    /// Entries at or past this age behave as absent.
    pub ttl: Duration,

    /// Entry ceiling. When an insert pushes the cache past this count,
    /// a full prune pass removes every stale entry.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TTL for cached validity results.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the entry ceiling that triggers pruning.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }
}
