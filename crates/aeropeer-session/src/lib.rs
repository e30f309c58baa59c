//! Session validity cache for the aeropeer request gate.
//!
//! This crate provides a process-local, time-bounded map from session
//! id to last-known validity:
//! - entries stop being trusted once their age reaches the TTL
//! - eviction is purely TTL-based, swept opportunistically on insert
//!   once the entry count passes a ceiling
//! - no persistence; the cache resets with the process
//!
//! # Example
//!
//! ```rust,ignore
//! use aeropeer_session::{CacheConfig, ValidityCache};
//!
//! let config = CacheConfig::new()
//!     .with_ttl(Duration::from_secs(30))
//!     .with_max_entries(1000);
//!
//! let cache = ValidityCache::new(config);
//! ```

mod cache;
mod config;

pub use cache::{CacheEntry, CacheStats, ValidityCache};
pub use config::{CacheConfig, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
