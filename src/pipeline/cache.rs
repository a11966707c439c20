// src/pipeline/cache.rs

//! Time-bounded cache of the last aggregation result.
//!
//! Owned by the caller of the aggregator and passed by reference; there is
//! no global cache state. Mutation requires `&mut`, so concurrent passes
//! must be serialized by whoever owns the cache.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CacheConfig, Envelope};

/// The stored envelope and when it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub envelope: Envelope,
    pub stored_at: DateTime<Utc>,
}

/// Cache state as reported by the stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheStatus {
    pub is_cached: bool,
    pub cache_timestamp: Option<DateTime<Utc>>,
    pub ttl_secs: u64,
}

/// Single-entry cache with a fixed time-to-live.
#[derive(Debug, Clone)]
pub struct ResultCache {
    ttl: Duration,
    entry: Option<CacheEntry>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The stored envelope, if still fresh.
    pub fn get(&self) -> Option<&Envelope> {
        self.get_at(Utc::now())
    }

    /// The stored envelope, if fresh as of `now`.
    pub fn get_at(&self, now: DateTime<Utc>) -> Option<&Envelope> {
        self.entry
            .as_ref()
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| &entry.envelope)
    }

    /// Store an envelope, replacing any previous entry.
    pub fn put(&mut self, envelope: Envelope) {
        self.put_at(envelope, Utc::now());
    }

    pub fn put_at(&mut self, envelope: Envelope, stored_at: DateTime<Utc>) {
        self.entry = Some(CacheEntry {
            envelope,
            stored_at,
        });
    }

    /// Drop the stored entry.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            log::debug!("Result cache invalidated");
        }
    }

    pub fn status(&self) -> CacheStatus {
        self.status_at(Utc::now())
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> CacheStatus {
        CacheStatus {
            is_cached: self.get_at(now).is_some(),
            cache_timestamp: self.entry.as_ref().map(|entry| entry.stored_at),
            ttl_secs: self.ttl.as_secs(),
        }
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        // A negative age means the clock moved backwards; treat as stale.
        (now - entry.stored_at)
            .to_std()
            .is_ok_and(|age| age < self.ttl)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn hour_cache() -> ResultCache {
        ResultCache::new(Duration::from_secs(3600))
    }

    #[test]
    fn test_empty_cache_misses() {
        let cache = hour_cache();
        assert!(cache.get().is_none());
        assert!(!cache.status().is_cached);
        assert!(cache.status().cache_timestamp.is_none());
    }

    #[test]
    fn test_fresh_entry_is_served() {
        let mut cache = hour_cache();
        let stored_at = Utc::now();
        cache.put_at(Envelope::failure("marker"), stored_at);

        let hit = cache.get_at(stored_at + TimeDelta::minutes(59)).unwrap();
        assert_eq!(hit.error.as_deref(), Some("marker"));
    }

    #[test]
    fn test_entry_expires_at_ttl() {
        let mut cache = hour_cache();
        let stored_at = Utc::now();
        cache.put_at(Envelope::failure("marker"), stored_at);

        assert!(cache.get_at(stored_at + TimeDelta::hours(1)).is_none());
        let status = cache.status_at(stored_at + TimeDelta::hours(2));
        assert!(!status.is_cached);
        assert_eq!(status.cache_timestamp, Some(stored_at));
    }

    #[test]
    fn test_entry_stale_after_clock_rollback() {
        let mut cache = hour_cache();
        let stored_at = Utc::now();
        cache.put_at(Envelope::failure("marker"), stored_at);

        assert!(cache.get_at(stored_at).is_some());
        assert!(cache.get_at(stored_at - TimeDelta::minutes(5)).is_none());
        assert!(!cache.status_at(stored_at - TimeDelta::seconds(1)).is_cached);
    }

    #[test]
    fn test_invalidate_clears_entry() {
        let mut cache = hour_cache();
        cache.put(Envelope::failure("marker"));
        assert!(cache.get().is_some());

        cache.invalidate();
        assert!(cache.get().is_none());
        assert!(cache.status().cache_timestamp.is_none());
    }

    #[test]
    fn test_put_replaces_entry() {
        let mut cache = hour_cache();
        cache.put(Envelope::failure("first"));
        cache.put(Envelope::failure("second"));
        assert_eq!(cache.get().unwrap().error.as_deref(), Some("second"));
    }

    #[test]
    fn test_from_config() {
        let cache = ResultCache::from_config(&CacheConfig { ttl_secs: 60 });
        assert_eq!(cache.ttl(), Duration::from_secs(60));
        assert_eq!(cache.status().ttl_secs, 60);
    }
}
