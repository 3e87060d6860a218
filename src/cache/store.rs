//! Cache Store Module
//!
//! Local HashMap-backed store with TTL expiry. Every node consults this
//! store before reaching for peers; remote writes are written through
//! into it.

use std::collections::HashMap;

use crate::cache::{CacheEntry, CacheStats, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::{DatastoreError, Result};

// == Cache Store ==
/// Local key/value store with TTL support and a size cap.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Default TTL in seconds for entries without explicit TTL
    default_ttl: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
        }
    }

    /// Default TTL in seconds applied when a write carries none.
    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    // == Get ==
    /// Retrieves the entry for a key, treating expired entries as
    /// absent (and removing them on the way out).
    pub fn get(&mut self, key: &str) -> Option<CacheEntry> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(key);
                self.stats.set_total_entries(self.entries.len());
                self.stats.record_miss();
                None
            }
            Some(entry) => {
                let entry = entry.clone();
                self.stats.record_hit();
                Some(entry)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Stores an entry, replacing any previous one for the key.
    ///
    /// If the store is at capacity, expired entries are swept first; a
    /// store that is still full rejects the write.
    pub fn put(&mut self, key: String, value: Vec<u8>, ttl_seconds: Option<u64>) -> Result<()> {
        self.validate(&key, &value)?;

        let ttl = ttl_seconds.unwrap_or(self.default_ttl);
        self.insert(key, CacheEntry::new(value, ttl))
    }

    fn insert(&mut self, key: String, entry: CacheEntry) -> Result<()> {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.cleanup_expired();
            if self.entries.len() >= self.max_entries {
                return Err(DatastoreError::CacheFull(format!(
                    "Store holds {} entries, cannot insert '{}'",
                    self.entries.len(),
                    key
                )));
            }
        }

        self.entries.insert(key, entry);
        self.stats.set_total_entries(self.entries.len());
        Ok(())
    }

    fn validate(&self, key: &str, value: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(DatastoreError::InvalidRequest(
                "Key cannot be empty".to_string(),
            ));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(DatastoreError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(DatastoreError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }
        Ok(())
    }

    // == Invalidate ==
    /// Removes an entry. Returns true if an entry was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Patch Counter ==
    /// Applies a signed delta to the decimal counter stored under
    /// `key`, creating it from zero when absent or expired, and
    /// returns the resulting value.
    ///
    /// Runs entirely under the store's exclusive borrow, so concurrent
    /// increments routed to the same node never lose updates.
    ///
    /// # Errors
    /// `Conflict` when the existing value is not a decimal counter.
    pub fn patch_counter(&mut self, key: &str, delta: i64, ttl_seconds: Option<u64>) -> Result<i64> {
        let current = match self.entries.get(key) {
            Some(entry) if entry.is_expired() => 0,
            Some(entry) => std::str::from_utf8(&entry.value)
                .ok()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .ok_or_else(|| DatastoreError::Conflict(key.to_string()))?,
            None => 0,
        };

        let updated = current + delta;
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);
        self.insert(key.to_string(), CacheEntry::new(updated.to_string().into_bytes(), ttl))?;
        Ok(updated)
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        self.stats.set_total_entries(self.entries.len());
        before - self.entries.len()
    }

    // == Length ==
    /// Returns the current number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
