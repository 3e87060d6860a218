//! Cache Entry Module
//!
//! A byte payload plus an absolute expiry timestamp.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// One cache entry. Expiry is advisory: readers treat an expired entry
/// as absent, the background sweep eventually removes it.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored payload
    pub value: Vec<u8>,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry expiring `ttl_seconds` from now.
    ///
    /// The TTL comes off the wire unchecked, so the expiry arithmetic
    /// saturates instead of overflowing; an absurdly large TTL means
    /// "effectively never expires", not a panic or a born-expired
    /// entry.
    pub fn new(value: Vec<u8>, ttl_seconds: u64) -> Self {
        Self {
            value,
            expires_at: current_timestamp_ms().saturating_add(ttl_seconds.saturating_mul(1000)),
        }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches `expires_at`.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    // == Time To Live ==
    /// Remaining TTL in milliseconds; 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new(b"payload".to_vec(), 60);

        assert_eq!(entry.value, b"payload");
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining_ms() <= 60_000);
        assert!(entry.ttl_remaining_ms() >= 59_000);
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(b"payload".to_vec(), 1);

        assert!(!entry.is_expired());
        sleep(Duration::from_millis(1100));
        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining_ms(), 0);
    }

    #[test]
    fn test_entry_huge_ttl_saturates_instead_of_wrapping() {
        // One more than u64::MAX / 1000: the millisecond conversion
        // alone would overflow
        let entry = CacheEntry::new(b"v".to_vec(), 18_446_744_073_709_552);

        assert_eq!(entry.expires_at, u64::MAX);
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining_ms() > 0);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        // Expired exactly when current time reaches expires_at
        let entry = CacheEntry {
            value: b"x".to_vec(),
            expires_at: current_timestamp_ms(),
        };
        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }
}
