//! Cache Module
//!
//! The local in-process store each node consults before going remote.
//! TTL-based with lazy expiry; a background task sweeps expired
//! entries.

mod entry;
mod stats;
mod store;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
