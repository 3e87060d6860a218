//! Configuration Module
//!
//! Handles loading and managing node configuration from environment
//! variables.

use std::env;

use crate::cluster::ClusterNode;

/// Node configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the local store can hold
    pub max_entries: usize,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// How many peers hold a copy of each key
    pub replication_factor: usize,
    /// Positive peer acknowledgements required for a write to succeed
    pub quorum_size: usize,
    /// Timeout in milliseconds for one HTTP call to one peer
    pub per_call_timeout_ms: u64,
    /// Peer nodes forming the cluster, excluding this node
    pub peers: Vec<ClusterNode>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum local store entries (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `REPLICATION_FACTOR` - Replicas per key (default: 2)
    /// - `QUORUM_SIZE` - Acknowledgements per write (default: 2)
    /// - `PER_CALL_TIMEOUT_MS` - Per-peer call timeout (default: 2000)
    /// - `CLUSTER_PEERS` - Comma-separated `host:port` peer list
    pub fn from_env() -> Self {
        Self {
            max_entries: env_or("MAX_ENTRIES", 1000),
            default_ttl: env_or("DEFAULT_TTL", 300),
            server_port: env_or("SERVER_PORT", 3000),
            cleanup_interval: env_or("CLEANUP_INTERVAL", 1),
            replication_factor: env_or("REPLICATION_FACTOR", 2),
            quorum_size: env_or("QUORUM_SIZE", 2),
            per_call_timeout_ms: env_or("PER_CALL_TIMEOUT_MS", 2000),
            peers: parse_peers(&env::var("CLUSTER_PEERS").unwrap_or_default()),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses a comma-separated `host:port` list, skipping malformed
/// entries.
pub fn parse_peers(spec: &str) -> Vec<ClusterNode> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(ClusterNode::parse)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: 300,
            server_port: 3000,
            cleanup_interval: 1,
            replication_factor: 2,
            quorum_size: 2,
            per_call_timeout_ms: 2000,
            peers: Vec::new(),
        }
    }
}
