//! Cluster Node Module
//!
//! Identity of a peer gateway instance.

use std::fmt;

use serde::{Deserialize, Serialize};

// == Cluster Node ==
/// Identity of one peer gateway node.
///
/// Membership snapshots are plain `Vec<ClusterNode>` values; two nodes
/// are the same peer iff host and port match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterNode {
    /// Hostname or IP address of the peer
    pub host: String,
    /// HTTP port the peer's datastore listens on
    pub port: u16,
}

impl ClusterNode {
    // == Constructor ==
    /// Creates a new node identity.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    // == Base URL ==
    /// Base URL for HTTP calls against this peer.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    // == Parse ==
    /// Parses a `host:port` pair, as found in the `CLUSTER_PEERS`
    /// environment variable.
    ///
    /// Returns None for entries without a valid port.
    pub fn parse(spec: &str) -> Option<Self> {
        let (host, port) = spec.rsplit_once(':')?;
        if host.is_empty() {
            return None;
        }
        let port = port.parse().ok()?;
        Some(Self::new(host, port))
    }
}

impl fmt::Display for ClusterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_display() {
        let node = ClusterNode::new("10.0.0.5", 9090);
        assert_eq!(node.to_string(), "10.0.0.5:9090");
    }

    #[test]
    fn test_node_base_url() {
        let node = ClusterNode::new("cache-2", 8080);
        assert_eq!(node.base_url(), "http://cache-2:8080");
    }

    #[test]
    fn test_parse_valid_spec() {
        let node = ClusterNode::parse("cache-1:8080").unwrap();
        assert_eq!(node, ClusterNode::new("cache-1", 8080));
    }

    #[test]
    fn test_parse_rejects_missing_port() {
        assert!(ClusterNode::parse("cache-1").is_none());
        assert!(ClusterNode::parse("cache-1:").is_none());
        assert!(ClusterNode::parse(":8080").is_none());
        assert!(ClusterNode::parse("cache-1:notaport").is_none());
    }

    #[test]
    fn test_parse_ipv6_uses_last_colon() {
        // rsplit_once keeps everything before the final colon as host
        let node = ClusterNode::parse("::1:8080").unwrap();
        assert_eq!(node.host, "::1");
        assert_eq!(node.port, 8080);
    }
}
