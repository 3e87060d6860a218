//! Remote Command Module
//!
//! One command per cache verb. A command builds the HTTP request for a
//! single peer and decodes that peer's response; the verbs form a
//! closed set, so they live in one enum rather than one type each.

use crate::cluster::ClusterNode;
use crate::error::{DatastoreError, Result};
use crate::remote::transport::{PeerRequest, PeerResponse};

// == Wire Constants ==
/// Marker header identifying inter-node replication traffic. A peer
/// receiving it serves the request locally and never re-replicates,
/// which is what keeps forwarding loops from forming.
pub const REPLICATION_MARKER: &str = "x-datastore-origin";

/// Marker header value for node-originated traffic.
pub const REPLICATION_MARKER_VALUE: &str = "node";

/// Header carrying the TTL in seconds on Put requests.
pub const TTL_HEADER: &str = "x-ttl";

// == Remote Command ==
/// Immutable descriptor of one cache verb against one key.
///
/// Commands are constructed per operation, shared freely across the
/// concurrent peer calls a behavior issues, and discarded afterwards.
#[derive(Debug, Clone)]
pub enum RemoteCommand {
    /// Fetch the value stored under a key
    Get { key: String },
    /// Store a value under a key for `ttl_seconds`
    Put {
        key: String,
        value: Vec<u8>,
        ttl_seconds: u64,
    },
    /// Remove the value stored under a key
    Delete { key: String },
    /// Apply a signed delta to the counter stored under a key
    Patch { key: String, delta: i64 },
}

// == Remote Outcome ==
/// A peer's decoded, well-formed answer to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// Get hit: the stored value
    Value(Vec<u8>),
    /// Get miss: the peer answered, the key is absent
    Miss,
    /// Put/Delete acknowledgement (false is a valid negative answer)
    Acknowledged(bool),
    /// Patch result: the updated counter value
    Counter(i64),
}

impl RemoteOutcome {
    /// True when the answer counts toward a quorum of successes, as
    /// opposed to merely being well-formed.
    pub fn is_positive(&self) -> bool {
        match self {
            RemoteOutcome::Value(_) => true,
            RemoteOutcome::Miss => false,
            RemoteOutcome::Acknowledged(ok) => *ok,
            RemoteOutcome::Counter(_) => true,
        }
    }
}

impl RemoteCommand {
    /// The key this command operates on.
    pub fn key(&self) -> &str {
        match self {
            RemoteCommand::Get { key }
            | RemoteCommand::Put { key, .. }
            | RemoteCommand::Delete { key }
            | RemoteCommand::Patch { key, .. } => key,
        }
    }

    // == Request Construction ==
    /// Builds the HTTP request this command sends to a peer. Every
    /// request carries the replication marker.
    pub fn request(&self) -> PeerRequest {
        let mut headers = vec![(REPLICATION_MARKER, REPLICATION_MARKER_VALUE.to_string())];
        let path = format!("/cache/{}", self.key());

        match self {
            RemoteCommand::Get { .. } => PeerRequest {
                method: "GET",
                path,
                headers,
                body: None,
            },
            RemoteCommand::Put {
                value, ttl_seconds, ..
            } => {
                headers.push((TTL_HEADER, ttl_seconds.to_string()));
                PeerRequest {
                    method: "PUT",
                    path,
                    headers,
                    body: Some(value.clone()),
                }
            }
            RemoteCommand::Delete { .. } => PeerRequest {
                method: "DELETE",
                path,
                headers,
                body: None,
            },
            RemoteCommand::Patch { delta, .. } => PeerRequest {
                method: "PATCH",
                path,
                headers,
                body: Some(delta.to_string().into_bytes()),
            },
        }
    }

    // == Response Decoding ==
    /// Decodes one peer's response. Pure: no I/O happens here.
    ///
    /// Transport failures never reach this method; what arrives is a
    /// completed round trip whose status and body are interpreted per
    /// verb. Unexpected statuses and malformed bodies decode to
    /// `Protocol` errors, which behaviors aggregate like transport
    /// failures.
    pub fn decode(&self, node: &ClusterNode, response: &PeerResponse) -> Result<RemoteOutcome> {
        match self {
            RemoteCommand::Get { .. } => match response.status {
                200 => Ok(RemoteOutcome::Value(response.body.clone())),
                404 => Ok(RemoteOutcome::Miss),
                status => Err(protocol(node, format!("unexpected status {} for GET", status))),
            },
            // Peers are observed to answer either 200 or 201 for a
            // stored value; both are accepted.
            RemoteCommand::Put { .. } => {
                Ok(RemoteOutcome::Acknowledged(matches!(response.status, 200 | 201)))
            }
            // Delete succeeds only on 202 Accepted; anything else is a
            // well-formed negative answer, not an error.
            RemoteCommand::Delete { .. } => {
                Ok(RemoteOutcome::Acknowledged(response.status == 202))
            }
            RemoteCommand::Patch { key, .. } => match response.status {
                200 => {
                    let counter = std::str::from_utf8(&response.body)
                        .ok()
                        .and_then(|s| s.trim().parse::<i64>().ok())
                        .ok_or_else(|| {
                            protocol(node, "non-numeric counter body for PATCH".to_string())
                        })?;
                    Ok(RemoteOutcome::Counter(counter))
                }
                412 => Err(DatastoreError::Conflict(key.clone())),
                status => Err(protocol(
                    node,
                    format!("unexpected status {} for PATCH", status),
                )),
            },
        }
    }
}

fn protocol(node: &ClusterNode, reason: String) -> DatastoreError {
    DatastoreError::Protocol {
        node: node.clone(),
        reason,
    }
}
