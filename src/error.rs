//! Error types for the distributed datastore
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cluster::ClusterNode;

// == Datastore Error Enum ==
/// Unified error type for the datastore core.
///
/// Peer-level failures (`Transport`, `Protocol`) are absorbed by the
/// remote behaviors and never reach the facade caller on their own;
/// only combined outcomes (`EmptyCluster`, `Conflict`, `PartialWrite`,
/// `AllReplicasFailed`) cross that boundary.
#[derive(Error, Debug)]
pub enum DatastoreError {
    /// Cluster membership is empty, nothing to resolve against
    #[error("Cluster membership is empty, no nodes to resolve")]
    EmptyCluster,

    /// A peer was unreachable or timed out
    #[error("Transport failure contacting {node}: {reason}")]
    Transport { node: ClusterNode, reason: String },

    /// A peer answered with a malformed or unexpected body
    #[error("Protocol failure from {node}: {reason}")]
    Protocol { node: ClusterNode, reason: String },

    /// Patch was rejected with 412; caller must re-read and retry
    #[error("Patch conflict on key '{0}'")]
    Conflict(String),

    /// Fan-out write failed to reach quorum
    #[error("Partial write: {successes}/{required} acknowledgements, {} node(s) failed", failed.len())]
    PartialWrite {
        required: usize,
        successes: usize,
        failed: Vec<ClusterNode>,
    },

    /// Serial read exhausted the replica set without one answer
    #[error("All {} replica(s) failed to answer", attempted.len())]
    AllReplicasFailed { attempted: Vec<ClusterNode> },

    /// Invalid request data (bad key, oversized value)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Local store is full and cannot accept the entry
    #[error("Cache full: {0}")]
    CacheFull(String),

    /// An invariant broke inside this process, no peer involved
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DatastoreError {
    /// True for peer-scoped failures that a behavior recovers from by
    /// moving to the next node or counting against quorum.
    pub fn is_peer_failure(&self) -> bool {
        matches!(
            self,
            DatastoreError::Transport { .. } | DatastoreError::Protocol { .. }
        )
    }

    /// The node a peer-scoped failure refers to, if any.
    pub fn failed_node(&self) -> Option<&ClusterNode> {
        match self {
            DatastoreError::Transport { node, .. } | DatastoreError::Protocol { node, .. } => {
                Some(node)
            }
            _ => None,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for DatastoreError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            DatastoreError::EmptyCluster => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            DatastoreError::Transport { .. } | DatastoreError::Protocol { .. } => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            DatastoreError::Conflict(_) => (StatusCode::PRECONDITION_FAILED, self.to_string()),
            DatastoreError::PartialWrite { .. } | DatastoreError::AllReplicasFailed { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            DatastoreError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            DatastoreError::CacheFull(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            DatastoreError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the datastore.
pub type Result<T> = std::result::Result<T, DatastoreError>;
