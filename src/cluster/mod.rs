//! Cluster Module
//!
//! Node identity, membership snapshots and key-to-node resolution.
//!
//! Membership is supplied per call as a read-only snapshot; an external
//! discovery mechanism keeps it current. Nothing in here holds cluster
//! state between operations.

mod node;
mod resolver;

pub use node::ClusterNode;
pub use resolver::{resolve, ReplicaSet};
