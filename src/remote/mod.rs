//! Remote Module
//!
//! The remote access protocol: commands that encode cache verbs as
//! outbound HTTP calls against peer nodes, the behaviors that decide
//! how many peers to contact and how to combine their answers, and the
//! transport seam the actual HTTP client hides behind.

mod behavior;
mod command;
mod transport;

pub use behavior::{CombinedResult, RemoteBehavior};
pub use command::{
    RemoteCommand, RemoteOutcome, REPLICATION_MARKER, REPLICATION_MARKER_VALUE, TTL_HEADER,
};
pub use transport::{HttpProxyTransport, PeerRequest, PeerResponse, ProxyTransport};
