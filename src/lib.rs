//! Mesh Cache - a distributed key/value cache for gateway clusters
//!
//! Gateway nodes share transient state (rate-limit counters, session
//! markers, deduplication flags) through a best-effort, TTL-based
//! cache. Each node holds a local store and replicates writes to the
//! peers responsible for a key, resolved by rendezvous hashing.

pub mod api;
pub mod cache;
pub mod cluster;
pub mod config;
pub mod datastore;
pub mod error;
pub mod models;
pub mod remote;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use datastore::Datastore;
pub use tasks::spawn_cleanup_task;
