//! API Module
//!
//! HTTP handlers and routing for one datastore node.
//!
//! # Endpoints
//! - `GET /cache/:key` - Fetch a cache object (200 or 404)
//! - `PUT /cache/:key` - Store a cache object (201), TTL via `x-ttl`
//! - `DELETE /cache/:key` - Remove a cache object (202)
//! - `PATCH /cache/:key` - Apply a counter delta (200, 412 on conflict)
//! - `GET /stats` - Local store statistics
//! - `GET /health` - Health check endpoint
//!
//! Requests carrying the replication marker header are served from the
//! local store only; everything else goes through the datastore facade
//! and replicates to peers.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
