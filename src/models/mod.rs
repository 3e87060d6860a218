//! Response models for the admin endpoints
//!
//! The peer wire protocol itself moves raw bytes and headers; only the
//! health and stats endpoints speak JSON.

pub mod responses;

pub use responses::{ErrorResponse, HealthResponse, StatsResponse};
