//! Background Tasks Module
//!
//! Contains background tasks that run periodically during node
//! operation.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired local entries at configured intervals

mod cleanup;

pub use cleanup::spawn_cleanup_task;
