//! Infrastructure Layer
//!
//! Contains implementations for external and in-memory services including:
//! - Profile store clients (Redis, in-memory)
//! - The realtime connection registry and outbound queues
//! - Prometheus metrics

pub mod metrics;
pub mod profile_store;
pub mod realtime;
