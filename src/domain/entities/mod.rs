//! # Domain Entities
//!
//! Core types of the fan-out gateway.
//!
//! - **Connection**: connection identity, liveness state and overflow policy
//! - **Event**: inbound feed events and their routing classification
//! - **Profile**: the social-graph view used for audience resolution
//!
//! ## Store Traits
//!
//! `ProfileStore` defines read access to the external profile store. It is
//! implemented in the infrastructure layer.

mod connection;
mod event;
mod profile;

pub use connection::{ConnectionId, ConnectionState, OverflowPolicy};
pub use event::{Event, EventKind, Route};
pub use profile::{ProfileStore, SocialProfile};

#[cfg(test)]
pub use profile::MockProfileStore;
