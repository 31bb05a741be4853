//! Realtime Fan-out Infrastructure
//!
//! In-memory state behind the WebSocket gateway:
//! - `ConnectionRegistry`: joined connections, matched by room or profile
//! - `OutboundQueue`: bounded per-connection frame queue with overflow policy
//!
//! Nothing here is persisted; a restart starts from an empty registry.

mod outbound;
mod registry;

pub use outbound::{Delivery, OutboundQueue};
pub use registry::{ConnectionEntry, ConnectionRegistry};
