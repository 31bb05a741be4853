//! WebSocket Transport
//!
//! Accepts client sockets, decodes inbound events and writes fanned-out frames.

pub mod handler;
pub mod messages;
pub mod session;

pub use handler::ws_handler;
pub use messages::decode_frame;
pub use session::SessionState;
