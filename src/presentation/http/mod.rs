//! HTTP Routing
//!
//! Router for the WebSocket endpoints plus health and metrics.

pub mod handlers;
pub mod routes;

pub use routes::create_router;
