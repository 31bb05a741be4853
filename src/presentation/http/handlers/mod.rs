//! HTTP Handlers
//!
//! Operational endpoints served beside the WebSocket listener.

pub mod health;
