//! API Tests
//!
//! - `websocket_tests` - fan-out over real WebSocket connections
//! - `health_tests` - health and metrics endpoints
//! - `liveness_tests` - idle, slow and dead peers

mod health_tests;
mod liveness_tests;
mod websocket_tests;
