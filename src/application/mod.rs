//! Application Layer
//!
//! Orchestrates the flow of events between the presentation layer (sockets)
//! and the domain and infrastructure layers (audiences, registry).

pub mod services;
