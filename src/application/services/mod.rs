//! Application Services
//!
//! ## Available Services
//!
//! - **Dispatcher**: Routes inbound events to the connections that should see them

pub mod dispatch_service;

pub use dispatch_service::{
    BroadcastReport, ConnectionHandle, DispatchOutcome, Dispatcher, SkipReason,
};
