//! # Domain Layer
//!
//! Core rules of the fan-out gateway, independent of transport and storage.
//!
//! ## Structure
//!
//! - **entities**: Connection identity, events and their routes, social profiles
//! - **services**: Audience resolution over the follow/block graph
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - The profile store is reached through the `ProfileStore` trait

pub mod entities;
pub mod services;

// Re-export commonly used types
pub use entities::*;
pub use services::*;
