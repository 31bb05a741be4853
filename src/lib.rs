//! # Feed Gateway Library
//!
//! Real-time fan-out of social feed events over WebSocket:
//! - Clients join with a profile id (and optionally a room)
//! - Every inbound event is routed by its type to a room, to the source's
//!   audience in the follow/block graph, or to one or two profiles
//! - The social graph is read from Redis (or an in-memory store)
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Events, routes, social profiles, audience resolution
//! - **Application Layer**: The dispatcher
//! - **Infrastructure Layer**: Connection registry, outbound queues, profile stores, metrics
//! - **Presentation Layer**: WebSocket transport, health and metrics endpoints
//!
//! ## Module Structure
//!
//! ```text
//! feed_gateway/
//! +-- config/         Configuration management
//! +-- domain/         Entities, routes, audience resolution
//! +-- application/    Dispatcher
//! +-- infrastructure/ Registry, queues, profile stores, metrics
//! +-- presentation/   WebSocket handler, HTTP routes, middleware
//! +-- shared/         Error types, validation helpers
//! ```

// Configuration module
pub mod config;

// Domain layer - Core rules
pub mod domain;

// Application layer - Event dispatch
pub mod application;

// Infrastructure layer - Registry and external stores
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
