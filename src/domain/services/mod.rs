//! # Domain Services
//!
//! Domain services encapsulate business rules that don't belong to a single
//! entity.
//!
//! ## Services
//!
//! - **AudienceResolver**: who may receive an event, given the follow/block graph

mod audience_service;

pub use audience_service::*;
