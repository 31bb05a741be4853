//! Profile Store Module
//!
//! Implementations of the `ProfileStore` trait and their construction.
//!
//! This module provides:
//! - Redis connection management with automatic reconnection
//! - A `RedisProfileStore` reading the follow/block graph from Redis sets
//! - An `InMemoryProfileStore` for development and tests
//! - Key naming helpers shared by writers of the graph
//!
//! # Example
//!
//! ```rust,ignore
//! use feed_gateway::config::Settings;
//! use feed_gateway::infrastructure::profile_store::create_profile_store;
//!
//! let settings = Settings::load()?;
//! let store = create_profile_store(&settings.profile_store).await?;
//! let profile = store.get_profile("uid-1").await?;
//! ```

mod memory_store;
mod redis_store;

pub use memory_store::InMemoryProfileStore;
pub use redis_store::RedisProfileStore;

use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::{ProfileStoreBackend, ProfileStoreSettings};
use crate::domain::ProfileStore;
use crate::shared::error::StoreError;

/// Key names for the social graph in Redis
pub mod keys {
    pub const BLOCKED: &str = "blocked";
    pub const FOLLOWING: &str = "following";
    pub const FOLLOWERS: &str = "followers";

    /// Set of every profile uid
    pub fn all_profiles(prefix: &str) -> String {
        format!("{}profiles", prefix)
    }

    /// Set of related uids for one profile
    pub fn relation(prefix: &str, uid: &str, relation: &str) -> String {
        format!("{}profile:{}:{}", prefix, uid, relation)
    }
}

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(url))]
pub async fn create_redis_client(url: &str) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Build the configured profile store.
///
/// # Errors
///
/// Returns `StoreError` if Redis is unreachable or the seed file cannot be read.
pub async fn create_profile_store(
    settings: &ProfileStoreSettings,
) -> Result<Arc<dyn ProfileStore>, StoreError> {
    match settings.backend {
        ProfileStoreBackend::Redis => {
            let conn = create_redis_client(&settings.url).await?;
            Ok(Arc::new(RedisProfileStore::new(
                conn,
                settings.key_prefix.clone(),
            )))
        }
        ProfileStoreBackend::Memory => {
            let store = match &settings.seed_path {
                Some(path) => InMemoryProfileStore::from_seed_file(path)?,
                None => InMemoryProfileStore::new(),
            };
            info!(profiles = store.len(), "In-memory profile store ready");
            Ok(Arc::new(store))
        }
    }
}
