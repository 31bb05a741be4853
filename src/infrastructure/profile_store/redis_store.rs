//! Redis-backed profile store.
//!
//! The social graph is kept as Redis sets:
//!
//! ```text
//! {prefix}profiles                    SET of every profile uid
//! {prefix}profile:{uid}:blocked       SET of uids blocked by uid
//! {prefix}profile:{uid}:following     SET of uids followed by uid
//! {prefix}profile:{uid}:followers     SET of uids following uid
//! ```

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::instrument;

use super::keys;
use crate::domain::{ProfileStore, SocialProfile};
use crate::shared::error::StoreError;

/// Profile store reading the follow/block graph from Redis
#[derive(Clone)]
pub struct RedisProfileStore {
    redis: ConnectionManager,
    key_prefix: String,
}

impl RedisProfileStore {
    /// Create a new store over an established connection
    pub fn new(redis: ConnectionManager, key_prefix: impl Into<String>) -> Self {
        Self {
            redis,
            key_prefix: key_prefix.into(),
        }
    }

    fn all_profiles_key(&self) -> String {
        keys::all_profiles(&self.key_prefix)
    }

    fn relation_key(&self, uid: &str, relation: &str) -> String {
        keys::relation(&self.key_prefix, uid, relation)
    }
}

#[async_trait]
impl ProfileStore for RedisProfileStore {
    #[instrument(skip(self))]
    async fn get_profile(&self, uid: &str) -> Result<Option<SocialProfile>, StoreError> {
        let mut conn = self.redis.clone();

        let known: bool = conn.sismember(self.all_profiles_key(), uid).await?;
        if !known {
            return Ok(None);
        }

        let (blocked, following, followers): (Vec<String>, Vec<String>, Vec<String>) =
            redis::pipe()
                .smembers(self.relation_key(uid, keys::BLOCKED))
                .smembers(self.relation_key(uid, keys::FOLLOWING))
                .smembers(self.relation_key(uid, keys::FOLLOWERS))
                .query_async(&mut conn)
                .await?;

        Ok(Some(SocialProfile {
            uid: uid.to_string(),
            blocked,
            following,
            followers,
        }))
    }

    #[instrument(skip(self))]
    async fn list_profile_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.redis.clone();
        let ids: Vec<String> = conn.smembers(self.all_profiles_key()).await?;
        Ok(ids)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
