//! In-memory profile store.
//!
//! Used for local development (optionally seeded from a JSON file) and tests.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{ProfileStore, SocialProfile};
use crate::shared::error::StoreError;

/// Profile store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<BTreeMap<String, SocialProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a set of profiles
    pub fn with_profiles(profiles: impl IntoIterator<Item = SocialProfile>) -> Self {
        let store = Self::new();
        for profile in profiles {
            store.upsert(profile);
        }
        store
    }

    /// Load a JSON array of profiles.
    ///
    /// ```json
    /// [{"uid": "a", "blocked": ["b"], "following": [], "followers": ["c"]}]
    /// ```
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| StoreError::SeedIo {
            path: path.display().to_string(),
            source,
        })?;
        let profiles: Vec<SocialProfile> = serde_json::from_str(&raw)?;
        Ok(Self::with_profiles(profiles))
    }

    /// Insert or replace a profile
    pub fn upsert(&self, profile: SocialProfile) {
        self.profiles.write().insert(profile.uid.clone(), profile);
    }

    pub fn remove(&self, uid: &str) -> Option<SocialProfile> {
        self.profiles.write().remove(uid)
    }

    /// Record that `blocker` has blocked `blocked`
    pub fn block(&self, blocker: &str, blocked: &str) {
        let mut profiles = self.profiles.write();
        let profile = profiles
            .entry(blocker.to_string())
            .or_insert_with(|| SocialProfile::new(blocker));
        if !profile.has_blocked(blocked) {
            profile.blocked.push(blocked.to_string());
        }
    }

    /// Record that `follower` follows `followee`, on both sides
    pub fn follow(&self, follower: &str, followee: &str) {
        let mut profiles = self.profiles.write();

        let target = profiles
            .entry(followee.to_string())
            .or_insert_with(|| SocialProfile::new(followee));
        if !target.is_followed_by(follower) {
            target.followers.push(follower.to_string());
        }

        let source = profiles
            .entry(follower.to_string())
            .or_insert_with(|| SocialProfile::new(follower));
        if !source.following.iter().any(|f| f == followee) {
            source.following.push(followee.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<SocialProfile>, StoreError> {
        Ok(self.profiles.read().get(uid).cloned())
    }

    async fn list_profile_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.profiles.read().keys().cloned().collect())
    }
}
