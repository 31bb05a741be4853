//! Social profile view and the profile store contract.
//!
//! The follow/block graph is owned by an external store; the gateway only
//! reads it to compute audiences.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::StoreError;

/// The slice of a profile that matters for audience resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialProfile {
    pub uid: String,

    /// Profiles this profile has blocked
    #[serde(default)]
    pub blocked: Vec<String>,

    /// Profiles this profile follows
    #[serde(default)]
    pub following: Vec<String>,

    /// Profiles following this profile
    #[serde(default)]
    pub followers: Vec<String>,
}

impl SocialProfile {
    /// A profile with no relations.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Default::default()
        }
    }

    pub fn has_blocked(&self, uid: &str) -> bool {
        self.blocked.iter().any(|b| b == uid)
    }

    pub fn is_followed_by(&self, uid: &str) -> bool {
        self.followers.iter().any(|f| f == uid)
    }
}

/// Read-only access to the profile/social-graph store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Look up a profile by uid. `Ok(None)` when the profile does not exist.
    async fn get_profile(&self, uid: &str) -> Result<Option<SocialProfile>, StoreError>;

    /// Every known profile id.
    async fn list_profile_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Connectivity check used by the readiness probe.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
