//! Audience Resolution
//!
//! Computes which profiles may receive an event. Blocking is enforced
//! unconditionally; following only widens content distribution.
//!
//! | Audience | Members |
//! |----------|---------|
//! | `not_blocked(uid)` | all profiles − blocked(uid) ∪ {uid} |
//! | `not_blocked_and_followers(uid)` | (all profiles ∪ followers(uid)) − blocked(uid) ∪ {uid} |
//! | `direct(uid, profile)` | {uid, profile} |
//! | `owner(uid)` | {uid} |

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::domain::entities::{ProfileStore, SocialProfile};
use crate::shared::error::StoreError;

/// Set of profile ids eligible to receive an event.
pub type Audience = HashSet<String>;

/// Store call budget used when none is configured.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Resolves audiences against the external profile store.
///
/// Every store call is bounded by `timeout`; an elapsed call is reported as
/// `StoreError::Unavailable` like any other store failure.
#[derive(Clone)]
pub struct AudienceResolver {
    store: Arc<dyn ProfileStore>,
    timeout: Duration,
}

impl AudienceResolver {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self::with_timeout(store, DEFAULT_STORE_TIMEOUT)
    }

    pub fn with_timeout(store: Arc<dyn ProfileStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// All known profiles except those `uid` has blocked, plus `uid` itself.
    #[instrument(skip(self))]
    pub async fn not_blocked(&self, uid: &str) -> Result<Audience, StoreError> {
        let profile = self.load_profile(uid).await?;
        let everyone = self
            .bounded("list_profile_ids", self.store.list_profile_ids())
            .await?;

        let mut audience: Audience = everyone
            .into_iter()
            .filter(|id| !profile.has_blocked(id))
            .collect();
        audience.insert(uid.to_string());

        Ok(audience)
    }

    /// `not_blocked(uid)` widened with the followers of `uid`.
    ///
    /// A follower that `uid` has blocked is still excluded.
    #[instrument(skip(self))]
    pub async fn not_blocked_and_followers(&self, uid: &str) -> Result<Audience, StoreError> {
        let profile = self.load_profile(uid).await?;
        let everyone = self
            .bounded("list_profile_ids", self.store.list_profile_ids())
            .await?;

        let mut audience: Audience = everyone
            .into_iter()
            .chain(profile.followers.iter().cloned())
            .filter(|id| !profile.has_blocked(id))
            .collect();
        audience.insert(uid.to_string());

        Ok(audience)
    }

    /// The source and the addressed profile, without a store lookup.
    pub fn direct(uid: &str, profile_id: Option<&str>) -> Audience {
        let mut audience = Self::owner(uid);
        if let Some(profile_id) = profile_id {
            audience.insert(profile_id.to_string());
        }
        audience
    }

    /// The source only.
    pub fn owner(uid: &str) -> Audience {
        HashSet::from([uid.to_string()])
    }

    /// A missing profile contributes no blocked ids and no followers.
    async fn load_profile(&self, uid: &str) -> Result<SocialProfile, StoreError> {
        match self.bounded("get_profile", self.store.get_profile(uid)).await? {
            Some(profile) => Ok(profile),
            None => {
                debug!(uid = %uid, "Profile not found, resolving with empty relations");
                Ok(SocialProfile::new(uid))
            }
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Unavailable(format!(
                "{} timed out after {}ms",
                operation,
                self.timeout.as_millis()
            ))),
        }
    }
}
