//! TTL cache in front of single-profile lookups

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::domain::user::{Role, UserDirectory, UserProfile};
use crate::domain::DomainError;

/// Caches `get_profile` hits, including confirmed misses. Role queries are
/// passed through since their result changes as users are added.
#[derive(Debug)]
pub struct CachedUserDirectory<D: UserDirectory> {
    inner: D,
    cache: Cache<String, Option<UserProfile>>,
}

impl<D: UserDirectory> CachedUserDirectory<D> {
    pub fn new(inner: D, ttl: Duration) -> Self {
        Self::with_capacity(inner, ttl, 10_000)
    }

    pub fn with_capacity(inner: D, ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(capacity)
            .build();

        Self { inner, cache }
    }

    pub async fn invalidate(&self, user_id: &str) {
        self.cache.invalidate(user_id).await;
    }
}

#[async_trait]
impl<D: UserDirectory> UserDirectory for CachedUserDirectory<D> {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DomainError> {
        if let Some(cached) = self.cache.get(user_id).await {
            tracing::debug!(user_id, "Profile cache hit");
            return Ok(cached);
        }

        let profile = self.inner.get_profile(user_id).await?;
        self.cache
            .insert(user_id.to_string(), profile.clone())
            .await;

        Ok(profile)
    }

    async fn find_by_roles(&self, roles: &[Role]) -> Result<Vec<UserProfile>, DomainError> {
        self.inner.find_by_roles(roles).await
    }
}
