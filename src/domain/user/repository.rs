//! Profile directory trait

use async_trait::async_trait;

use super::entity::{Role, UserProfile};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Read-only lookup into user profiles
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Get a profile by user ID
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DomainError>;

    /// All profiles whose role is one of `roles`
    async fn find_by_roles(&self, roles: &[Role]) -> Result<Vec<UserProfile>, DomainError>;
}
