//! In-memory profile directory

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::user::{Role, UserDirectory, UserProfile};
use crate::domain::DomainError;

/// Seedable directory for development and tests
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        Self {
            profiles: RwLock::new(profiles.into_iter().map(|p| (p.id.clone(), p)).collect()),
        }
    }

    pub fn insert(&self, profile: UserProfile) -> Result<(), DomainError> {
        self.profiles
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?
            .insert(profile.id.clone(), profile);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DomainError> {
        let profiles = self
            .profiles
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(profiles.get(user_id).cloned())
    }

    async fn find_by_roles(&self, roles: &[Role]) -> Result<Vec<UserProfile>, DomainError> {
        let profiles = self
            .profiles
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut matching: Vec<_> = profiles
            .values()
            .filter(|p| roles.contains(&p.role))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(matching)
    }
}
