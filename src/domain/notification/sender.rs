//! Notification delivery trait

use async_trait::async_trait;

use super::entity::Notification;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Delivers a single notification. Implementations do not retry.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), DomainError>;
}
