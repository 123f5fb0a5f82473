use async_trait::async_trait;
use tracing::info;

use crate::domain::notification::{Notification, NotificationSender};
use crate::domain::DomainError;

/// Writes notifications to the log instead of delivering them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send(&self, notification: &Notification) -> Result<(), DomainError> {
        info!(
            recipients = ?notification.recipients,
            kind = %notification.kind,
            module = %notification.module,
            title = %notification.title,
            "Notification"
        );
        Ok(())
    }
}
