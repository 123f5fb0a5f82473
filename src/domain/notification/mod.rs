//! Notification domain

mod entity;
mod sender;

pub use entity::{Notification, NotificationPriority, Recipients};
pub use sender::NotificationSender;

#[cfg(test)]
pub use sender::MockNotificationSender;
