//! Notification senders and the fire-and-forget dispatcher

mod dispatcher;
mod log_sender;
mod webhook_sender;

pub use dispatcher::NotificationDispatcher;
pub use log_sender::LogNotificationSender;
pub use webhook_sender::{sign_payload, WebhookNotificationSender, SIGNATURE_HEADER};
