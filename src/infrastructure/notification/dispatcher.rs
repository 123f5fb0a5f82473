//! Fire-and-forget notification dispatch
//!
//! Delivery is at-most-once: each notification is handed to the sender once on
//! a background task and never retried. Failures are logged and dropped.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::notification::{Notification, NotificationSender};

#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Arc<dyn NotificationSender>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher").finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn NotificationSender>) -> Self {
        Self { sender }
    }

    /// Spawn delivery and return immediately. The handle is only useful to
    /// tests; callers are expected to drop it.
    pub fn dispatch(&self, notification: Notification) -> JoinHandle<()> {
        self.dispatch_with(async move { Some(notification) })
    }

    /// Like [`dispatch`](Self::dispatch), but the notification is composed on
    /// the background task. Lookups needed to address or word it run there,
    /// off the caller's path. Composing `None` drops the notification.
    pub fn dispatch_with<F>(&self, compose: F) -> JoinHandle<()>
    where
        F: Future<Output = Option<Notification>> + Send + 'static,
    {
        let sender = self.sender.clone();

        tokio::spawn(async move {
            let Some(notification) = compose.await else {
                debug!("Notification dropped while composing");
                return;
            };

            if notification.recipients.is_empty() {
                debug!(kind = %notification.kind, "Notification has no recipients, skipping");
                return;
            }

            if let Err(e) = sender.send(&notification).await {
                warn!(
                    error = %e,
                    kind = %notification.kind,
                    recipients = notification.recipients.len(),
                    "Notification delivery failed"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::{MockNotificationSender, Recipients};
    use crate::domain::review::{HistoryAction, ItemType, WorkflowRecord};
    use crate::domain::DomainError;

    fn notification(recipients: Recipients) -> Notification {
        let record = WorkflowRecord::new(ItemType::Procedure, "proc-1", "EG1");
        Notification::for_workflow(
            recipients,
            &record,
            HistoryAction::SignedOff,
            "Signed off",
            "proc-1 was signed off",
        )
    }

    #[tokio::test]
    async fn test_dispatch_delivers_once() {
        let mut sender = MockNotificationSender::new();
        sender.expect_send().times(1).returning(|_| Ok(()));

        let dispatcher = NotificationDispatcher::new(Arc::new(sender));
        dispatcher
            .dispatch(notification(Recipients::One("E1".into())))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failure_is_swallowed_without_retry() {
        let mut sender = MockNotificationSender::new();
        sender
            .expect_send()
            .times(1)
            .returning(|_| Err(DomainError::notification("endpoint down")));

        let dispatcher = NotificationDispatcher::new(Arc::new(sender));
        let handle = dispatcher.dispatch(notification(Recipients::One("E1".into())));

        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn test_composition_runs_on_the_background_task() {
        let mut sender = MockNotificationSender::new();
        sender
            .expect_send()
            .times(1)
            .withf(|n| n.title == "Signed off")
            .returning(|_| Ok(()));

        let dispatcher = NotificationDispatcher::new(Arc::new(sender));
        let (release, released) = tokio::sync::oneshot::channel::<()>();

        let handle = dispatcher.dispatch_with(async move {
            released.await.ok()?;
            Some(notification(Recipients::One("E1".into())))
        });

        // dispatch_with returned while composition is still waiting
        assert!(!handle.is_finished());
        release.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_composed_none_is_dropped() {
        let mut sender = MockNotificationSender::new();
        sender.expect_send().never();

        let dispatcher = NotificationDispatcher::new(Arc::new(sender));
        dispatcher.dispatch_with(async { None }).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_audience_is_skipped() {
        let mut sender = MockNotificationSender::new();
        sender.expect_send().never();

        let dispatcher = NotificationDispatcher::new(Arc::new(sender));
        dispatcher
            .dispatch(notification(Recipients::Many(vec![])))
            .await
            .unwrap();
    }
}
