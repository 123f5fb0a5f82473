//! Review orchestrator
//!
//! Every mutating operation runs the same sequence: check the caller's
//! capability, load the record, apply the guarded transition, persist, append
//! one ledger entry and hand a notification to the dispatcher. Ledger and
//! notification failures are logged and never change the outcome.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::domain::access::{self, ReviewAction};
use crate::domain::notification::{Notification, NotificationPriority, Recipients};
use crate::domain::review::{
    HistoryAction, HistoryEntry, HistoryFilter, HistoryRepository, ItemRegistry, ItemType, Page,
    PageRequest, Priority, ReviewStats, ReviewStatus, WorkflowFilter, WorkflowId,
    WorkflowOverride, WorkflowRecord, WorkflowRepository,
};
use crate::domain::user::{Caller, Role, UserDirectory};
use crate::domain::DomainError;
use crate::infrastructure::notification::NotificationDispatcher;

/// Listing limits
#[derive(Debug, Clone, Copy)]
pub struct ReviewServiceConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub history_default_limit: usize,
}

impl Default for ReviewServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            history_default_limit: 50,
        }
    }
}

/// Explicit workflow creation
#[derive(Debug, Clone)]
pub struct NewWorkflow {
    pub item_type: ItemType,
    pub item_id: String,
    pub engagement: String,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

/// Review queue query; `statuses` defaults to the pending-review states
#[derive(Debug, Clone, Default)]
pub struct QueueQuery {
    pub reviewer: Option<String>,
    pub statuses: Option<Vec<ReviewStatus>>,
    pub engagement: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// Trait for review orchestration, the seam used by the HTTP layer
#[async_trait]
pub trait ReviewServiceTrait: Send + Sync {
    async fn submit_for_review(
        &self,
        caller: &Caller,
        item_type: ItemType,
        item_id: &str,
        engagement: &str,
        comments: Option<String>,
    ) -> Result<WorkflowRecord, DomainError>;

    async fn assign_reviewer(
        &self,
        caller: &Caller,
        reference: &str,
        reviewer_id: &str,
        comments: Option<String>,
    ) -> Result<WorkflowRecord, DomainError>;

    async fn perform_review(
        &self,
        caller: &Caller,
        reference: &str,
        approved: bool,
        comments: Option<String>,
    ) -> Result<WorkflowRecord, DomainError>;

    async fn sign_off(
        &self,
        caller: &Caller,
        reference: &str,
        comments: Option<String>,
    ) -> Result<WorkflowRecord, DomainError>;

    async fn reopen(
        &self,
        caller: &Caller,
        reference: &str,
        reason: Option<String>,
    ) -> Result<WorkflowRecord, DomainError>;

    async fn create_workflow(
        &self,
        caller: &Caller,
        request: NewWorkflow,
    ) -> Result<WorkflowRecord, DomainError>;

    async fn get_workflow(&self, caller: &Caller, id: &str)
        -> Result<WorkflowRecord, DomainError>;

    async fn get_workflow_for_item(
        &self,
        caller: &Caller,
        item_type: ItemType,
        item_id: &str,
    ) -> Result<WorkflowRecord, DomainError>;

    async fn add_note(
        &self,
        caller: &Caller,
        id: &str,
        text: &str,
    ) -> Result<WorkflowRecord, DomainError>;

    async fn set_priority(
        &self,
        caller: &Caller,
        id: &str,
        priority: Priority,
    ) -> Result<WorkflowRecord, DomainError>;

    async fn set_due_date(
        &self,
        caller: &Caller,
        id: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<WorkflowRecord, DomainError>;

    async fn override_workflow(
        &self,
        caller: &Caller,
        id: &str,
        patch: WorkflowOverride,
    ) -> Result<WorkflowRecord, DomainError>;

    async fn delete_workflow(&self, caller: &Caller, id: &str) -> Result<(), DomainError>;

    async fn review_queue(
        &self,
        caller: &Caller,
        query: QueueQuery,
    ) -> Result<Page<WorkflowRecord>, DomainError>;

    async fn list_workflows(
        &self,
        caller: &Caller,
        filter: WorkflowFilter,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Page<WorkflowRecord>, DomainError>;

    async fn review_stats(
        &self,
        caller: &Caller,
        engagement: Option<&str>,
    ) -> Result<ReviewStats, DomainError>;

    async fn history_for_workflow(
        &self,
        caller: &Caller,
        reference: &str,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Page<HistoryEntry>, DomainError>;

    async fn list_history(
        &self,
        caller: &Caller,
        filter: HistoryFilter,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Page<HistoryEntry>, DomainError>;
}

/// Review orchestrator over the workflow store, the ledger and the notifier
pub struct ReviewService {
    workflows: Arc<dyn WorkflowRepository>,
    history: Arc<dyn HistoryRepository>,
    directory: Arc<dyn UserDirectory>,
    items: ItemRegistry,
    notifier: NotificationDispatcher,
    config: ReviewServiceConfig,
}

impl std::fmt::Debug for ReviewService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewService")
            .field("items", &self.items)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReviewService {
    pub fn new(
        workflows: Arc<dyn WorkflowRepository>,
        history: Arc<dyn HistoryRepository>,
        directory: Arc<dyn UserDirectory>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            workflows,
            history,
            directory,
            items: ItemRegistry::new(),
            notifier,
            config: ReviewServiceConfig::default(),
        }
    }

    pub fn with_items(mut self, items: ItemRegistry) -> Self {
        self.items = items;
        self
    }

    pub fn with_config(mut self, config: ReviewServiceConfig) -> Self {
        self.config = config;
        self
    }

    async fn load(&self, id: &str) -> Result<WorkflowRecord, DomainError> {
        let id = WorkflowId::new(id)?;

        self.workflows
            .get(&id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Workflow '{}' not found", id)))
    }

    /// Resolve a path reference: a workflow ID first, then a bare item ID
    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<WorkflowRecord>, DomainError> {
        if let Ok(id) = WorkflowId::new(reference) {
            if let Some(record) = self.workflows.get(&id).await? {
                return Ok(Some(record));
            }
        }

        let mut matches = self
            .workflows
            .list(&WorkflowFilter::new().with_item_id(reference))
            .await?;

        match matches.len() {
            0 | 1 => Ok(matches.pop()),
            n => Err(DomainError::conflict(format!(
                "Item ID '{}' matches {} workflows across item types; use the workflow ID",
                reference, n
            ))),
        }
    }

    async fn resolve(&self, reference: &str) -> Result<WorkflowRecord, DomainError> {
        self.find_by_reference(reference).await?.ok_or_else(|| {
            DomainError::not_found(format!("No workflow found for '{}'", reference))
        })
    }

    fn page_request(&self, page: Option<usize>, limit: Option<usize>) -> PageRequest {
        PageRequest::new(
            page,
            limit,
            self.config.default_page_size,
            self.config.max_page_size,
        )
    }

    fn history_page_request(&self, page: Option<usize>, limit: Option<usize>) -> PageRequest {
        PageRequest::new(
            page,
            limit,
            self.config.history_default_limit,
            self.config.max_page_size,
        )
    }

    /// Persist, then append the ledger entry. The record returned is the saved one.
    async fn commit(
        &self,
        caller: &Caller,
        record: WorkflowRecord,
        action: HistoryAction,
        previous: ReviewStatus,
        comments: Option<String>,
        metadata: Vec<(&'static str, Value)>,
    ) -> Result<WorkflowRecord, DomainError> {
        let saved = self.workflows.save(record).await?;

        info!(
            workflow_id = %saved.id(),
            item_type = %saved.item_type(),
            item_id = saved.item_id(),
            from = %previous,
            to = %saved.status(),
            actor = %caller.user_id,
            action = %action,
            "Workflow transition"
        );

        let entry = metadata.into_iter().fold(
            HistoryEntry::for_workflow(&saved, action, caller.user_id.as_str())
                .with_transition(previous, saved.status())
                .with_comments(comments)
                .with_audit(caller.audit.clone()),
            |entry, (key, value)| entry.with_metadata(key, value),
        );

        self.record_history(entry).await;
        Ok(saved)
    }

    async fn record_history(&self, entry: HistoryEntry) {
        let workflow_id = entry.workflow_id().clone();
        let action = entry.action();

        if let Err(e) = self.history.append(entry).await {
            error!(
                error = %e,
                workflow_id = %workflow_id,
                action = %action,
                "Failed to append history entry"
            );
        }
    }

    /// Tell the review audience an item is waiting. The audience and the
    /// submitter's name are resolved on the dispatch task.
    fn notify_review_audience(&self, record: &WorkflowRecord, submitter: &str) {
        let directory = self.directory.clone();
        let record = record.clone();
        let submitter = submitter.to_string();

        self.notifier.dispatch_with(async move {
            let (audience, name) = futures::join!(
                directory.find_by_roles(&Role::REVIEW_AUDIENCE),
                display_name(directory.as_ref(), &submitter)
            );

            let audience = match audience {
                Ok(profiles) => profiles
                    .into_iter()
                    .map(|p| p.id)
                    .filter(|id| *id != submitter)
                    .collect::<Vec<_>>(),
                Err(e) => {
                    warn!(error = %e, workflow_id = %record.id(), "Failed to resolve review audience");
                    return None;
                }
            };

            let priority = if record.priority() >= Priority::High {
                NotificationPriority::High
            } else {
                NotificationPriority::Normal
            };

            Some(
                Notification::for_workflow(
                    Recipients::Many(audience),
                    &record,
                    HistoryAction::SubmittedForReview,
                    format!("{} ready for review", record.item_type().label()),
                    format!(
                        "{} submitted {} '{}' for review",
                        name,
                        record.item_type().label(),
                        record.item_id()
                    ),
                )
                .with_priority(priority),
            )
        });
    }

    /// Tell the submitter how the review went
    fn notify_review_outcome(&self, record: &WorkflowRecord, reviewer: &str, approved: bool) {
        let Some(submitter) = record.submitted_by().map(str::to_string) else {
            return;
        };

        let directory = self.directory.clone();
        let record = record.clone();
        let reviewer = reviewer.to_string();

        self.notifier.dispatch_with(async move {
            let (action, verdict) = if approved {
                (HistoryAction::ReviewApproved, "approved")
            } else {
                (HistoryAction::ReviewRejected, "rejected")
            };
            let name = display_name(directory.as_ref(), &reviewer).await;

            Some(Notification::for_workflow(
                Recipients::One(submitter),
                &record,
                action,
                format!("Review {}", verdict),
                format!(
                    "{} '{}' was {} by {}",
                    record.item_type().label(),
                    record.item_id(),
                    verdict,
                    name
                ),
            ))
        });
    }

    fn notify_user(
        &self,
        user_id: &str,
        record: &WorkflowRecord,
        action: HistoryAction,
        title: String,
        message: String,
    ) {
        self.notifier.dispatch(Notification::for_workflow(
            Recipients::One(user_id.to_string()),
            record,
            action,
            title,
            message,
        ));
    }
}

/// Profile name for notification text, falling back to the user ID
async fn display_name(directory: &dyn UserDirectory, user_id: &str) -> String {
    match directory.get_profile(user_id).await {
        Ok(Some(profile)) => profile.name,
        Ok(None) => user_id.to_string(),
        Err(e) => {
            warn!(error = %e, user_id, "Profile lookup failed");
            user_id.to_string()
        }
    }
}

#[async_trait]
impl ReviewServiceTrait for ReviewService {
    async fn submit_for_review(
        &self,
        caller: &Caller,
        item_type: ItemType,
        item_id: &str,
        engagement: &str,
        comments: Option<String>,
    ) -> Result<WorkflowRecord, DomainError> {
        access::require(caller, ReviewAction::SubmitForReview)?;

        if engagement.trim().is_empty() {
            return Err(DomainError::validation("Engagement ID is required"));
        }

        let mut record = match self.workflows.find_by_item(item_type, item_id).await? {
            Some(record) => record,
            None => {
                self.items.ensure_exists(item_type, item_id, engagement).await?;
                self.workflows
                    .get_or_create(item_type, item_id, engagement)
                    .await?
            }
        };

        let previous = record.submit_for_review(&caller.user_id, Utc::now())?;
        let saved = self
            .commit(
                caller,
                record,
                HistoryAction::SubmittedForReview,
                previous,
                comments,
                vec![],
            )
            .await?;

        self.notify_review_audience(&saved, &caller.user_id);
        Ok(saved)
    }

    async fn assign_reviewer(
        &self,
        caller: &Caller,
        reference: &str,
        reviewer_id: &str,
        comments: Option<String>,
    ) -> Result<WorkflowRecord, DomainError> {
        access::require(caller, ReviewAction::AssignReviewer)?;

        let reviewer_id = reviewer_id.trim();
        if reviewer_id.is_empty() {
            return Err(DomainError::validation("Reviewer ID is required"));
        }

        let mut record = self.resolve(reference).await?;
        let previous = record.assign_reviewer(reviewer_id, Utc::now())?;
        let saved = self
            .commit(
                caller,
                record,
                HistoryAction::AssignedReviewer,
                previous,
                comments,
                vec![("reviewerId", json!(reviewer_id))],
            )
            .await?;

        self.notify_user(
            reviewer_id,
            &saved,
            HistoryAction::AssignedReviewer,
            "Review assigned to you".to_string(),
            format!(
                "You have been assigned to review {} '{}'",
                saved.item_type().label(),
                saved.item_id()
            ),
        );

        Ok(saved)
    }

    async fn perform_review(
        &self,
        caller: &Caller,
        reference: &str,
        approved: bool,
        comments: Option<String>,
    ) -> Result<WorkflowRecord, DomainError> {
        access::require(caller, ReviewAction::PerformReview)?;

        let mut record = self.resolve(reference).await?;
        let previous =
            record.complete_review(approved, &caller.user_id, comments.clone(), Utc::now())?;

        let action = if approved {
            HistoryAction::ReviewApproved
        } else {
            HistoryAction::ReviewRejected
        };

        let saved = self
            .commit(
                caller,
                record,
                action,
                previous,
                comments,
                vec![("approved", json!(approved))],
            )
            .await?;

        self.notify_review_outcome(&saved, &caller.user_id, approved);
        Ok(saved)
    }

    async fn sign_off(
        &self,
        caller: &Caller,
        reference: &str,
        comments: Option<String>,
    ) -> Result<WorkflowRecord, DomainError> {
        access::require(caller, ReviewAction::SignOff)?;

        let mut record = self.resolve(reference).await?;
        let previous = record.sign_off(&caller.user_id, comments.clone(), Utc::now())?;

        self.commit(
            caller,
            record,
            HistoryAction::SignedOff,
            previous,
            comments,
            vec![],
        )
        .await
    }

    async fn reopen(
        &self,
        caller: &Caller,
        reference: &str,
        reason: Option<String>,
    ) -> Result<WorkflowRecord, DomainError> {
        access::require(caller, ReviewAction::Reopen)?;

        let mut record = self.resolve(reference).await?;
        let previous = record.reopen(&caller.user_id, reason.clone(), Utc::now())?;
        let version = record.version();

        self.commit(
            caller,
            record,
            HistoryAction::Reopened,
            previous,
            reason,
            vec![("version", json!(version))],
        )
        .await
    }

    async fn create_workflow(
        &self,
        caller: &Caller,
        request: NewWorkflow,
    ) -> Result<WorkflowRecord, DomainError> {
        access::require(caller, ReviewAction::SubmitForReview)?;

        if request.engagement.trim().is_empty() {
            return Err(DomainError::validation("Engagement ID is required"));
        }

        self.items
            .ensure_exists(request.item_type, &request.item_id, &request.engagement)
            .await?;

        let mut record = WorkflowRecord::new(request.item_type, request.item_id, request.engagement)
            .with_tags(request.tags);

        if let Some(priority) = request.priority {
            record = record.with_priority(priority);
        }

        if let Some(due_date) = request.due_date {
            record = record.with_due_date(due_date);
        }

        let created = self.workflows.create(record).await?;
        info!(
            workflow_id = %created.id(),
            item_type = %created.item_type(),
            item_id = created.item_id(),
            actor = %caller.user_id,
            "Workflow created"
        );

        Ok(created)
    }

    async fn get_workflow(
        &self,
        caller: &Caller,
        id: &str,
    ) -> Result<WorkflowRecord, DomainError> {
        access::require(caller, ReviewAction::ViewQueue)?;
        self.load(id).await
    }

    async fn get_workflow_for_item(
        &self,
        caller: &Caller,
        item_type: ItemType,
        item_id: &str,
    ) -> Result<WorkflowRecord, DomainError> {
        access::require(caller, ReviewAction::ViewQueue)?;

        self.workflows
            .find_by_item(item_type, item_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("No workflow for {} '{}'", item_type, item_id))
            })
    }

    async fn add_note(
        &self,
        caller: &Caller,
        id: &str,
        text: &str,
    ) -> Result<WorkflowRecord, DomainError> {
        access::require(caller, ReviewAction::Annotate)?;

        let mut record = self.load(id).await?;
        record.add_note(text, &caller.user_id, Utc::now())?;
        let status = record.status();

        self.commit(
            caller,
            record,
            HistoryAction::CommentAdded,
            status,
            Some(text.trim().to_string()),
            vec![],
        )
        .await
    }

    async fn set_priority(
        &self,
        caller: &Caller,
        id: &str,
        priority: Priority,
    ) -> Result<WorkflowRecord, DomainError> {
        access::require(caller, ReviewAction::Annotate)?;

        let mut record = self.load(id).await?;
        let from = record.set_priority(priority, Utc::now())?;
        let status = record.status();

        self.commit(
            caller,
            record,
            HistoryAction::PriorityChanged,
            status,
            None,
            vec![("from", json!(from)), ("to", json!(priority))],
        )
        .await
    }

    async fn set_due_date(
        &self,
        caller: &Caller,
        id: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<WorkflowRecord, DomainError> {
        access::require(caller, ReviewAction::Annotate)?;

        let mut record = self.load(id).await?;
        let from = record.set_due_date(due_date, Utc::now())?;
        let status = record.status();

        self.commit(
            caller,
            record,
            HistoryAction::DueDateChanged,
            status,
            None,
            vec![("from", json!(from)), ("to", json!(due_date))],
        )
        .await
    }

    async fn override_workflow(
        &self,
        caller: &Caller,
        id: &str,
        patch: WorkflowOverride,
    ) -> Result<WorkflowRecord, DomainError> {
        access::require(caller, ReviewAction::OverrideWorkflow)?;

        if patch.is_empty() {
            return Err(DomainError::validation(
                "At least one of status, reviewComments, signOffComments or reopenReason is required",
            ));
        }

        let mut record = self.load(id).await?;
        if !record.has_acted(&caller.user_id) {
            return Err(DomainError::forbidden(
                "Only users who acted on this workflow may update it",
            ));
        }

        let fields: Vec<&str> = [
            patch.status.map(|_| "status"),
            patch.review_comments.as_ref().map(|_| "reviewComments"),
            patch.sign_off_comments.as_ref().map(|_| "signOffComments"),
            patch.reopen_reason.as_ref().map(|_| "reopenReason"),
        ]
        .into_iter()
        .flatten()
        .collect();

        let previous = record.apply_override(patch, &caller.user_id, Utc::now());

        warn!(
            workflow_id = %record.id(),
            actor = %caller.user_id,
            from = %previous,
            to = %record.status(),
            "Workflow overridden outside the review lifecycle"
        );

        self.commit(
            caller,
            record,
            HistoryAction::StatusChanged,
            previous,
            None,
            vec![("override", json!(true)), ("fields", json!(fields))],
        )
        .await
    }

    async fn delete_workflow(&self, caller: &Caller, id: &str) -> Result<(), DomainError> {
        access::require(caller, ReviewAction::DeleteWorkflow)?;

        let record = self.load(id).await?;
        if !record.has_acted(&caller.user_id) {
            return Err(DomainError::forbidden(
                "Only users who acted on this workflow may delete it",
            ));
        }

        if !self.workflows.delete(record.id()).await? {
            return Err(DomainError::not_found(format!(
                "Workflow '{}' not found",
                record.id()
            )));
        }

        info!(
            workflow_id = %record.id(),
            item_type = %record.item_type(),
            item_id = record.item_id(),
            actor = %caller.user_id,
            "Workflow deleted"
        );

        Ok(())
    }

    async fn review_queue(
        &self,
        caller: &Caller,
        query: QueueQuery,
    ) -> Result<Page<WorkflowRecord>, DomainError> {
        access::require(caller, ReviewAction::ViewQueue)?;

        let mut filter = WorkflowFilter::new().with_statuses(
            query
                .statuses
                .unwrap_or_else(|| ReviewStatus::QUEUE_DEFAULT.to_vec()),
        );

        if let Some(reviewer) = query.reviewer {
            filter = filter.with_reviewer(reviewer);
        }

        if let Some(engagement) = query.engagement {
            filter = filter.with_engagement(engagement);
        }

        let mut records = self.workflows.list(&filter).await?;
        records.sort_by(crate::domain::review::queue_order);

        Ok(Page::from_sorted(
            records,
            self.page_request(query.page, query.limit),
        ))
    }

    async fn list_workflows(
        &self,
        caller: &Caller,
        filter: WorkflowFilter,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Page<WorkflowRecord>, DomainError> {
        access::require(caller, ReviewAction::ViewQueue)?;

        self.workflows
            .list_page(&filter, self.page_request(page, limit))
            .await
    }

    async fn review_stats(
        &self,
        caller: &Caller,
        engagement: Option<&str>,
    ) -> Result<ReviewStats, DomainError> {
        access::require(caller, ReviewAction::ViewStats)?;

        let filter = match engagement {
            Some(engagement) => WorkflowFilter::new().with_engagement(engagement),
            None => WorkflowFilter::new(),
        };

        let records = self.workflows.list(&filter).await?;
        Ok(ReviewStats::collect(&records, Utc::now()))
    }

    async fn history_for_workflow(
        &self,
        caller: &Caller,
        reference: &str,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Page<HistoryEntry>, DomainError> {
        access::require(caller, ReviewAction::ViewHistory)?;

        let filter = match self.find_by_reference(reference).await? {
            Some(record) => HistoryFilter::new().for_item(record.item_type(), record.item_id()),
            None => HistoryFilter::new().with_item_id(reference),
        };

        self.history
            .list_page(&filter, self.history_page_request(page, limit))
            .await
    }

    async fn list_history(
        &self,
        caller: &Caller,
        filter: HistoryFilter,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Page<HistoryEntry>, DomainError> {
        access::require(caller, ReviewAction::ViewHistory)?;

        self.history
            .list_page(&filter, self.history_page_request(page, limit))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::NotificationSender;
    use crate::domain::review::item::mock::KnownItemsResolver;
    use crate::domain::review::{MockHistoryRepository, MockWorkflowRepository};
    use crate::domain::user::{MockUserDirectory, UserProfile};
    use crate::infrastructure::review::{StorageHistoryRepository, StorageWorkflowRepository};
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::infrastructure::user::InMemoryUserDirectory;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Debug)]
    struct RecordingSender {
        tx: mpsc::UnboundedSender<Notification>,
    }

    #[async_trait]
    impl NotificationSender for RecordingSender {
        async fn send(&self, notification: &Notification) -> Result<(), DomainError> {
            let _ = self.tx.send(notification.clone());
            Ok(())
        }
    }

    struct Harness {
        service: ReviewService,
        history: Arc<StorageHistoryRepository>,
        notifications: mpsc::UnboundedReceiver<Notification>,
    }

    impl Harness {
        async fn next_notification(&mut self) -> Notification {
            tokio::time::timeout(Duration::from_secs(2), self.notifications.recv())
                .await
                .expect("notification not dispatched")
                .expect("channel closed")
        }

        async fn history_len(&self) -> usize {
            self.history.list(&HistoryFilter::new()).await.unwrap().len()
        }
    }

    fn directory() -> InMemoryUserDirectory {
        InMemoryUserDirectory::with_profiles([
            UserProfile::new("E1", "Eli", "eli@firm.test", Role::Employee),
            UserProfile::new("R1", "Rae", "rae@firm.test", Role::Reviewer),
            UserProfile::new("M1", "Mia", "mia@firm.test", Role::Manager),
            UserProfile::new("P1", "Pat", "pat@firm.test", Role::Partner),
        ])
    }

    fn dispatcher() -> (NotificationDispatcher, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            NotificationDispatcher::new(Arc::new(RecordingSender { tx })),
            rx,
        )
    }

    fn harness() -> Harness {
        let workflows = Arc::new(StorageWorkflowRepository::new(Arc::new(
            InMemoryStorage::new(),
        )));
        let history = Arc::new(StorageHistoryRepository::new(Arc::new(
            InMemoryStorage::new(),
        )));
        let (notifier, notifications) = dispatcher();

        let service = ReviewService::new(
            workflows,
            history.clone(),
            Arc::new(directory()),
            notifier,
        );

        Harness {
            service,
            history,
            notifications,
        }
    }

    fn employee() -> Caller {
        Caller::new("E1", Role::Employee)
    }

    fn reviewer() -> Caller {
        Caller::new("R1", Role::Reviewer)
    }

    fn manager() -> Caller {
        Caller::new("M1", Role::Manager)
    }

    fn partner() -> Caller {
        Caller::new("P1", Role::Partner)
    }

    async fn submitted(h: &Harness, item_id: &str) -> WorkflowRecord {
        h.service
            .submit_for_review(&employee(), ItemType::Procedure, item_id, "EG1", None)
            .await
            .unwrap()
    }

    async fn approved(h: &Harness, item_id: &str) -> WorkflowRecord {
        let record = submitted(h, item_id).await;
        let id = record.id().as_str();
        h.service
            .assign_reviewer(&manager(), id, "R1", None)
            .await
            .unwrap();
        h.service
            .perform_review(&reviewer(), id, true, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let h = harness();

        let record = h
            .service
            .submit_for_review(&employee(), ItemType::Procedure, "proc-1", "EG1", None)
            .await
            .unwrap();
        assert_eq!(record.status(), ReviewStatus::ReadyForReview);
        assert_eq!(record.submitted_by(), Some("E1"));
        assert_eq!(h.history_len().await, 1);

        let record = h
            .service
            .assign_reviewer(&manager(), "proc-1", "R1", None)
            .await
            .unwrap();
        assert_eq!(record.status(), ReviewStatus::UnderReview);
        assert_eq!(record.assigned_reviewer(), Some("R1"));
        assert_eq!(h.history_len().await, 2);

        let record = h
            .service
            .perform_review(&reviewer(), "proc-1", true, Some("looks good".into()))
            .await
            .unwrap();
        assert_eq!(record.status(), ReviewStatus::Approved);
        assert_eq!(record.review_comments(), Some("looks good"));
        assert_eq!(h.history_len().await, 3);

        let record = h
            .service
            .sign_off(&partner(), "proc-1", Some("final".into()))
            .await
            .unwrap();
        assert_eq!(record.status(), ReviewStatus::SignedOff);
        assert!(record.is_locked());
        assert_eq!(h.history_len().await, 4);

        let record = h
            .service
            .reopen(&partner(), "proc-1", Some("needs fix".into()))
            .await
            .unwrap();
        assert_eq!(record.status(), ReviewStatus::ReOpened);
        assert!(!record.is_locked());
        assert_eq!(record.version(), 2);
        assert_eq!(record.previous_version(), Some(1));
        assert_eq!(h.history_len().await, 5);

        let history = h
            .service
            .history_for_workflow(&reviewer(), record.id().as_str(), None, None)
            .await
            .unwrap();
        assert_eq!(history.total_count, 5);

        let reopened = history
            .items
            .iter()
            .find(|e| e.action() == HistoryAction::Reopened)
            .unwrap();
        assert_eq!(reopened.previous_status(), Some(ReviewStatus::SignedOff));
        assert_eq!(reopened.new_status(), Some(ReviewStatus::ReOpened));
        assert_eq!(reopened.comments(), Some("needs fix"));
        assert_eq!(reopened.performed_by(), "P1");
    }

    #[tokio::test]
    async fn test_every_transition_records_its_statuses() {
        let h = harness();
        let record = approved(&h, "proc-1").await;
        h.service
            .sign_off(&partner(), record.id().as_str(), None)
            .await
            .unwrap();

        let entries = h.history.list(&HistoryFilter::new()).await.unwrap();
        let expected = [
            (HistoryAction::SubmittedForReview, ReviewStatus::InProgress, ReviewStatus::ReadyForReview),
            (HistoryAction::AssignedReviewer, ReviewStatus::ReadyForReview, ReviewStatus::UnderReview),
            (HistoryAction::ReviewApproved, ReviewStatus::UnderReview, ReviewStatus::Approved),
            (HistoryAction::SignedOff, ReviewStatus::Approved, ReviewStatus::SignedOff),
        ];

        assert_eq!(entries.len(), expected.len());
        for (action, from, to) in expected {
            let entry = entries.iter().find(|e| e.action() == action).unwrap();
            assert_eq!(entry.previous_status(), Some(from), "{action}");
            assert_eq!(entry.new_status(), Some(to), "{action}");
            assert_eq!(entry.workflow_id(), record.id());
        }
    }

    #[tokio::test]
    async fn test_sign_off_cannot_skip_review() {
        let h = harness();
        let record = submitted(&h, "proc-1").await;

        let err = h
            .service
            .sign_off(&partner(), record.id().as_str(), None)
            .await
            .unwrap_err();

        match err {
            DomainError::PreconditionFailed { current_status, .. } => {
                assert_eq!(current_status, "ready-for-review");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let unchanged = h
            .service
            .get_workflow(&partner(), record.id().as_str())
            .await
            .unwrap();
        assert_eq!(unchanged.status(), ReviewStatus::ReadyForReview);
        assert_eq!(h.history_len().await, 1);
    }

    #[tokio::test]
    async fn test_resubmission_while_pending_fails() {
        let h = harness();
        submitted(&h, "proc-1").await;

        let err = h
            .service
            .submit_for_review(&employee(), ItemType::Procedure, "proc-1", "EG1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::PreconditionFailed { .. }));
        assert_eq!(h.history_len().await, 1);
    }

    #[tokio::test]
    async fn test_signed_off_item_cannot_be_resubmitted() {
        let h = harness();
        let record = approved(&h, "proc-1").await;
        h.service
            .sign_off(&partner(), record.id().as_str(), None)
            .await
            .unwrap();

        let err = h
            .service
            .submit_for_review(&employee(), ItemType::Procedure, "proc-1", "EG1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::PreconditionFailed { .. }));
        assert!(err.to_string().contains("locked"));
    }

    #[tokio::test]
    async fn test_rejected_item_can_be_resubmitted() {
        let h = harness();
        let record = submitted(&h, "proc-1").await;
        let id = record.id().as_str();
        h.service.assign_reviewer(&manager(), id, "R1", None).await.unwrap();
        let rejected = h
            .service
            .perform_review(&reviewer(), id, false, Some("missing evidence".into()))
            .await
            .unwrap();
        assert_eq!(rejected.status(), ReviewStatus::Rejected);

        let resubmitted = submitted(&h, "proc-1").await;
        assert_eq!(resubmitted.status(), ReviewStatus::ReadyForReview);
        assert_eq!(resubmitted.id(), record.id());
    }

    #[tokio::test]
    async fn test_submit_notifies_review_audience() {
        let mut h = harness();
        submitted(&h, "proc-1").await;

        let notification = h.next_notification().await;
        assert_eq!(
            notification.recipients,
            Recipients::Many(vec!["M1".into(), "P1".into(), "R1".into()])
        );
        assert_eq!(notification.kind, "submitted-for-review");
        assert!(notification.message.starts_with("Eli submitted"));
    }

    #[tokio::test]
    async fn test_assign_and_review_notify_individuals() {
        let mut h = harness();
        let record = submitted(&h, "proc-1").await;
        h.next_notification().await;

        h.service
            .assign_reviewer(&manager(), record.id().as_str(), "R1", None)
            .await
            .unwrap();
        let assigned = h.next_notification().await;
        assert_eq!(assigned.recipients, Recipients::One("R1".into()));

        h.service
            .perform_review(&reviewer(), record.id().as_str(), false, None)
            .await
            .unwrap();
        let reviewed = h.next_notification().await;
        assert_eq!(reviewed.recipients, Recipients::One("E1".into()));
        assert_eq!(reviewed.kind, "review-rejected");
    }

    #[tokio::test]
    async fn test_history_failure_does_not_fail_transition() {
        let workflows = Arc::new(StorageWorkflowRepository::new(Arc::new(
            InMemoryStorage::new(),
        )));
        let mut history = MockHistoryRepository::new();
        history
            .expect_append()
            .times(1)
            .returning(|_| Err(DomainError::storage("ledger offline")));
        let (notifier, _rx) = dispatcher();

        let service = ReviewService::new(workflows, Arc::new(history), Arc::new(directory()), notifier);
        let record = service
            .submit_for_review(&employee(), ItemType::Kyc, "kyc-1", "EG1", None)
            .await
            .unwrap();

        assert_eq!(record.status(), ReviewStatus::ReadyForReview);
    }

    #[tokio::test]
    async fn test_directory_failure_does_not_fail_transition() {
        let workflows = Arc::new(StorageWorkflowRepository::new(Arc::new(
            InMemoryStorage::new(),
        )));
        let history = Arc::new(StorageHistoryRepository::new(Arc::new(InMemoryStorage::new())));
        let mut directory = MockUserDirectory::new();
        directory
            .expect_find_by_roles()
            .returning(|_| Err(DomainError::storage("profiles unavailable")));
        directory.expect_get_profile().returning(|_| Ok(None));
        let (notifier, _rx) = dispatcher();

        let service = ReviewService::new(workflows, history, Arc::new(directory), notifier);
        let record = service
            .submit_for_review(&employee(), ItemType::Pbc, "pbc-1", "EG1", None)
            .await
            .unwrap();

        assert_eq!(record.status(), ReviewStatus::ReadyForReview);
    }

    /// Directory whose lookups never complete
    struct StalledDirectory;

    #[async_trait]
    impl UserDirectory for StalledDirectory {
        async fn get_profile(&self, _user_id: &str) -> Result<Option<UserProfile>, DomainError> {
            futures::future::pending().await
        }

        async fn find_by_roles(&self, _roles: &[Role]) -> Result<Vec<UserProfile>, DomainError> {
            futures::future::pending().await
        }
    }

    async fn promptly(
        label: &str,
        operation: impl std::future::Future<Output = Result<WorkflowRecord, DomainError>>,
    ) -> WorkflowRecord {
        tokio::time::timeout(Duration::from_secs(1), operation)
            .await
            .unwrap_or_else(|_| panic!("{label} waited on the directory"))
            .unwrap()
    }

    #[tokio::test]
    async fn test_transitions_do_not_wait_on_the_directory() {
        let workflows = Arc::new(StorageWorkflowRepository::new(Arc::new(
            InMemoryStorage::new(),
        )));
        let history = Arc::new(StorageHistoryRepository::new(Arc::new(InMemoryStorage::new())));
        let (notifier, _rx) = dispatcher();
        let service = ReviewService::new(workflows, history, Arc::new(StalledDirectory), notifier);

        let record = promptly(
            "submit",
            service.submit_for_review(&employee(), ItemType::Kyc, "kyc-1", "EG1", None),
        )
        .await;
        let id = record.id().as_str();

        promptly("assign", service.assign_reviewer(&manager(), id, "R1", None)).await;
        let reviewed =
            promptly("review", service.perform_review(&reviewer(), id, true, None)).await;
        assert_eq!(reviewed.status(), ReviewStatus::Approved);
    }

    #[tokio::test]
    async fn test_save_failure_propagates_without_history() {
        let mut workflows = MockWorkflowRepository::new();
        workflows.expect_find_by_item().returning(|_, _| Ok(None));
        workflows
            .expect_get_or_create()
            .returning(|t, id, eg| Ok(WorkflowRecord::new(t, id, eg)));
        workflows
            .expect_save()
            .returning(|_| Err(DomainError::storage("write failed")));

        let mut history = MockHistoryRepository::new();
        history.expect_append().never();
        let (notifier, _rx) = dispatcher();

        let service = ReviewService::new(
            Arc::new(workflows),
            Arc::new(history),
            Arc::new(directory()),
            notifier,
        );

        let err = service
            .submit_for_review(&employee(), ItemType::Procedure, "proc-1", "EG1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_unknown_item_aborts_submission() {
        let workflows = Arc::new(StorageWorkflowRepository::new(Arc::new(
            InMemoryStorage::new(),
        )));
        let history = Arc::new(StorageHistoryRepository::new(Arc::new(InMemoryStorage::new())));
        let (notifier, _rx) = dispatcher();

        let service = ReviewService::new(workflows.clone(), history, Arc::new(directory()), notifier)
            .with_items(ItemRegistry::new().with_resolver(
                ItemType::Kyc,
                Arc::new(KnownItemsResolver::new(&["kyc-1"])),
            ));

        let err = service
            .submit_for_review(&employee(), ItemType::Kyc, "kyc-404", "EG1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound { .. }));
        assert!(workflows.list(&WorkflowFilter::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_roles_are_checked_at_the_boundary() {
        let h = harness();
        let client = Caller::new("C1", Role::Client);

        let err = h
            .service
            .submit_for_review(&client, ItemType::Procedure, "proc-1", "EG1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden { .. }));

        let err = h
            .service
            .review_queue(&client, QueueQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_override_requires_capability_and_ownership() {
        let h = harness();
        let record = approved(&h, "proc-1").await;
        let id = record.id().as_str();
        let patch = WorkflowOverride {
            status: Some(ReviewStatus::SignedOff),
            ..Default::default()
        };

        // Reviewer acted on the record but lacks the override capability
        let err = h
            .service
            .override_workflow(&reviewer(), id, patch.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden { .. }));

        // Partner holds the capability but never acted on the record
        let err = h
            .service
            .override_workflow(&partner(), id, patch.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden { .. }));

        let admin_reviewer = Caller::new("R1", Role::Admin);
        let updated = h
            .service
            .override_workflow(&admin_reviewer, id, patch)
            .await
            .unwrap();

        assert_eq!(updated.status(), ReviewStatus::SignedOff);
        assert!(updated.is_locked());
        assert_eq!(updated.reviewed_by(), Some("R1"));

        let entries = h
            .history
            .list_by_action(HistoryAction::StatusChanged, 10)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].metadata()["override"], json!(true));
        assert_eq!(entries[0].previous_status(), Some(ReviewStatus::Approved));
    }

    #[tokio::test]
    async fn test_override_out_of_signed_off_unlocks_for_resubmission() {
        let h = harness();
        let record = approved(&h, "proc-1").await;
        let id = record.id().as_str();

        let signed = h.service.sign_off(&partner(), id, None).await.unwrap();
        assert!(signed.is_locked());

        let admin_reviewer = Caller::new("R1", Role::Admin);
        let updated = h
            .service
            .override_workflow(
                &admin_reviewer,
                id,
                WorkflowOverride {
                    status: Some(ReviewStatus::InProgress),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status(), ReviewStatus::InProgress);
        assert!(!updated.is_locked());
        assert_eq!(updated.locked_by(), None);

        let resubmitted = h
            .service
            .submit_for_review(&employee(), ItemType::Procedure, "proc-1", "EG1", None)
            .await
            .unwrap();
        assert_eq!(resubmitted.status(), ReviewStatus::ReadyForReview);
    }

    #[tokio::test]
    async fn test_empty_override_is_invalid() {
        let h = harness();
        let record = approved(&h, "proc-1").await;

        let err = h
            .service
            .override_workflow(
                &Caller::new("R1", Role::Admin),
                record.id().as_str(),
                WorkflowOverride::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_ownership_gated_and_skips_ledger() {
        let h = harness();
        let record = approved(&h, "proc-1").await;
        let id = record.id().as_str();
        let before = h.history_len().await;

        let err = h.service.delete_workflow(&employee(), id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden { .. }));

        h.service.delete_workflow(&reviewer(), id).await.unwrap();

        let err = h.service.get_workflow(&reviewer(), id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
        assert_eq!(h.history_len().await, before);
    }

    #[tokio::test]
    async fn test_notes_priority_and_due_date() {
        let h = harness();
        let record = submitted(&h, "proc-1").await;
        let id = record.id().as_str();

        let noted = h
            .service
            .add_note(&reviewer(), id, "  check tie-out  ")
            .await
            .unwrap();
        assert_eq!(noted.notes().len(), 1);
        assert_eq!(noted.notes()[0].text, "check tie-out");

        let prioritised = h
            .service
            .set_priority(&manager(), id, Priority::Critical)
            .await
            .unwrap();
        assert_eq!(prioritised.priority(), Priority::Critical);

        let due = Utc::now() + chrono::Duration::days(3);
        let scheduled = h
            .service
            .set_due_date(&manager(), id, Some(due))
            .await
            .unwrap();
        assert_eq!(scheduled.due_date(), Some(due));

        let changes = h
            .history
            .list_by_action(HistoryAction::PriorityChanged, 10)
            .await
            .unwrap();
        assert_eq!(changes[0].metadata()["from"], json!("medium"));
        assert_eq!(changes[0].metadata()["to"], json!("critical"));
        assert_eq!(
            changes[0].previous_status(),
            Some(ReviewStatus::ReadyForReview)
        );
        assert_eq!(changes[0].new_status(), Some(ReviewStatus::ReadyForReview));

        let comments = h
            .history
            .list_by_action(HistoryAction::CommentAdded, 10)
            .await
            .unwrap();
        assert_eq!(comments[0].comments(), Some("check tie-out"));
    }

    #[tokio::test]
    async fn test_locked_record_rejects_priority_change() {
        let h = harness();
        let record = approved(&h, "proc-1").await;
        h.service
            .sign_off(&partner(), record.id().as_str(), None)
            .await
            .unwrap();

        let err = h
            .service
            .set_priority(&partner(), record.id().as_str(), Priority::High)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::PreconditionFailed { .. }));
    }

    #[tokio::test]
    async fn test_queue_defaults_and_ordering() {
        let h = harness();

        let low = submitted(&h, "proc-low").await;
        h.service
            .set_priority(&manager(), low.id().as_str(), Priority::Low)
            .await
            .unwrap();

        let critical = submitted(&h, "proc-critical").await;
        h.service
            .set_priority(&manager(), critical.id().as_str(), Priority::Critical)
            .await
            .unwrap();

        let soon = submitted(&h, "proc-soon").await;
        h.service
            .set_due_date(
                &manager(),
                soon.id().as_str(),
                Some(Utc::now() + chrono::Duration::days(1)),
            )
            .await
            .unwrap();

        submitted(&h, "proc-undated").await;

        // Not pending review, so excluded from the default queue
        h.service
            .create_workflow(
                &employee(),
                NewWorkflow {
                    item_type: ItemType::Procedure,
                    item_id: "proc-draft".into(),
                    engagement: "EG1".into(),
                    priority: Some(Priority::Critical),
                    due_date: None,
                    tags: vec![],
                },
            )
            .await
            .unwrap();

        let queue = h
            .service
            .review_queue(&reviewer(), QueueQuery::default())
            .await
            .unwrap();

        let order: Vec<_> = queue.items.iter().map(|r| r.item_id()).collect();
        assert_eq!(
            order,
            vec!["proc-critical", "proc-soon", "proc-undated", "proc-low"]
        );
        assert_eq!(queue.total_count, 4);
    }

    #[tokio::test]
    async fn test_queue_filters_by_reviewer() {
        let h = harness();
        let a = submitted(&h, "proc-a").await;
        submitted(&h, "proc-b").await;
        h.service
            .assign_reviewer(&manager(), a.id().as_str(), "R1", None)
            .await
            .unwrap();

        let queue = h
            .service
            .review_queue(
                &reviewer(),
                QueueQuery {
                    reviewer: Some("R1".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(queue.items.len(), 1);
        assert_eq!(queue.items[0].item_id(), "proc-a");
    }

    #[tokio::test]
    async fn test_create_workflow_conflicts_with_existing() {
        let h = harness();
        submitted(&h, "proc-1").await;

        let err = h
            .service
            .create_workflow(
                &employee(),
                NewWorkflow {
                    item_type: ItemType::Procedure,
                    item_id: "proc-1".into(),
                    engagement: "EG1".into(),
                    priority: None,
                    due_date: None,
                    tags: vec![],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_stats_by_engagement() {
        let h = harness();
        let record = approved(&h, "proc-1").await;
        h.service
            .sign_off(&partner(), record.id().as_str(), None)
            .await
            .unwrap();
        submitted(&h, "proc-2").await;
        h.service
            .submit_for_review(&employee(), ItemType::Kyc, "kyc-1", "EG2", None)
            .await
            .unwrap();

        let stats = h.service.review_stats(&manager(), Some("EG1")).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.locked, 1);
        assert_eq!(stats.by_status["signed-off"], 1);

        let all = h.service.review_stats(&manager(), None).await.unwrap();
        assert_eq!(all.total, 3);
    }

    #[tokio::test]
    async fn test_history_falls_back_to_item_id() {
        let h = harness();
        submitted(&h, "proc-1").await;

        let by_item = h
            .service
            .history_for_workflow(&reviewer(), "proc-1", None, None)
            .await
            .unwrap();
        assert_eq!(by_item.total_count, 1);

        let unknown = h
            .service
            .history_for_workflow(&reviewer(), "nothing-here", None, None)
            .await
            .unwrap();
        assert_eq!(unknown.total_count, 0);
    }

    #[tokio::test]
    async fn test_ambiguous_item_reference_is_rejected() {
        let h = harness();
        submitted(&h, "shared-1").await;
        h.service
            .submit_for_review(&employee(), ItemType::Kyc, "shared-1", "EG1", None)
            .await
            .unwrap();

        let err = h
            .service
            .assign_reviewer(&manager(), "shared-1", "R1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_history_listing_paginates() {
        let h = harness();
        for i in 0..3 {
            submitted(&h, &format!("proc-{i}")).await;
        }

        let page = h
            .service
            .list_history(&reviewer(), HistoryFilter::new().with_engagement("EG1"), Some(2), Some(2))
            .await
            .unwrap();

        assert_eq!(page.total_count, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.current_page, 2);
        assert!(page.has_prev);
        assert!(!page.has_next);
    }
}
