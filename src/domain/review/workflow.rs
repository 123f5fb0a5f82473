//! Workflow record entity and its review state machine

use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::item_type::ItemType;
use super::status::{Priority, ReviewStatus};
use crate::domain::storage::{StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Maximum length for workflow IDs
pub const MAX_ID_LENGTH: usize = 64;

/// Maximum length of a single note
pub const MAX_NOTE_LENGTH: usize = 4000;

static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]*$").unwrap());

/// Workflow record identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowId(String);

impl WorkflowId {
    /// Create a validated workflow ID
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();

        if id.is_empty() || id.len() > MAX_ID_LENGTH || !ID_PATTERN.is_match(&id) {
            return Err(DomainError::validation(format!(
                "Invalid workflow ID '{}': expected up to {} alphanumeric, '-' or '_' characters",
                id, MAX_ID_LENGTH
            )));
        }

        Ok(Self(id))
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorkflowId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkflowId> for String {
    fn from(id: WorkflowId) -> Self {
        id.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for WorkflowId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Free-form note attached to a workflow record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNote {
    pub text: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// Fields the ownership-gated override may rewrite
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowOverride {
    pub status: Option<ReviewStatus>,
    pub review_comments: Option<String>,
    pub sign_off_comments: Option<String>,
    pub reopen_reason: Option<String>,
}

impl WorkflowOverride {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.review_comments.is_none()
            && self.sign_off_comments.is_none()
            && self.reopen_reason.is_none()
    }
}

/// Mutable review state of one reviewable item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecord {
    id: WorkflowId,
    item_type: ItemType,
    item_id: String,
    engagement: String,
    status: ReviewStatus,

    assigned_reviewer: Option<String>,
    assigned_at: Option<DateTime<Utc>>,

    submitted_for_review_at: Option<DateTime<Utc>>,
    submitted_by: Option<String>,

    reviewed_at: Option<DateTime<Utc>>,
    reviewed_by: Option<String>,
    review_comments: Option<String>,

    approved_at: Option<DateTime<Utc>>,
    approved_by: Option<String>,

    signed_off_at: Option<DateTime<Utc>>,
    signed_off_by: Option<String>,
    sign_off_comments: Option<String>,

    is_locked: bool,
    locked_at: Option<DateTime<Utc>>,
    locked_by: Option<String>,

    reopened_at: Option<DateTime<Utc>>,
    reopened_by: Option<String>,
    reopen_reason: Option<String>,

    version: u32,
    previous_version: Option<u32>,

    priority: Priority,
    due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    notes: Vec<WorkflowNote>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StorageEntity for WorkflowRecord {
    type Key = WorkflowId;
    const KIND: &'static str = "Workflow";

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl WorkflowRecord {
    /// Create a fresh record in `in-progress`
    pub fn new(item_type: ItemType, item_id: impl Into<String>, engagement: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id: WorkflowId::generate(),
            item_type,
            item_id: item_id.into(),
            engagement: engagement.into(),
            status: ReviewStatus::InProgress,
            assigned_reviewer: None,
            assigned_at: None,
            submitted_for_review_at: None,
            submitted_by: None,
            reviewed_at: None,
            reviewed_by: None,
            review_comments: None,
            approved_at: None,
            approved_by: None,
            signed_off_at: None,
            signed_off_by: None,
            sign_off_comments: None,
            is_locked: false,
            locked_at: None,
            locked_by: None,
            reopened_at: None,
            reopened_by: None,
            reopen_reason: None,
            version: 1,
            previous_version: None,
            priority: Priority::default(),
            due_date: None,
            tags: Vec::new(),
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    // Getters

    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn engagement(&self) -> &str {
        &self.engagement
    }

    pub fn status(&self) -> ReviewStatus {
        self.status
    }

    pub fn assigned_reviewer(&self) -> Option<&str> {
        self.assigned_reviewer.as_deref()
    }

    pub fn assigned_at(&self) -> Option<DateTime<Utc>> {
        self.assigned_at
    }

    pub fn submitted_for_review_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_for_review_at
    }

    pub fn submitted_by(&self) -> Option<&str> {
        self.submitted_by.as_deref()
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    pub fn reviewed_by(&self) -> Option<&str> {
        self.reviewed_by.as_deref()
    }

    pub fn review_comments(&self) -> Option<&str> {
        self.review_comments.as_deref()
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn approved_by(&self) -> Option<&str> {
        self.approved_by.as_deref()
    }

    pub fn signed_off_at(&self) -> Option<DateTime<Utc>> {
        self.signed_off_at
    }

    pub fn signed_off_by(&self) -> Option<&str> {
        self.signed_off_by.as_deref()
    }

    pub fn sign_off_comments(&self) -> Option<&str> {
        self.sign_off_comments.as_deref()
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    pub fn locked_at(&self) -> Option<DateTime<Utc>> {
        self.locked_at
    }

    pub fn locked_by(&self) -> Option<&str> {
        self.locked_by.as_deref()
    }

    pub fn reopened_at(&self) -> Option<DateTime<Utc>> {
        self.reopened_at
    }

    pub fn reopened_by(&self) -> Option<&str> {
        self.reopened_by.as_deref()
    }

    pub fn reopen_reason(&self) -> Option<&str> {
        self.reopen_reason.as_deref()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn previous_version(&self) -> Option<u32> {
        self.previous_version
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn notes(&self) -> &[WorkflowNote] {
        &self.notes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Due date has passed and the item is not yet signed off
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != ReviewStatus::SignedOff && self.due_date.is_some_and(|due| due < now)
    }

    /// Whether `user_id` performed any recorded action on this record
    pub fn has_acted(&self, user_id: &str) -> bool {
        [
            &self.reviewed_by,
            &self.approved_by,
            &self.signed_off_by,
            &self.reopened_by,
            &self.assigned_reviewer,
        ]
        .into_iter()
        .any(|actor| actor.as_deref() == Some(user_id))
    }

    // Transitions. Each returns the status held before the call.

    pub fn submit_for_review(
        &mut self,
        submitted_by: &str,
        now: DateTime<Utc>,
    ) -> Result<ReviewStatus, DomainError> {
        if self.is_locked {
            return Err(DomainError::precondition_failed(
                "Item is locked and cannot be submitted for review",
                self.status,
            ));
        }

        if self.status.is_pending_review() {
            return Err(DomainError::precondition_failed(
                "Item is already submitted for review",
                self.status,
            ));
        }

        if !self.status.accepts_submission() {
            return Err(DomainError::precondition_failed(
                format!("Cannot submit an item in status '{}' for review", self.status),
                self.status,
            ));
        }

        let previous = self.status;
        self.status = ReviewStatus::ReadyForReview;
        self.submitted_for_review_at = Some(now);
        self.submitted_by = Some(submitted_by.to_string());
        self.updated_at = now;

        Ok(previous)
    }

    pub fn assign_reviewer(
        &mut self,
        reviewer: &str,
        now: DateTime<Utc>,
    ) -> Result<ReviewStatus, DomainError> {
        self.require_status(ReviewStatus::ReadyForReview, "assign a reviewer")?;

        let previous = self.status;
        self.status = ReviewStatus::UnderReview;
        self.assigned_reviewer = Some(reviewer.to_string());
        self.assigned_at = Some(now);
        self.updated_at = now;

        Ok(previous)
    }

    pub fn complete_review(
        &mut self,
        approved: bool,
        reviewer: &str,
        comments: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ReviewStatus, DomainError> {
        self.require_status(ReviewStatus::UnderReview, "perform a review")?;

        let previous = self.status;
        self.reviewed_at = Some(now);
        self.reviewed_by = Some(reviewer.to_string());
        self.review_comments = comments;

        if approved {
            self.status = ReviewStatus::Approved;
            self.approved_at = Some(now);
            self.approved_by = Some(reviewer.to_string());
        } else {
            self.status = ReviewStatus::Rejected;
        }

        self.updated_at = now;
        Ok(previous)
    }

    pub fn sign_off(
        &mut self,
        signer: &str,
        comments: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ReviewStatus, DomainError> {
        self.require_status(ReviewStatus::Approved, "sign off")?;

        let previous = self.status;
        self.status = ReviewStatus::SignedOff;
        self.signed_off_at = Some(now);
        self.signed_off_by = Some(signer.to_string());
        self.sign_off_comments = comments;
        self.lock(signer, now);
        self.updated_at = now;

        Ok(previous)
    }

    pub fn reopen(
        &mut self,
        reopened_by: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ReviewStatus, DomainError> {
        self.require_status(ReviewStatus::SignedOff, "reopen")?;

        let previous = self.status;
        self.status = ReviewStatus::ReOpened;
        self.unlock();
        self.previous_version = Some(self.version);
        self.version += 1;
        self.reopened_at = Some(now);
        self.reopened_by = Some(reopened_by.to_string());
        self.reopen_reason = reason;
        self.updated_at = now;

        Ok(previous)
    }

    /// Rewrite fields outside the guarded transitions. The actor becomes the
    /// reviewer of record and status side fields follow the requested status.
    pub fn apply_override(
        &mut self,
        patch: WorkflowOverride,
        actor: &str,
        now: DateTime<Utc>,
    ) -> ReviewStatus {
        let previous = self.status;

        if let Some(status) = patch.status {
            self.status = status;
            let actor = Some(actor.to_string());

            match status {
                ReviewStatus::InProgress => {}
                ReviewStatus::ReadyForReview => {
                    self.submitted_for_review_at = Some(now);
                    self.submitted_by = actor;
                }
                ReviewStatus::UnderReview => {
                    self.assigned_at = Some(now);
                }
                ReviewStatus::Approved => {
                    self.reviewed_at = Some(now);
                    self.approved_at = Some(now);
                    self.approved_by = actor;
                }
                ReviewStatus::Rejected => {
                    self.reviewed_at = Some(now);
                }
                ReviewStatus::SignedOff => {
                    self.signed_off_at = Some(now);
                    self.signed_off_by = actor;
                }
                ReviewStatus::ReOpened => {
                    self.reopened_at = Some(now);
                    self.reopened_by = actor;
                }
            }
        }

        if let Some(comments) = patch.review_comments {
            self.review_comments = Some(comments);
        }

        if let Some(comments) = patch.sign_off_comments {
            self.sign_off_comments = Some(comments);
        }

        if let Some(reason) = patch.reopen_reason {
            self.reopen_reason = Some(reason);
        }

        self.reviewed_by = Some(actor.to_string());
        self.assigned_reviewer = Some(actor.to_string());
        self.updated_at = now;

        previous
    }

    pub fn add_note(
        &mut self,
        text: &str,
        author: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let text = text.trim();

        if text.is_empty() {
            return Err(DomainError::validation("Note text cannot be empty"));
        }

        if text.len() > MAX_NOTE_LENGTH {
            return Err(DomainError::validation(format!(
                "Note exceeds maximum length of {} characters",
                MAX_NOTE_LENGTH
            )));
        }

        self.notes.push(WorkflowNote {
            text: text.to_string(),
            author: author.to_string(),
            created_at: now,
        });
        self.updated_at = now;

        Ok(())
    }

    /// Returns the previous priority
    pub fn set_priority(
        &mut self,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Result<Priority, DomainError> {
        self.require_unlocked("change priority")?;

        let previous = self.priority;
        self.priority = priority;
        self.updated_at = now;

        Ok(previous)
    }

    /// Returns the previous due date
    pub fn set_due_date(
        &mut self,
        due_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, DomainError> {
        self.require_unlocked("change the due date")?;

        let previous = self.due_date;
        self.due_date = due_date;
        self.updated_at = now;

        Ok(previous)
    }

    /// Pre-save hook: a record is locked exactly when it is signed off
    pub fn enforce_lock_invariant(&mut self, now: DateTime<Utc>) {
        match self.status {
            ReviewStatus::SignedOff if !self.is_locked => {
                self.is_locked = true;
                self.locked_at = Some(now);
                self.locked_by = self.signed_off_by.clone();
            }
            ReviewStatus::SignedOff => {}
            _ if self.is_locked => self.unlock(),
            _ => {}
        }
    }

    fn lock(&mut self, by: &str, now: DateTime<Utc>) {
        self.is_locked = true;
        self.locked_at = Some(now);
        self.locked_by = Some(by.to_string());
    }

    fn unlock(&mut self) {
        self.is_locked = false;
        self.locked_at = None;
        self.locked_by = None;
    }

    fn require_status(&self, expected: ReviewStatus, operation: &str) -> Result<(), DomainError> {
        if self.status != expected {
            return Err(DomainError::precondition_failed(
                format!("Cannot {} unless status is '{}'", operation, expected),
                self.status,
            ));
        }

        Ok(())
    }

    fn require_unlocked(&self, operation: &str) -> Result<(), DomainError> {
        if self.is_locked {
            return Err(DomainError::precondition_failed(
                format!("Item is locked; cannot {}", operation),
                self.status,
            ));
        }

        Ok(())
    }
}
