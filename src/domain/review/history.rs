//! History ledger entries
//!
//! Entries are written once by the orchestrator and never updated; the type
//! exposes no mutators after construction.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::item_type::ItemType;
use super::status::{HistoryAction, ReviewStatus};
use super::workflow::{WorkflowId, WorkflowRecord};
use crate::domain::storage::{StorageEntity, StorageKey};

/// History entry identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryEntryId(String);

impl HistoryEntryId {
    pub fn generate() -> Self {
        Self(format!("hist-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HistoryEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for HistoryEntryId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Request-level context captured alongside each ledger entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub location: Option<String>,
    pub session_id: Option<String>,
    pub system_version: Option<String>,
}

impl AuditContext {
    /// Context for calls originating inside the service
    pub fn system() -> Self {
        Self {
            system_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            ..Default::default()
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// One transition recorded against a workflow record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    id: HistoryEntryId,
    workflow_id: WorkflowId,
    item_type: ItemType,
    item_id: String,
    engagement: String,
    action: HistoryAction,
    performed_by: String,
    performed_at: DateTime<Utc>,
    previous_status: Option<ReviewStatus>,
    new_status: Option<ReviewStatus>,
    comments: Option<String>,
    #[serde(default)]
    metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    audit: AuditContext,
}

impl StorageEntity for HistoryEntry {
    type Key = HistoryEntryId;
    const KIND: &'static str = "History entry";

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl HistoryEntry {
    /// Start an entry for `record`, stamped with the current time
    pub fn for_workflow(
        record: &WorkflowRecord,
        action: HistoryAction,
        performed_by: impl Into<String>,
    ) -> Self {
        Self {
            id: HistoryEntryId::generate(),
            workflow_id: record.id().clone(),
            item_type: record.item_type(),
            item_id: record.item_id().to_string(),
            engagement: record.engagement().to_string(),
            action,
            performed_by: performed_by.into(),
            performed_at: Utc::now(),
            previous_status: None,
            new_status: None,
            comments: None,
            metadata: BTreeMap::new(),
            audit: AuditContext::default(),
        }
    }

    pub fn with_transition(mut self, previous: ReviewStatus, new: ReviewStatus) -> Self {
        self.previous_status = Some(previous);
        self.new_status = Some(new);
        self
    }

    pub fn with_comments(mut self, comments: Option<String>) -> Self {
        self.comments = comments;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_audit(mut self, audit: AuditContext) -> Self {
        self.audit = audit;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_performed_at(mut self, performed_at: DateTime<Utc>) -> Self {
        self.performed_at = performed_at;
        self
    }

    pub fn id(&self) -> &HistoryEntryId {
        &self.id
    }

    pub fn workflow_id(&self) -> &WorkflowId {
        &self.workflow_id
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

    pub fn action(&self) -> HistoryAction {
        self.action
    }

    pub fn performed_by(&self) -> &str {
        &self.performed_by
    }

    pub fn performed_at(&self) -> DateTime<Utc> {
        self.performed_at
    }

    pub fn previous_status(&self) -> Option<ReviewStatus> {
        self.previous_status
    }

    pub fn new_status(&self) -> Option<ReviewStatus> {
        self.new_status
    }

    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref()
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn audit(&self) -> &AuditContext {
        &self.audit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_copies_record_identity() {
        let record = WorkflowRecord::new(ItemType::Kyc, "kyc-7", "EG9");
        let entry = HistoryEntry::for_workflow(&record, HistoryAction::SubmittedForReview, "E1")
            .with_transition(ReviewStatus::InProgress, ReviewStatus::ReadyForReview)
            .with_comments(Some("please review".into()))
            .with_metadata("source", json!("portal"))
            .with_audit(AuditContext::system().with_ip("10.0.0.1"));

        assert_eq!(entry.workflow_id(), record.id());
        assert_eq!(entry.item_type(), ItemType::Kyc);
        assert_eq!(entry.item_id(), "kyc-7");
        assert_eq!(entry.engagement(), "EG9");
        assert_eq!(entry.previous_status(), Some(ReviewStatus::InProgress));
        assert_eq!(entry.new_status(), Some(ReviewStatus::ReadyForReview));
        assert_eq!(entry.metadata()["source"], json!("portal"));
        assert_eq!(entry.audit().ip_address.as_deref(), Some("10.0.0.1"));
        assert!(entry.audit().system_version.is_some());
        assert!(entry.id().as_str().starts_with("hist-"));
    }

    #[test]
    fn test_entry_serializes_wire_names() {
        let record = WorkflowRecord::new(ItemType::Procedure, "proc-1", "EG1");
        let entry = HistoryEntry::for_workflow(&record, HistoryAction::Reopened, "P1")
            .with_transition(ReviewStatus::SignedOff, ReviewStatus::ReOpened);

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["action"], "reopened");
        assert_eq!(value["previousStatus"], "signed-off");
        assert_eq!(value["newStatus"], "re-opened");
        assert_eq!(value["performedBy"], "P1");
    }
}
