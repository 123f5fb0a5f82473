//! Notification payload sent to the portal's delivery service

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::review::{HistoryAction, WorkflowRecord};

/// Notification urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
}

/// One user or a set of users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    pub fn is_empty(&self) -> bool {
        match self {
            Recipients::One(id) => id.is_empty(),
            Recipients::Many(ids) => ids.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Recipients::One(_) => 1,
            Recipients::Many(ids) => ids.len(),
        }
    }
}

/// Notification as accepted by the delivery service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "userId")]
    pub recipients: Recipients,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub module: String,
    pub priority: NotificationPriority,
    #[serde(default)]
    pub data: Value,
    pub action_url: Option<String>,
    pub document_id: Option<String>,
}

impl Notification {
    /// Review notification about `record`, pre-filled with its identity
    pub fn for_workflow(
        recipients: Recipients,
        record: &WorkflowRecord,
        action: HistoryAction,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipients,
            title: title.into(),
            message: message.into(),
            kind: action.as_str().to_string(),
            category: "review".to_string(),
            module: record.item_type().as_str().to_string(),
            priority: NotificationPriority::Normal,
            data: json!({
                "workflowId": record.id().as_str(),
                "itemType": record.item_type(),
                "itemId": record.item_id(),
                "engagementId": record.engagement(),
                "status": record.status(),
            }),
            action_url: Some(format!(
                "/engagements/{}/review/{}",
                record.engagement(),
                record.id()
            )),
            document_id: Some(record.item_id().to_string()),
        }
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::review::ItemType;

    #[test]
    fn test_wire_shape() {
        let record = WorkflowRecord::new(ItemType::Pbc, "pbc-3", "EG2");
        let notification = Notification::for_workflow(
            Recipients::Many(vec!["M1".into(), "P1".into()]),
            &record,
            HistoryAction::SubmittedForReview,
            "Item ready for review",
            "pbc-3 was submitted",
        )
        .with_priority(NotificationPriority::High);

        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["userId"], json!(["M1", "P1"]));
        assert_eq!(value["type"], "submitted-for-review");
        assert_eq!(value["module"], "pbc");
        assert_eq!(value["priority"], "high");
        assert_eq!(value["data"]["itemId"], "pbc-3");
        assert_eq!(value["documentId"], "pbc-3");
        assert!(value["actionUrl"].as_str().unwrap().starts_with("/engagements/EG2/review/"));
    }

    #[test]
    fn test_single_recipient_serializes_as_string() {
        let value = serde_json::to_value(Recipients::One("R1".into())).unwrap();
        assert_eq!(value, json!("R1"));
    }
}
