//! Request bodies and query parameters for the review routes

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::review::{
    HistoryAction, HistoryFilter, ItemType, Priority, ReviewStatus, WorkflowFilter,
    WorkflowOverride,
};
use crate::domain::DomainError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub engagement_id: String,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    #[serde(default)]
    pub reviewer_id: String,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformReviewRequest {
    pub approved: bool,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOffRequest {
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReopenRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowRequest {
    pub item_type: ItemType,
    pub item_id: String,
    pub engagement_id: String,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRequest {
    pub status: Option<ReviewStatus>,
    pub review_comments: Option<String>,
    pub sign_off_comments: Option<String>,
    pub reopen_reason: Option<String>,
}

impl From<OverrideRequest> for WorkflowOverride {
    fn from(request: OverrideRequest) -> Self {
        Self {
            status: request.status,
            review_comments: request.review_comments,
            sign_off_comments: request.sign_off_comments,
            reopen_reason: request.reopen_reason,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteRequest {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriorityRequest {
    pub priority: Priority,
}

/// `dueDate: null` clears the due date
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueDateRequest {
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Comma-separated status list, e.g. `ready-for-review,under-review`
pub fn parse_statuses(raw: Option<&str>) -> Result<Option<Vec<ReviewStatus>>, DomainError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    raw.split(',')
        .map(|s| s.trim().parse::<ReviewStatus>())
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueParams {
    pub reviewer_id: Option<String>,
    pub status: Option<String>,
    pub engagement_id: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowListParams {
    pub status: Option<String>,
    pub engagement_id: Option<String>,
    pub reviewer_id: Option<String>,
    pub item_type: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl WorkflowListParams {
    pub fn to_filter(&self) -> Result<WorkflowFilter, DomainError> {
        let mut filter = WorkflowFilter::new();

        if let Some(statuses) = parse_statuses(self.status.as_deref())? {
            filter = filter.with_statuses(statuses);
        }

        if let Some(engagement) = &self.engagement_id {
            filter = filter.with_engagement(engagement.clone());
        }

        if let Some(reviewer) = &self.reviewer_id {
            filter = filter.with_reviewer(reviewer.clone());
        }

        if let Some(item_type) = &self.item_type {
            filter = filter.with_item_type(item_type.parse()?);
        }

        Ok(filter)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub action: Option<String>,
    pub performed_by: Option<String>,
    pub item_type: Option<String>,
    pub item_id: Option<String>,
    pub engagement_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl HistoryParams {
    pub fn to_filter(&self) -> Result<HistoryFilter, DomainError> {
        let mut filter = HistoryFilter::new();

        if let Some(action) = &self.action {
            filter = filter.with_action(action.parse::<HistoryAction>()?);
        }

        if let Some(user) = &self.performed_by {
            filter = filter.with_performed_by(user.clone());
        }

        match (&self.item_type, &self.item_id) {
            (Some(item_type), Some(item_id)) => {
                filter = filter.for_item(item_type.parse()?, item_id.clone());
            }
            (None, Some(item_id)) => filter = filter.with_item_id(item_id.clone()),
            (Some(_), None) => {
                return Err(DomainError::validation("itemType filter requires itemId"));
            }
            (None, None) => {}
        }

        if let Some(engagement) = &self.engagement_id {
            filter = filter.with_engagement(engagement.clone());
        }

        if let Some(since) = self.since {
            filter = filter.since(since);
        }

        Ok(filter)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
    pub engagement_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}
