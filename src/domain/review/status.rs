//! Review lifecycle states, priorities and ledger actions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Lifecycle state of a workflow record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewStatus {
    #[default]
    InProgress,
    ReadyForReview,
    UnderReview,
    Approved,
    Rejected,
    SignedOff,
    ReOpened,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 7] = [
        ReviewStatus::InProgress,
        ReviewStatus::ReadyForReview,
        ReviewStatus::UnderReview,
        ReviewStatus::Approved,
        ReviewStatus::Rejected,
        ReviewStatus::SignedOff,
        ReviewStatus::ReOpened,
    ];

    /// Statuses shown in the review queue when no status filter is given
    pub const QUEUE_DEFAULT: [ReviewStatus; 2] =
        [ReviewStatus::ReadyForReview, ReviewStatus::UnderReview];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::InProgress => "in-progress",
            ReviewStatus::ReadyForReview => "ready-for-review",
            ReviewStatus::UnderReview => "under-review",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::SignedOff => "signed-off",
            ReviewStatus::ReOpened => "re-opened",
        }
    }

    /// Waiting on a reviewer
    pub fn is_pending_review(&self) -> bool {
        matches!(self, ReviewStatus::ReadyForReview | ReviewStatus::UnderReview)
    }

    /// States from which an item may be (re)submitted
    pub fn accepts_submission(&self) -> bool {
        matches!(
            self,
            ReviewStatus::InProgress | ReviewStatus::Rejected | ReviewStatus::ReOpened
        )
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReviewStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("Invalid review status: {}", s)))
    }
}

/// Priority of a workflow record; ordering follows urgency
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(DomainError::validation(format!("Invalid priority: {}", s))),
        }
    }
}

/// Action recorded in the history ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryAction {
    SubmittedForReview,
    AssignedReviewer,
    ReviewStarted,
    ReviewCompleted,
    ReviewApproved,
    ReviewRejected,
    SignedOff,
    Reopened,
    StatusChanged,
    CommentAdded,
    PriorityChanged,
    DueDateChanged,
}

impl HistoryAction {
    pub const ALL: [HistoryAction; 12] = [
        HistoryAction::SubmittedForReview,
        HistoryAction::AssignedReviewer,
        HistoryAction::ReviewStarted,
        HistoryAction::ReviewCompleted,
        HistoryAction::ReviewApproved,
        HistoryAction::ReviewRejected,
        HistoryAction::SignedOff,
        HistoryAction::Reopened,
        HistoryAction::StatusChanged,
        HistoryAction::CommentAdded,
        HistoryAction::PriorityChanged,
        HistoryAction::DueDateChanged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::SubmittedForReview => "submitted-for-review",
            HistoryAction::AssignedReviewer => "assigned-reviewer",
            HistoryAction::ReviewStarted => "review-started",
            HistoryAction::ReviewCompleted => "review-completed",
            HistoryAction::ReviewApproved => "review-approved",
            HistoryAction::ReviewRejected => "review-rejected",
            HistoryAction::SignedOff => "signed-off",
            HistoryAction::Reopened => "reopened",
            HistoryAction::StatusChanged => "status-changed",
            HistoryAction::CommentAdded => "comment-added",
            HistoryAction::PriorityChanged => "priority-changed",
            HistoryAction::DueDateChanged => "due-date-changed",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HistoryAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HistoryAction::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("Invalid history action: {}", s)))
    }
}
