//! Role/action capability table for review operations

use serde::Serialize;

use crate::domain::user::{Caller, Role};
use crate::domain::DomainError;

/// Operation a caller may attempt on the review workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    SubmitForReview,
    AssignReviewer,
    PerformReview,
    SignOff,
    Reopen,
    Annotate,
    ViewQueue,
    ViewHistory,
    ViewStats,
    OverrideWorkflow,
    DeleteWorkflow,
}

impl ReviewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewAction::SubmitForReview => "submit_for_review",
            ReviewAction::AssignReviewer => "assign_reviewer",
            ReviewAction::PerformReview => "perform_review",
            ReviewAction::SignOff => "sign_off",
            ReviewAction::Reopen => "reopen",
            ReviewAction::Annotate => "annotate",
            ReviewAction::ViewQueue => "view_queue",
            ReviewAction::ViewHistory => "view_history",
            ReviewAction::ViewStats => "view_stats",
            ReviewAction::OverrideWorkflow => "override_workflow",
            ReviewAction::DeleteWorkflow => "delete_workflow",
        }
    }
}

use ReviewAction::*;

const STAFF_ACTIONS: &[ReviewAction] = &[
    SubmitForReview,
    AssignReviewer,
    PerformReview,
    SignOff,
    Reopen,
    Annotate,
    ViewQueue,
    ViewHistory,
    ViewStats,
    DeleteWorkflow,
];

const SUPERVISOR_ACTIONS: &[ReviewAction] = &[
    SubmitForReview,
    AssignReviewer,
    PerformReview,
    SignOff,
    Reopen,
    Annotate,
    ViewQueue,
    ViewHistory,
    ViewStats,
    OverrideWorkflow,
    DeleteWorkflow,
];

const MANAGER_ACTIONS: &[ReviewAction] = &[
    AssignReviewer,
    PerformReview,
    SignOff,
    Annotate,
    ViewQueue,
    ViewHistory,
    ViewStats,
];

/// Declarative capability table
const CAPABILITIES: &[(Role, &[ReviewAction])] = &[
    (Role::Employee, STAFF_ACTIONS),
    (Role::Reviewer, STAFF_ACTIONS),
    (Role::Manager, MANAGER_ACTIONS),
    (Role::Partner, SUPERVISOR_ACTIONS),
    (Role::Admin, SUPERVISOR_ACTIONS),
    (Role::Client, &[]),
];

/// Whether `role` may perform `action`
pub fn can(role: Role, action: ReviewAction) -> bool {
    CAPABILITIES
        .iter()
        .find(|(r, _)| *r == role)
        .is_some_and(|(_, actions)| actions.contains(&action))
}

/// `Forbidden` unless the caller's role grants `action`
pub fn require(caller: &Caller, action: ReviewAction) -> Result<(), DomainError> {
    if can(caller.role, action) {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!(
            "Role '{}' is not permitted to {}",
            caller.role,
            action.as_str().replace('_', " ")
        )))
    }
}
