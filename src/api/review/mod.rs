//! Review workflow endpoints mounted under `/review`

pub mod dto;
pub mod lifecycle;
pub mod queries;
pub mod workflows;

use axum::{
    routing::{get, post, put},
    Router,
};

use super::state::AppState;

/// Create the review router
pub fn create_review_router() -> Router<AppState> {
    Router::new()
        // Lifecycle transitions
        .route(
            "/submit/{item_type}/{item_id}",
            post(lifecycle::submit_for_review),
        )
        .route("/assign/{item_id}", post(lifecycle::assign_reviewer))
        .route("/perform/{item_id}", post(lifecycle::perform_review))
        .route("/signoff/{item_id}", post(lifecycle::sign_off))
        .route("/reopen/{item_id}", post(lifecycle::reopen))
        // Reads
        .route("/queue", get(queries::review_queue))
        .route("/stats", get(queries::review_stats))
        .route("/history", get(queries::list_history))
        .route("/history/{item_id}", get(queries::item_history))
        .route("/engagement/{engagement_id}", get(queries::engagement_history))
        // Workflow records
        .route(
            "/workflows",
            get(workflows::list_workflows).post(workflows::create_workflow),
        )
        .route(
            "/workflows/engagement/{engagement_id}",
            get(workflows::list_engagement_workflows),
        )
        .route(
            "/workflows/{workflow_id}",
            get(workflows::get_workflow)
                .put(workflows::update_workflow)
                .delete(workflows::delete_workflow),
        )
        .route("/workflows/{workflow_id}/notes", post(workflows::add_note))
        .route("/workflows/{workflow_id}/priority", put(workflows::set_priority))
        .route("/workflows/{workflow_id}/due-date", put(workflows::set_due_date))
}
