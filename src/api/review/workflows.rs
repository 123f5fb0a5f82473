//! Workflow record management: explicit creation, reads, annotations and the
//! ownership-gated override and delete

use axum::extract::{Path, Query, State};
use serde_json::{json, Value};
use tracing::debug;

use super::dto::{
    CreateWorkflowRequest, DueDateRequest, NoteRequest, OverrideRequest, PriorityRequest,
    WorkflowListParams,
};
use crate::api::middleware::RequireCaller;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResponse, Json};
use crate::domain::review::WorkflowRecord;
use crate::infrastructure::services::NewWorkflow;

type RecordResponse = Result<Json<ApiResponse<WorkflowRecord>>, ApiError>;
type ListResponse = Result<Json<ApiResponse<Vec<WorkflowRecord>>>, ApiError>;

/// GET /review/workflows
pub async fn list_workflows(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Query(params): Query<WorkflowListParams>,
) -> ListResponse {
    let filter = params.to_filter()?;
    let page = state
        .review_service
        .list_workflows(&caller, filter, params.page, params.limit)
        .await?;

    Ok(Json(ApiResponse::paged(page)))
}

/// GET /review/workflows/engagement/{engagement_id}
pub async fn list_engagement_workflows(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(engagement_id): Path<String>,
    Query(params): Query<WorkflowListParams>,
) -> ListResponse {
    let filter = params.to_filter()?.with_engagement(engagement_id);
    let page = state
        .review_service
        .list_workflows(&caller, filter, params.page, params.limit)
        .await?;

    Ok(Json(ApiResponse::paged(page)))
}

/// POST /review/workflows
pub async fn create_workflow(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Json(request): Json<CreateWorkflowRequest>,
) -> RecordResponse {
    debug!(item_type = %request.item_type, item_id = %request.item_id, "Creating workflow");

    let record = state
        .review_service
        .create_workflow(
            &caller,
            NewWorkflow {
                item_type: request.item_type,
                item_id: request.item_id,
                engagement: request.engagement_id,
                priority: request.priority,
                due_date: request.due_date,
                tags: request.tags,
            },
        )
        .await?;

    Ok(Json(ApiResponse::ok(record)))
}

/// GET /review/workflows/{workflow_id}
pub async fn get_workflow(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(workflow_id): Path<String>,
) -> RecordResponse {
    let record = state.review_service.get_workflow(&caller, &workflow_id).await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// PUT /review/workflows/{workflow_id}
pub async fn update_workflow(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(workflow_id): Path<String>,
    Json(request): Json<OverrideRequest>,
) -> RecordResponse {
    debug!(workflow_id = %workflow_id, user_id = %caller.user_id, "Overriding workflow");

    let record = state
        .review_service
        .override_workflow(&caller, &workflow_id, request.into())
        .await?;

    Ok(Json(ApiResponse::ok(record)))
}

/// DELETE /review/workflows/{workflow_id}
pub async fn delete_workflow(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(workflow_id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    state
        .review_service
        .delete_workflow(&caller, &workflow_id)
        .await?;

    Ok(Json(ApiResponse::ok(json!({
        "deleted": true,
        "id": workflow_id
    }))))
}

/// POST /review/workflows/{workflow_id}/notes
pub async fn add_note(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(workflow_id): Path<String>,
    Json(request): Json<NoteRequest>,
) -> RecordResponse {
    let record = state
        .review_service
        .add_note(&caller, &workflow_id, &request.text)
        .await?;

    Ok(Json(ApiResponse::ok(record)))
}

/// PUT /review/workflows/{workflow_id}/priority
pub async fn set_priority(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(workflow_id): Path<String>,
    Json(request): Json<PriorityRequest>,
) -> RecordResponse {
    let record = state
        .review_service
        .set_priority(&caller, &workflow_id, request.priority)
        .await?;

    Ok(Json(ApiResponse::ok(record)))
}

/// PUT /review/workflows/{workflow_id}/due-date
pub async fn set_due_date(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(workflow_id): Path<String>,
    Json(request): Json<DueDateRequest>,
) -> RecordResponse {
    let record = state
        .review_service
        .set_due_date(&caller, &workflow_id, request.due_date)
        .await?;

    Ok(Json(ApiResponse::ok(record)))
}
