//! Guarded lifecycle transitions

use axum::{
    body::Bytes,
    extract::{Path, State},
};
use tracing::debug;

use super::dto::{AssignRequest, PerformReviewRequest, ReopenRequest, SignOffRequest, SubmitRequest};
use crate::api::middleware::RequireCaller;
use crate::api::state::AppState;
use crate::api::types::{optional_body, ApiError, ApiResponse, Json};
use crate::domain::review::{ItemType, WorkflowRecord};

type RecordResponse = Result<Json<ApiResponse<WorkflowRecord>>, ApiError>;

/// POST /review/submit/{item_type}/{item_id}
pub async fn submit_for_review(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path((item_type, item_id)): Path<(String, String)>,
    Json(request): Json<SubmitRequest>,
) -> RecordResponse {
    let item_type: ItemType = item_type.parse()?;
    debug!(%item_type, item_id = %item_id, user_id = %caller.user_id, "Submitting item for review");

    let record = state
        .review_service
        .submit_for_review(
            &caller,
            item_type,
            &item_id,
            &request.engagement_id,
            request.comments,
        )
        .await?;

    Ok(Json(ApiResponse::ok(record)))
}

/// POST /review/assign/{item_id}
pub async fn assign_reviewer(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(item_id): Path<String>,
    Json(request): Json<AssignRequest>,
) -> RecordResponse {
    debug!(item_id = %item_id, reviewer_id = %request.reviewer_id, "Assigning reviewer");

    let record = state
        .review_service
        .assign_reviewer(&caller, &item_id, &request.reviewer_id, request.comments)
        .await?;

    Ok(Json(ApiResponse::ok(record)))
}

/// POST /review/perform/{item_id}
pub async fn perform_review(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(item_id): Path<String>,
    Json(request): Json<PerformReviewRequest>,
) -> RecordResponse {
    debug!(item_id = %item_id, approved = request.approved, "Performing review");

    let record = state
        .review_service
        .perform_review(&caller, &item_id, request.approved, request.comments)
        .await?;

    Ok(Json(ApiResponse::ok(record)))
}

/// POST /review/signoff/{item_id}; the body is optional
pub async fn sign_off(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(item_id): Path<String>,
    body: Bytes,
) -> RecordResponse {
    let request: SignOffRequest = optional_body(&body)?;
    debug!(item_id = %item_id, "Signing off");

    let record = state
        .review_service
        .sign_off(&caller, &item_id, request.comments)
        .await?;

    Ok(Json(ApiResponse::ok(record)))
}

/// POST /review/reopen/{item_id}; the body is optional
pub async fn reopen(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(item_id): Path<String>,
    body: Bytes,
) -> RecordResponse {
    let request: ReopenRequest = optional_body(&body)?;
    debug!(item_id = %item_id, "Reopening");

    let record = state
        .review_service
        .reopen(&caller, &item_id, request.reason)
        .await?;

    Ok(Json(ApiResponse::ok(record)))
}
