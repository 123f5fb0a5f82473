//! Queue, history and statistics reads

use axum::extract::{Path, Query, State};

use super::dto::{parse_statuses, HistoryParams, PageParams, QueueParams, StatsParams};
use crate::api::middleware::RequireCaller;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResponse, Json};
use crate::domain::review::{HistoryEntry, ReviewStats, WorkflowRecord};
use crate::infrastructure::services::QueueQuery;

/// GET /review/queue
pub async fn review_queue(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Query(params): Query<QueueParams>,
) -> Result<Json<ApiResponse<Vec<WorkflowRecord>>>, ApiError> {
    let query = QueueQuery {
        statuses: parse_statuses(params.status.as_deref())?,
        reviewer: params.reviewer_id,
        engagement: params.engagement_id,
        page: params.page,
        limit: params.limit,
    };

    let page = state.review_service.review_queue(&caller, query).await?;
    Ok(Json(ApiResponse::paged(page)))
}

/// GET /review/history/{item_id}; the path value is tried as a workflow ID, then an item ID
pub async fn item_history(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(item_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<ApiResponse<Vec<HistoryEntry>>>, ApiError> {
    let page = state
        .review_service
        .history_for_workflow(&caller, &item_id, params.page, params.limit)
        .await?;

    Ok(Json(ApiResponse::paged(page)))
}

/// GET /review/history
pub async fn list_history(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ApiResponse<Vec<HistoryEntry>>>, ApiError> {
    let filter = params.to_filter()?;
    let page = state
        .review_service
        .list_history(&caller, filter, params.page, params.limit)
        .await?;

    Ok(Json(ApiResponse::paged(page)))
}

/// GET /review/engagement/{engagement_id}
pub async fn engagement_history(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Path(engagement_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ApiResponse<Vec<HistoryEntry>>>, ApiError> {
    let filter = params.to_filter()?.with_engagement(engagement_id);
    let page = state
        .review_service
        .list_history(&caller, filter, params.page, params.limit)
        .await?;

    Ok(Json(ApiResponse::paged(page)))
}

/// GET /review/stats
pub async fn review_stats(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Query(params): Query<StatsParams>,
) -> Result<Json<ApiResponse<ReviewStats>>, ApiError> {
    let stats = state
        .review_service
        .review_stats(&caller, params.engagement_id.as_deref())
        .await?;

    Ok(Json(ApiResponse::ok(stats)))
}
