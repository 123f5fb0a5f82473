use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::health;
use super::review;
use super::state::AppState;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        // Review workflow API
        .nest("/review", review::create_review_router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::user::{Role, UserProfile};
    use crate::infrastructure::auth::{JwtConfig, JwtService};
    use crate::infrastructure::notification::{LogNotificationSender, NotificationDispatcher};
    use crate::infrastructure::review::{StorageHistoryRepository, StorageWorkflowRepository};
    use crate::infrastructure::services::ReviewService;
    use crate::infrastructure::storage::{InMemoryStorage, StorageFactory};
    use crate::infrastructure::user::InMemoryUserDirectory;

    struct TestApp {
        router: Router,
        jwt: JwtService,
    }

    impl TestApp {
        fn new() -> Self {
            let directory = InMemoryUserDirectory::with_profiles([
                UserProfile::new("E1", "Eli", "eli@firm.test", Role::Employee),
                UserProfile::new("R1", "Rae", "rae@firm.test", Role::Reviewer),
                UserProfile::new("P1", "Pat", "pat@firm.test", Role::Partner),
            ]);

            let service = ReviewService::new(
                Arc::new(StorageWorkflowRepository::new(Arc::new(InMemoryStorage::new()))),
                Arc::new(StorageHistoryRepository::new(Arc::new(InMemoryStorage::new()))),
                Arc::new(directory),
                NotificationDispatcher::new(Arc::new(LogNotificationSender)),
            );

            let jwt = JwtService::new(JwtConfig::new("router-test-secret"));
            let state = AppState::new(
                Arc::new(service),
                Arc::new(jwt.clone()),
                StorageFactory::InMemory,
            );

            Self {
                router: create_router(state),
                jwt,
            }
        }

        fn token(&self, user_id: &str, role: Role) -> String {
            self.jwt.generate(user_id, role).unwrap()
        }

        async fn send(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);

            if let Some(token) = token {
                builder = builder.header("authorization", format!("Bearer {}", token));
            }

            let request = match body {
                Some(body) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };

            (status, json)
        }
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let app = TestApp::new();

        let (status, body) = app.send("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = app.send("GET", "/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"][0]["name"], "storage");
    }

    #[tokio::test]
    async fn test_review_routes_require_token() {
        let app = TestApp::new();

        let (status, body) = app.send("GET", "/review/queue", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = app
            .send("GET", "/review/queue", Some("not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_lifecycle_over_http() {
        let app = TestApp::new();
        let employee = app.token("E1", Role::Employee);
        let reviewer = app.token("R1", Role::Reviewer);
        let partner = app.token("P1", Role::Partner);

        let (status, body) = app
            .send(
                "POST",
                "/review/submit/procedure/proc-1",
                Some(&employee),
                Some(json!({ "engagementId": "EG1", "comments": "ready" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ready-for-review");
        let workflow_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = app
            .send(
                "POST",
                "/review/assign/proc-1",
                Some(&partner),
                Some(json!({ "reviewerId": "R1" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["assignedReviewer"], "R1");

        let (status, body) = app
            .send(
                "POST",
                "/review/perform/proc-1",
                Some(&reviewer),
                Some(json!({ "approved": true, "comments": "looks good" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "approved");

        let (status, body) = app
            .send("POST", "/review/signoff/proc-1", Some(&partner), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "signed-off");
        assert_eq!(body["data"]["isLocked"], true);

        let (status, body) = app
            .send(
                "POST",
                "/review/reopen/proc-1",
                Some(&partner),
                Some(json!({ "reason": "needs fix" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "re-opened");
        assert_eq!(body["data"]["version"], 2);

        let (status, body) = app
            .send(
                "GET",
                &format!("/review/history/{}", workflow_id),
                Some(&reviewer),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["totalCount"], 5);
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_guard_failure_reports_current_status() {
        let app = TestApp::new();
        let employee = app.token("E1", Role::Employee);
        let partner = app.token("P1", Role::Partner);

        app.send(
            "POST",
            "/review/submit/kyc/kyc-1",
            Some(&employee),
            Some(json!({ "engagementId": "EG1" })),
        )
        .await;

        let (status, body) = app
            .send(
                "POST",
                "/review/signoff/kyc-1",
                Some(&partner),
                Some(json!({ "comments": "too early" })),
            )
            .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["type"], "precondition_failed");
        assert_eq!(body["error"]["current_status"], "ready-for-review");
    }

    #[tokio::test]
    async fn test_invalid_item_type_is_bad_request() {
        let app = TestApp::new();
        let employee = app.token("E1", Role::Employee);

        let (status, body) = app
            .send(
                "POST",
                "/review/submit/spreadsheet/x-1",
                Some(&employee),
                Some(json!({ "engagementId": "EG1" })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_client_role_is_forbidden() {
        let app = TestApp::new();
        let client = app.token("C1", Role::Client);

        let (status, _) = app
            .send(
                "POST",
                "/review/submit/pbc/pbc-1",
                Some(&client),
                Some(json!({ "engagementId": "EG1" })),
            )
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_workflow_is_not_found() {
        let app = TestApp::new();
        let reviewer = app.token("R1", Role::Reviewer);

        let (status, body) = app
            .send("GET", "/review/workflows/wf-missing", Some(&reviewer), None)
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "not_found_error");
    }

    #[tokio::test]
    async fn test_workflow_listing_and_queue_pagination() {
        let app = TestApp::new();
        let employee = app.token("E1", Role::Employee);
        let reviewer = app.token("R1", Role::Reviewer);

        for i in 0..3 {
            app.send(
                "POST",
                &format!("/review/submit/checklist-item/cl-{}", i),
                Some(&employee),
                Some(json!({ "engagementId": "EG7" })),
            )
            .await;
        }

        let (status, body) = app
            .send(
                "GET",
                "/review/workflows/engagement/EG7?page=1&limit=2",
                Some(&reviewer),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["pagination"]["totalCount"], 3);
        assert_eq!(body["pagination"]["hasNext"], true);

        let (status, body) = app
            .send(
                "GET",
                "/review/queue?status=ready-for-review",
                Some(&reviewer),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["totalCount"], 3);

        let (status, _) = app
            .send("GET", "/review/queue?status=bogus", Some(&reviewer), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .send("GET", "/review/stats?engagementId=EG7", Some(&reviewer), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["pending"], 3);
    }

    #[tokio::test]
    async fn test_out_of_range_page_returns_empty_listing() {
        let app = TestApp::new();
        let employee = app.token("E1", Role::Employee);
        let reviewer = app.token("R1", Role::Reviewer);

        app.send(
            "POST",
            "/review/submit/procedure/proc-1",
            Some(&employee),
            Some(json!({ "engagementId": "EG1" })),
        )
        .await;

        for path in ["/review/queue", "/review/workflows", "/review/history"] {
            let (status, body) = app
                .send(
                    "GET",
                    &format!("{}?page={}", path, u64::MAX),
                    Some(&reviewer),
                    None,
                )
                .await;

            assert_eq!(status, StatusCode::OK, "{path}");
            assert!(body["data"].as_array().unwrap().is_empty(), "{path}");
            assert_eq!(body["pagination"]["totalCount"], 1, "{path}");
            assert_eq!(body["pagination"]["hasNext"], false, "{path}");
        }
    }

    #[tokio::test]
    async fn test_annotations_and_delete() {
        let app = TestApp::new();
        let employee = app.token("E1", Role::Employee);
        let reviewer = app.token("R1", Role::Reviewer);
        let partner = app.token("P1", Role::Partner);

        let (_, body) = app
            .send(
                "POST",
                "/review/workflows",
                Some(&employee),
                Some(json!({
                    "itemType": "document-request",
                    "itemId": "dr-1",
                    "engagementId": "EG1",
                    "priority": "high",
                    "tags": ["year-end"]
                })),
            )
            .await;
        assert_eq!(body["data"]["status"], "in-progress");
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = app
            .send(
                "POST",
                &format!("/review/workflows/{}/notes", id),
                Some(&reviewer),
                Some(json!({ "text": "check the bank letter" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["notes"][0]["text"], "check the bank letter");

        let (status, body) = app
            .send(
                "PUT",
                &format!("/review/workflows/{}/priority", id),
                Some(&reviewer),
                Some(json!({ "priority": "critical" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["priority"], "critical");

        let (status, body) = app
            .send(
                "PUT",
                &format!("/review/workflows/{}/due-date", id),
                Some(&reviewer),
                Some(json!({ "dueDate": "2030-01-31T00:00:00Z" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["dueDate"].as_str().unwrap().starts_with("2030-01-31"));

        // Nobody has acted on the record yet
        let (status, _) = app
            .send("DELETE", &format!("/review/workflows/{}", id), Some(&partner), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .send(
                "GET",
                "/review/history?action=priority-changed",
                Some(&reviewer),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["totalCount"], 1);
        assert_eq!(body["data"][0]["metadata"]["to"], "critical");
    }
}
