//! HTTP Routes
//!
//! API Endpoints（除 ping 外均为 POST + JSON body）:
//! - /api/ping                    GET   健康检查
//! - /api/revision/start          开始修订
//! - /api/revision/get            获取修订
//! - /api/revision/active         获取某本书进行中的修订
//! - /api/revision/progress       修订进度
//! - /api/revision/complete       完成修订（需在容差区间内）
//! - /api/revision/abandon        放弃修订
//! - /api/proposal/list           提案列表（优先级顺序）
//! - /api/proposal/get            提案详情
//! - /api/proposal/generate       生成章节提案
//! - /api/proposal/approve        批准提案
//! - /api/proposal/reject         拒绝提案
//! - /api/batch/generate_all      依次生成所有 pending 提案
//! - /api/batch/approve_all       依次批准所有 ready 提案
//! - /api/batch/status            批量操作进度

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/revision", revision_routes())
        .nest("/proposal", proposal_routes())
        .nest("/batch", batch_routes())
}

/// Revision 路由
fn revision_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start", post(handlers::start_revision))
        .route("/get", post(handlers::get_revision))
        .route("/active", post(handlers::get_active_revision))
        .route("/progress", post(handlers::get_progress))
        .route("/complete", post(handlers::complete_revision))
        .route("/abandon", post(handlers::abandon_revision))
}

/// Proposal 路由
fn proposal_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", post(handlers::list_proposals))
        .route("/get", post(handlers::get_proposal))
        .route("/generate", post(handlers::generate_proposal))
        .route("/approve", post(handlers::approve_proposal))
        .route("/reject", post(handlers::reject_proposal))
}

/// Batch 路由
fn batch_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate_all", post(handlers::generate_all))
        .route("/approve_all", post(handlers::approve_all))
        .route("/status", post(handlers::batch_status))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use crate::infrastructure::http::build_router;
    use crate::test_support::{chapter, Fixture};

    async fn call(app: &axum::Router, uri: &str, body: Value) -> Value {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let fx = Fixture::new().await;
        let app = build_router(std::sync::Arc::new(fx.app_state()));

        let request = Request::builder()
            .uri("/api/ping")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["condenser_available"], true);
    }

    #[tokio::test]
    async fn test_revision_flow_over_http() {
        let fx = Fixture::new().await;
        let (book_id, ids) = fx.add_book(vec![chapter(0, 100, None, None)]);
        let app = build_router(std::sync::Arc::new(fx.app_state()));

        let started = call(
            &app,
            "/api/revision/start",
            json!({ "book_id": book_id, "target_word_count": 80 }),
        )
        .await;
        assert_eq!(started["errno"], 0);
        assert_eq!(started["data"]["status"], "active");
        assert_eq!(started["data"]["tolerance_percent"], 5.0);
        let revision_id = started["data"]["id"].as_str().unwrap().to_string();

        let listed = call(
            &app,
            "/api/proposal/list",
            json!({ "revision_id": revision_id }),
        )
        .await;
        assert_eq!(listed["data"][0]["status"], "pending");
        assert_eq!(listed["data"][0]["target_word_count"], 80);

        let chapter = json!({ "revision_id": revision_id, "chapter_id": ids[0] });
        let generated = call(&app, "/api/proposal/generate", chapter.clone()).await;
        assert_eq!(generated["data"]["status"], "ready");
        assert_eq!(generated["data"]["condensed_word_count"], 80);

        let approved = call(&app, "/api/proposal/approve", chapter.clone()).await;
        assert_eq!(approved["errno"], 0);
        assert_eq!(approved["data"]["revision"]["words_cut_so_far"], 20);

        let again = call(&app, "/api/proposal/approve", chapter).await;
        assert_eq!(again["errno"], 409);
        assert!(again["data"].is_null());

        let progress = call(
            &app,
            "/api/revision/progress",
            json!({ "revision_id": revision_id }),
        )
        .await;
        assert_eq!(progress["data"]["current_word_count"], 80);
        assert_eq!(progress["data"]["is_within_tolerance"], true);
        assert_eq!(progress["data"]["proposals"]["applied"], 1);

        let completed = call(
            &app,
            "/api/revision/complete",
            json!({ "revision_id": revision_id }),
        )
        .await;
        assert_eq!(completed["data"]["status"], "completed");
    }

    #[tokio::test]
    async fn test_business_errors_use_errno() {
        let fx = Fixture::new().await;
        let app = build_router(std::sync::Arc::new(fx.app_state()));

        let missing = call(
            &app,
            "/api/revision/get",
            json!({ "revision_id": uuid::Uuid::new_v4() }),
        )
        .await;
        assert_eq!(missing["errno"], 404);

        let unknown_book = call(
            &app,
            "/api/revision/start",
            json!({ "book_id": uuid::Uuid::new_v4(), "target_word_count": 10 }),
        )
        .await;
        assert_eq!(unknown_book["errno"], 404);

        let none = call(
            &app,
            "/api/revision/active",
            json!({ "book_id": uuid::Uuid::new_v4() }),
        )
        .await;
        assert_eq!(none["errno"], 0);
        assert!(none["data"].is_null());
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let fx = Fixture::new().await;
        let app = build_router(std::sync::Arc::new(fx.app_state()));

        let request = Request::builder()
            .method("POST")
            .uri("/api/revision/start")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }
}
