//! HTTP Middleware
//!
//! 只记录协议层失败（JSON 解析、路由、请求体超限）；
//! 业务错误（errno != 0）在 ApiError::into_response() 中记录

use std::time::Instant;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};

/// 协议层错误日志
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match status {
        StatusCode::PAYLOAD_TOO_LARGE => tracing::warn!(
            method = %method,
            path = %path,
            "Request body over limit"
        ),
        s if s.is_server_error() => tracing::error!(
            method = %method,
            path = %path,
            status = s.as_u16(),
            elapsed_ms,
            "HTTP server error"
        ),
        s if s.is_client_error() => tracing::warn!(
            method = %method,
            path = %path,
            status = s.as_u16(),
            "HTTP client error"
        ),
        _ => {}
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, routing::post, Router};
    use tower::util::ServiceExt;

    async fn echo(body: String) -> String {
        body
    }

    fn router() -> Router {
        Router::new()
            .route("/echo", post(echo))
            .layer(axum::extract::DefaultBodyLimit::max(16))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    async fn post_body(uri: &str, body: &'static str) -> StatusCode {
        let request = HttpRequest::builder()
            .method("POST")
            .uri(uri)
            .body(Body::from(body))
            .unwrap();
        router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        assert_eq!(post_body("/echo", "short").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        assert_eq!(
            post_body("/echo", "a chapter body well over sixteen bytes").await,
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn test_unknown_route_passes_through() {
        assert_eq!(post_body("/missing", "").await, StatusCode::NOT_FOUND);
    }
}
