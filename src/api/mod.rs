// src/api/mod.rs
// =============================================================================
// The HTTP face of the service.
//
// This layer is deliberately thin: it validates requests into Jobs, keeps
// the store up to date and hands the real work to job::run_job.
// =============================================================================

mod error;
mod handlers;

use crate::store::JobStore;
use axum::{
    routing::{get, post},
    Router,
};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub const JOBS_PATH: &str = "/jobs";

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub max_concurrent_checks: Option<NonZeroUsize>,
}

impl AppState {
    pub fn new(store: Arc<dyn JobStore>, max_concurrent_checks: Option<NonZeroUsize>) -> Self {
        Self {
            store,
            max_concurrent_checks,
        }
    }
}

/// Builds the router with all job routes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(JOBS_PATH, post(handlers::create_job))
        .route(
            &format!("{JOBS_PATH}/{{id}}"),
            get(handlers::get_job).delete(handlers::delete_job),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::Value;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app() -> Router {
        router(AppState::new(Arc::new(MemoryStore::new()), None))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> Response {
        send_as(app, method, uri, Some("application/json"), body).await
    }

    async fn send_as(
        app: &Router,
        method: &str,
        uri: &str,
        content_type: Option<&str>,
        body: Option<&str>,
    ) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        let request = request
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // A root page with no links, so spawned jobs finish quickly and offline
    async fn empty_site() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<p>hi</p>", "text/html"))
            .mount(&server)
            .await;
        server
    }

    async fn create(app: &Router, root: &str) -> String {
        let body = format!(r#"{{"url":"{root}"}}"#);
        let response = send(app, "POST", JOBS_PATH, Some(&body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = json_body(response).await;
        json["job_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_returns_job() {
        let server = empty_site().await;
        let app = app();
        let body = format!(r#"{{"url":"{}/","link_timeout":50}}"#, server.uri());

        let response = send(&app, "POST", JOBS_PATH, Some(&body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = json_body(response).await;
        assert!(!json["job_id"].as_str().unwrap().is_empty());
        assert_eq!(json["url"], format!("{}/", server.uri()));
        assert_eq!(json["link_timeout"], 5);
    }

    #[tokio::test]
    async fn test_create_echoes_root_as_submitted() {
        let server = empty_site().await;
        let app = app();
        let body = format!(r#"{{"url":"{}"}}"#, server.uri());

        let json = json_body(send(&app, "POST", JOBS_PATH, Some(&body)).await).await;
        assert_eq!(json["url"], server.uri());
    }

    #[tokio::test]
    async fn test_create_ignores_content_type() {
        let server = empty_site().await;
        let app = app();
        let body = format!(r#"{{"url":"{}/","link_timeout":3}}"#, server.uri());

        for content_type in [None, Some("application/x-www-form-urlencoded"), Some("text/plain")] {
            let response = send_as(&app, "POST", JOBS_PATH, content_type, Some(&body)).await;
            assert_eq!(response.status(), StatusCode::CREATED, "content-type {content_type:?}");
            assert_eq!(json_body(response).await["link_timeout"], 3);
        }
    }

    #[tokio::test]
    async fn test_null_timeout_falls_back_to_default() {
        let server = empty_site().await;
        let app = app();
        let body = format!(r#"{{"url":"{}/","link_timeout":null}}"#, server.uri());

        let response = send(&app, "POST", JOBS_PATH, Some(&body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["link_timeout"], 5);
    }

    #[tokio::test]
    async fn test_root_without_authority_is_rejected() {
        let app = app();
        for root in ["http:example.com", "https:/example.com"] {
            let body = format!(r#"{{"url":"{root}"}}"#);
            let response = send(&app, "POST", JOBS_PATH, Some(&body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{root}");
        }
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let app = app();
        let response = send(&app, "POST", JOBS_PATH, Some(r#"{"url":"this_is_not_a_valid_url"}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["error"].as_str().unwrap().contains("absolute"));
    }

    #[tokio::test]
    async fn test_unexpected_json_is_rejected() {
        let app = app();
        let response = send(&app, "POST", JOBS_PATH, Some(r#"{"totally_invalid" : "what_is_this"}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, "POST", JOBS_PATH, Some("{not json")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let app = app();
        let response = send(&app, "GET", "/jobs/totally_not_a_valid_job_id", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, "DELETE", "/jobs/totally_not_a_valid_job_id", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_created_job_can_be_fetched() {
        let server = empty_site().await;
        let app = app();
        let id = create(&app, &format!("{}/", server.uri())).await;

        let response = send(&app, "GET", &format!("/jobs/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(json_body(response).await.is_array());
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let server = empty_site().await;
        let app = app();
        let id = create(&app, &format!("{}/", server.uri())).await;
        let uri = format!("/jobs/{id}");

        assert_eq!(send(&app, "DELETE", &uri, None).await.status(), StatusCode::OK);
        assert_eq!(send(&app, "DELETE", &uri, None).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(send(&app, "GET", &uri, None).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failures_show_up_when_polling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r#"<a href="/missing">x</a>"#, "text/html"))
            .mount(&server)
            .await;
        let app = app();
        let id = create(&app, &format!("{}/", server.uri())).await;

        // The job runs in the background; poll until its one failure lands
        let mut failures = Value::Null;
        for _ in 0..50 {
            failures = json_body(send(&app, "GET", &format!("/jobs/{id}"), None).await).await;
            if failures.as_array().map_or(false, |f| !f.is_empty()) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }

        assert_eq!(
            failures,
            serde_json::json!([{ "url": format!("{}/missing", server.uri()), "http_status": 404 }])
        );
    }
}
