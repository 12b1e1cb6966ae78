//! CORS policy as attached by `main.rs`: configured origins only, or any
//! origin when the allow-list is empty.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use paysync_daemon::{routes, state::AppState};
use paysync_reconcile::{ReconciliationEngine, RecordStore};
use paysync_testkit::{ScriptedGateway, TEST_SERVER_KEY};
use tower::ServiceExt; // oneshot

fn app(allowed: &[String]) -> axum::Router {
    let engine = ReconciliationEngine::new(
        Arc::new(ScriptedGateway::new()),
        RecordStore::Disabled,
        TEST_SERVER_KEY,
    );
    routes::build_router(Arc::new(AppState::new(engine))).layer(routes::cors_layer(allowed))
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method("OPTIONS")
        .uri("/generate-snap-token")
        .header("origin", origin)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn empty_allow_list_admits_any_origin() {
    let resp = app(&[])
        .oneshot(preflight("https://anything.example"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    assert_eq!(
        resp.headers()
            .get("access-control-max-age")
            .and_then(|v| v.to_str().ok()),
        Some("86400")
    );
}

#[tokio::test]
async fn configured_origin_is_echoed() {
    let allowed = vec!["https://shop.example".to_string()];
    let resp = app(&allowed)
        .oneshot(preflight("https://shop.example"))
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("https://shop.example")
    );
}

#[tokio::test]
async fn unlisted_origin_gets_no_allow_header() {
    let allowed = vec!["https://shop.example".to_string()];
    let resp = app(&allowed)
        .oneshot(preflight("https://evil.example"))
        .await
        .unwrap();
    assert!(resp.headers().get("access-control-allow-origin").is_none());
}
