use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use axum_test::TestServer;
use gaze_tracking_service::{
    config::{CorsConfig, ServerConfig},
    gaze::GazeReading,
    server,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt; // for `oneshot`

mod common;

use common::{mocks::ScriptedEstimator, test_utils::processor};

fn create_test_app(config: &ServerConfig) -> axum::Router {
    server::app(config, processor(ScriptedEstimator::new(GazeReading::default()))).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::new(create_test_app(&ServerConfig::default())).unwrap();

    let response = server.get("/health").await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "status": "healthy",
        "service": "gaze-tracking",
        "gaze_tracking_available": true
    }));
}

#[tokio::test]
async fn test_root_endpoint() {
    let server = TestServer::new(create_test_app(&ServerConfig::default())).unwrap();

    let response = server.get("/").await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "message": "GazeTracking Service",
        "version": "1.0.0",
        "endpoints": {
            "websocket": "/ws/gaze",
            "health": "/health"
        }
    }));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let server = TestServer::new(create_test_app(&ServerConfig::default())).unwrap();

    let response = server.get("/metrics").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_websocket_route_requires_upgrade() {
    let app = create_test_app(&ServerConfig::default());

    let request = Request::builder()
        .uri("/ws/gaze")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    // A plain GET without upgrade headers is rejected by the extractor
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_cors_preflight_from_allowed_origin() {
    let app = create_test_app(&ServerConfig::default());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/health")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-client-id")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let headers = response.headers();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "x-client-id");
}

#[tokio::test]
async fn test_cors_simple_request_from_second_default_origin() {
    let app = create_test_app(&ServerConfig::default());

    let request = Request::builder()
        .uri("/")
        .header(header::ORIGIN, "http://127.0.0.1:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://127.0.0.1:3000"
    );
}

#[tokio::test]
async fn test_cors_rejects_other_origins() {
    let app = create_test_app(&ServerConfig::default());

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://evil.example")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    // The request is still served; the browser enforces the missing header
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn test_cors_uses_configured_origins() {
    let config = ServerConfig {
        cors: CorsConfig {
            allowed_origins: vec!["https://dashboard.example".to_string()],
        },
        ..ServerConfig::default()
    };
    let app = create_test_app(&config);

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://dashboard.example")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://dashboard.example"
    );
}

#[test]
fn test_invalid_origin_fails_app_construction() {
    let config = ServerConfig {
        cors: CorsConfig {
            allowed_origins: vec!["localhost:3000".to_string()],
        },
        ..ServerConfig::default()
    };

    let result = server::app(
        &config,
        processor(ScriptedEstimator::new(GazeReading::default())),
    );

    assert!(result.is_err());
}
