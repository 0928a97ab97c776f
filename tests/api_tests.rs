//! Tests de la API HTTP sobre el store en memoria

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use hiking_registration::build_app;
use hiking_registration::config::environment::EnvironmentConfig;
use hiking_registration::state::AppState;
use hiking_registration::store::MemoryStore;
use hiking_registration::utils::backoff::RetryConfig;

fn test_app() -> Router {
    let config = EnvironmentConfig {
        retry: RetryConfig::fast(),
        ..EnvironmentConfig::default()
    };
    build_app(AppState::new(Arc::new(MemoryStore::new()), config))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
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

async fn seed_mountain(app: &Router, max_capacity: u32) {
    let (status, _) = send(
        app,
        "PUT",
        "/api/mountain/cerro-catedral",
        Some(json!({
            "name": "Cerro Catedral",
            "routes": [
                { "route_id": "r-1", "name": "Filo Norte", "max_capacity": max_capacity }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn create_registration(app: &Router, user_id: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/registration",
        Some(json!({
            "user_id": user_id,
            "mountain_id": "cerro-catedral",
            "route_id": "r-1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "pending");
    body["data"]["registration_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "hiking-registration");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_full_registration_flow() {
    let app = test_app();
    seed_mountain(&app, 2).await;

    let id = create_registration(&app, "ana").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/registration/{}/approve", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "approved");

    let (status, body) = send(&app, "GET", "/api/mountain/cerro-catedral", None).await;
    assert_eq!(status, StatusCode::OK);
    let route = &body["data"]["routes"][0];
    assert_eq!(route["used_capacity"], 1);
    assert_eq!(route["remaining_capacity"], 1);
    assert_eq!(route["is_available"], true);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/registration/{}/cancel", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");

    let (_, body) = send(&app, "GET", "/api/mountain/cerro-catedral", None).await;
    assert_eq!(body["data"]["routes"][0]["used_capacity"], 0);
}

#[tokio::test]
async fn test_route_full_maps_to_conflict() {
    let app = test_app();
    seed_mountain(&app, 1).await;

    let first = create_registration(&app, "ana").await;
    let second = create_registration(&app, "bruno").await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/registration/{}/approve", first),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/registration/{}/approve", second),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ROUTE_FULL");
}

#[tokio::test]
async fn test_double_approve_maps_to_conflict() {
    let app = test_app();
    seed_mountain(&app, 2).await;

    let id = create_registration(&app, "ana").await;
    let uri = format!("/api/registration/{}/approve", id);

    let (status, _) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_not_found_mappings() {
    let app = test_app();
    seed_mountain(&app, 2).await;

    let (status, body) = send(&app, "GET", "/api/mountain/no-existe", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "MOUNTAIN_NOT_FOUND");

    let (status, body) = send(
        &app,
        "POST",
        "/api/registration/3d0f7a9e-8c1b-4e2d-9a5f-6b7c8d9e0f1a/approve",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "REGISTRATION_NOT_FOUND");

    let (status, body) = send(
        &app,
        "POST",
        "/api/registration",
        Some(json!({
            "user_id": "ana",
            "mountain_id": "cerro-catedral",
            "route_id": "no-existe"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ROUTE_NOT_FOUND");
}

#[tokio::test]
async fn test_create_requires_a_route_reference() {
    let app = test_app();
    seed_mountain(&app, 2).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/registration",
        Some(json!({
            "user_id": "ana",
            "mountain_id": "cerro-catedral"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_capacity_resize_and_close() {
    let app = test_app();
    seed_mountain(&app, 3).await;

    let id = create_registration(&app, "ana").await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/registration/{}/approve", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Achicar por debajo del uso commiteado se rechaza
    let (status, body) = send(
        &app,
        "PUT",
        "/api/mountain/cerro-catedral/route/r-1/capacity",
        Some(json!({ "max_capacity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CAPACITY_BELOW_USAGE");

    // Cerrar la ruta bloquea nuevas inscripciones
    let (status, _) = send(
        &app,
        "PUT",
        "/api/mountain/cerro-catedral/route/r-1/capacity",
        Some(json!({ "max_capacity": 3, "status": "closed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/api/registration",
        Some(json!({
            "user_id": "bruno",
            "mountain_id": "cerro-catedral",
            "route_id": "r-1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ROUTE_CLOSED");
}

#[tokio::test]
async fn test_reconcile_and_report_endpoints() {
    let app = test_app();
    seed_mountain(&app, 5).await;

    let a = create_registration(&app, "ana").await;
    let b = create_registration(&app, "bruno").await;
    for id in [&a, &b] {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/registration/{}/approve", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, "POST", "/api/mountain/cerro-catedral/reconcile", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["routes"][0]["used_capacity"], 2);

    let (status, body) = send(&app, "GET", "/api/mountain/cerro-catedral/report", None).await;
    assert_eq!(status, StatusCode::OK);
    let route = &body["data"]["routes"][0];
    assert_eq!(route["approved"], 2);
    assert_eq!(route["pending"], 0);
    assert_eq!(body["data"]["monthlyApproved"][0]["approved"], 2);

    let (status, body) = send(
        &app,
        "GET",
        "/api/registration/mountain/cerro-catedral",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}
