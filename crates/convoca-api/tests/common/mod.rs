//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use convoca_api::routes;
use convoca_api::state::AppState;
use convoca_events::domain::aggregate::Event;
use convoca_mega_events::domain::aggregate::MegaEvent;
use convoca_test_support::{FixedClock, InMemoryDocuments, InMemoryLedger};

/// Fixed timestamp used across all integration tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// In-memory backend shared between a test and its app.
#[derive(Clone, Default)]
pub struct TestBackend {
    pub ledger: InMemoryLedger,
    pub events: InMemoryDocuments<Event>,
    pub mega_events: InMemoryDocuments<MegaEvent>,
}

impl TestBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Build the full app router over in-memory stores and a deterministic
/// clock. Uses the same route structure as `main.rs`.
pub fn build_test_app(backend: &TestBackend) -> Router {
    let app_state = AppState::new(
        Arc::new(FixedClock(fixed_now())),
        Arc::new(backend.ledger.clone()),
        Arc::new(backend.events.clone()),
        Arc::new(backend.mega_events.clone()),
    );

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/events", routes::events::router())
        .nest("/api/v1/mega-events", routes::mega_events::router())
        .with_state(app_state)
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    actor: Option<(i64, &str)>,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((actor_id, role)) = actor {
        builder = builder
            .header("x-actor-id", actor_id.to_string())
            .header("x-actor-role", role);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a POST request with a JSON body and actor headers.
pub async fn post_json_as(
    app: Router,
    uri: &str,
    actor: (i64, &str),
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(actor), Some(body)).await
}

/// Send a POST request with a JSON body and no actor headers.
pub async fn post_json_anonymous(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, None, Some(body)).await
}

/// Send a PATCH request with a JSON body and actor headers.
pub async fn patch_json_as(
    app: Router,
    uri: &str,
    actor: (i64, &str),
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PATCH", uri, Some(actor), Some(body)).await
}

/// Send a DELETE request with actor headers.
pub async fn delete_as(
    app: Router,
    uri: &str,
    actor: (i64, &str),
) -> (StatusCode, serde_json::Value) {
    send(app, "DELETE", uri, Some(actor), None).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None, None).await
}
