//! Integration tests for the event routes.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;

const NGO: (i64, &str) = (7, "ngo");

fn beach_cleanup_body() -> serde_json::Value {
    json!({
        "title": "Beach Cleanup",
        "starts_at": (common::fixed_now() + Duration::days(1)).to_rfc3339(),
        "location": { "address": "Pier 3" },
        "kind": "volunteering",
        "capacity_ceiling": 50,
    })
}

fn backend_with_ngo() -> common::TestBackend {
    let backend = common::TestBackend::new();
    backend.ledger.add_ngo(7);
    backend
}

async fn create_event(backend: &common::TestBackend) -> String {
    let app = common::build_test_app(backend);
    let (status, json) = common::post_json_as(app, "/api/v1/events", NGO, &beach_cleanup_body()).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn test_create_event_starts_in_draft() {
    let backend = backend_with_ngo();
    let app = common::build_test_app(&backend);

    let (status, json) =
        common::post_json_as(app, "/api/v1/events", NGO, &beach_cleanup_body()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "draft");
    assert_eq!(json["public"], false);
    assert_eq!(json["ngo_id"], 7);
    assert!(json["ledger_event_id"].as_i64().unwrap() > 0);
    assert_eq!(json["history"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_event_without_title_fails_validation() {
    let backend = backend_with_ngo();
    let app = common::build_test_app(&backend);
    let mut body = beach_cleanup_body();
    body["title"] = json!("");

    let (status, json) = common::post_json_as(app, "/api/v1/events", NGO, &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_failed");
}

#[tokio::test]
async fn test_create_event_without_actor_headers_is_rejected() {
    let backend = backend_with_ngo();
    let app = common::build_test_app(&backend);

    let (status, json) =
        common::post_json_anonymous(app, "/api/v1/events", &beach_cleanup_body()).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn test_publish_opens_visibility() {
    let backend = backend_with_ngo();
    let event_id = create_event(&backend).await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/events/{event_id}/status"),
        NGO,
        &json!({ "target": "published" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "published");
    assert_eq!(json["public"], true);
    assert_eq!(json["enrollment_open"], true);
    assert_eq!(json["history"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_in_progress_before_start_fails_precondition() {
    let backend = backend_with_ngo();
    let event_id = create_event(&backend).await;
    let app = common::build_test_app(&backend);
    common::post_json_as(
        app,
        &format!("/api/v1/events/{event_id}/status"),
        NGO,
        &json!({ "target": "published" }),
    )
    .await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/events/{event_id}/status"),
        NGO,
        &json!({ "target": "in_progress" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "precondition_failed");
}

#[tokio::test]
async fn test_invalid_transition_reports_allowed_targets() {
    let backend = backend_with_ngo();
    let event_id = create_event(&backend).await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/events/{event_id}/status"),
        NGO,
        &json!({ "target": "finished" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_transition");
    assert_eq!(
        json["allowed_transitions"],
        json!(["published", "cancelled"])
    );
}

#[tokio::test]
async fn test_delete_event_with_participants_fails() {
    let backend = backend_with_ngo();
    backend.ledger.add_member(31);
    let event_id = create_event(&backend).await;
    let app = common::build_test_app(&backend);
    let (status, _) = common::post_json_as(
        app,
        &format!("/api/v1/events/{event_id}/participants"),
        (31, "external-member"),
        &json!({ "member_id": 31 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let app = common::build_test_app(&backend);
    let (status, json) = common::delete_as(app, &format!("/api/v1/events/{event_id}"), NGO).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "has_dependents");
}

#[tokio::test]
async fn test_delete_event_then_get_returns_404() {
    let backend = backend_with_ngo();
    let event_id = create_event(&backend).await;

    let app = common::build_test_app(&backend);
    let (status, _) = common::delete_as(app, &format!("/api/v1/events/{event_id}"), NGO).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let app = common::build_test_app(&backend);
    let (status, json) = common::get_json(app, &format!("/api/v1/events/{event_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_get_event_round_trips_business_fields() {
    let backend = backend_with_ngo();
    let event_id = create_event(&backend).await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::get_json(app, &format!("/api/v1/events/{event_id}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Beach Cleanup");
    assert_eq!(json["location"]["address"], "Pier 3");
    assert_eq!(json["location"]["city"], "Santa Cruz");
    assert_eq!(json["kind"], "volunteering");
    assert_eq!(json["capacity_ceiling"], 50);
    assert_eq!(json["metrics"]["total_registered"], 0);
}

#[tokio::test]
async fn test_malformed_event_id_fails_validation() {
    let backend = backend_with_ngo();
    let app = common::build_test_app(&backend);

    let (status, json) = common::get_json(app, "/api/v1/events/not-an-id").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_failed");
}

#[tokio::test]
async fn test_attendance_updates_metrics() {
    let backend = backend_with_ngo();
    backend.ledger.add_member(31);
    let event_id = create_event(&backend).await;
    let app = common::build_test_app(&backend);
    common::post_json_as(
        app,
        &format!("/api/v1/events/{event_id}/participants"),
        (31, "external-member"),
        &json!({ "member_id": 31 }),
    )
    .await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/events/{event_id}/attendance"),
        NGO,
        &json!({ "member_id": 31, "attended": true }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["metrics"]["total_registered"], 1);
    assert_eq!(json["metrics"]["total_attended"], 1);
    assert_eq!(json["metrics"]["attendance_pct"], 100);
}

#[tokio::test]
async fn test_update_by_other_ngo_is_unauthorized() {
    let backend = backend_with_ngo();
    backend.ledger.add_ngo(8);
    let event_id = create_event(&backend).await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::patch_json_as(
        app,
        &format!("/api/v1/events/{event_id}"),
        (8, "ngo"),
        &json!({ "title": "Hijacked Cleanup" }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn test_image_upload_and_removal() {
    let backend = backend_with_ngo();
    let event_id = create_event(&backend).await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/events/{event_id}/images"),
        NGO,
        &json!({ "images": [{
            "filename": "banner.jpg",
            "mime_type": "image/jpeg",
            "content_base64": "aGVsbG8=",
        }] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert!(images[0]["url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/jpeg;base64,"));

    let image_id = images[0]["id"].as_str().unwrap().to_owned();
    let app = common::build_test_app(&backend);
    let (status, json) = common::delete_as(
        app,
        &format!("/api/v1/events/{event_id}/images/{image_id}"),
        NGO,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["images"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_non_image_mime_type_is_rejected() {
    let backend = backend_with_ngo();
    let event_id = create_event(&backend).await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/events/{event_id}/images"),
        NGO,
        &json!({ "images": [{
            "filename": "malware.exe",
            "mime_type": "application/octet-stream",
            "content_base64": "aGVsbG8=",
        }] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_failed");
}
