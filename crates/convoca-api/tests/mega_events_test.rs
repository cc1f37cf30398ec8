//! Integration tests for the mega-event routes.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;

const PRINCIPAL: (i64, &str) = (7, "ngo");

fn summit_body(capacity: u32) -> serde_json::Value {
    json!({
        "title": "City Reforestation Summit",
        "starts_at": (common::fixed_now() + Duration::days(10)).to_rfc3339(),
        "ends_at": (common::fixed_now() + Duration::days(12)).to_rfc3339(),
        "location": { "address": "Parque Urbano" },
        "capacity_ceiling": capacity,
    })
}

fn backend_with_principal() -> common::TestBackend {
    let backend = common::TestBackend::new();
    backend.ledger.add_ngo(7);
    backend
}

async fn create_mega_event(backend: &common::TestBackend, capacity: u32) -> String {
    let app = common::build_test_app(backend);
    let (status, json) =
        common::post_json_as(app, "/api/v1/mega-events", PRINCIPAL, &summit_body(capacity)).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_owned()
}

async fn open_call(backend: &common::TestBackend, id: &str) {
    let app = common::build_test_app(backend);
    let (status, _) = common::post_json_as(
        app,
        &format!("/api/v1/mega-events/{id}/status"),
        PRINCIPAL,
        &json!({ "target": "call_for_participation" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_mega_event_starts_in_planning_with_principal_organizer() {
    let backend = backend_with_principal();
    let app = common::build_test_app(&backend);

    let (status, json) =
        common::post_json_as(app, "/api/v1/mega-events", PRINCIPAL, &summit_body(500)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "planning");
    assert_eq!(json["enrollment_open"], false);
    let organizers = json["organizers"].as_array().unwrap();
    assert_eq!(organizers.len(), 1);
    assert_eq!(organizers[0]["ngo_id"], 7);
    assert_eq!(organizers[0]["role"], "principal_coordinator");
    assert_eq!(json["metrics"]["total_active_organizers"], 1);
}

#[tokio::test]
async fn test_create_mega_event_rejects_duration_over_thirty_days() {
    let backend = backend_with_principal();
    let app = common::build_test_app(&backend);
    let mut body = summit_body(500);
    body["ends_at"] = json!((common::fixed_now() + Duration::days(45)).to_rfc3339());

    let (status, json) = common::post_json_as(app, "/api/v1/mega-events", PRINCIPAL, &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_failed");
}

#[tokio::test]
async fn test_capacity_ceiling_admits_exactly_two_members() {
    // Capacity of 2: members A and B register, C bounces.
    let backend = backend_with_principal();
    for member in [1, 2, 3] {
        backend.ledger.add_member(member);
    }
    let id = create_mega_event(&backend, 2).await;
    open_call(&backend, &id).await;

    for member in [1, 2] {
        let app = common::build_test_app(&backend);
        let (status, _) = common::post_json_as(
            app,
            &format!("/api/v1/mega-events/{id}/participants"),
            (member, "external-member"),
            &json!({ "member_id": member }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/mega-events/{id}/participants"),
        (3, "external-member"),
        &json!({ "member_id": 3 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "capacity_exceeded");
}

#[tokio::test]
async fn test_registration_while_planning_is_rejected() {
    let backend = backend_with_principal();
    backend.ledger.add_member(31);
    let id = create_mega_event(&backend, 100).await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/mega-events/{id}/participants"),
        (31, "external-member"),
        &json!({ "member_id": 31 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "enrollment_closed");
}

#[tokio::test]
async fn test_add_organizer_defaults_to_collaborator() {
    let backend = backend_with_principal();
    backend.ledger.add_ngo(8);
    let id = create_mega_event(&backend, 100).await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/mega-events/{id}/organizers"),
        PRINCIPAL,
        &json!({ "ngo_id": 8 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let organizers = json["organizers"].as_array().unwrap();
    assert_eq!(organizers.len(), 2);
    assert_eq!(organizers[1]["role"], "collaborator");
    assert_eq!(json["metrics"]["total_active_organizers"], 2);
}

#[tokio::test]
async fn test_add_organizer_rejects_non_ngo_target() {
    let backend = backend_with_principal();
    let id = create_mega_event(&backend, 100).await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/mega-events/{id}/organizers"),
        PRINCIPAL,
        &json!({ "ngo_id": 99 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "not_an_ngo");
}

#[tokio::test]
async fn test_collaborator_cannot_change_status() {
    let backend = backend_with_principal();
    backend.ledger.add_ngo(8);
    let id = create_mega_event(&backend, 100).await;
    let app = common::build_test_app(&backend);
    common::post_json_as(
        app,
        &format!("/api/v1/mega-events/{id}/organizers"),
        PRINCIPAL,
        &json!({ "ngo_id": 8 }),
    )
    .await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/mega-events/{id}/status"),
        (8, "ngo"),
        &json!({ "target": "call_for_participation" }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn test_organizing_requires_registered_participants() {
    let backend = backend_with_principal();
    let id = create_mega_event(&backend, 100).await;
    open_call(&backend, &id).await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/mega-events/{id}/status"),
        PRINCIPAL,
        &json!({ "target": "organizing" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "precondition_failed");
}

#[tokio::test]
async fn test_invalid_transition_reports_allowed_targets() {
    let backend = backend_with_principal();
    let id = create_mega_event(&backend, 100).await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/mega-events/{id}/status"),
        PRINCIPAL,
        &json!({ "target": "in_progress" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_transition");
    assert_eq!(
        json["allowed_transitions"],
        json!(["call_for_participation", "cancelled"])
    );
}

#[tokio::test]
async fn test_add_sponsor_pledge_counts_in_metrics() {
    let backend = backend_with_principal();
    backend.ledger.add_company(55);
    let id = create_mega_event(&backend, 100).await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/mega-events/{id}/sponsors"),
        PRINCIPAL,
        &json!({ "company_id": 55, "tier": "gold", "amount": 5000.0 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["metrics"]["total_sponsors"], 1);
    let sponsors = json["sponsors"].as_array().unwrap();
    assert_eq!(sponsors[0]["status"], "pledged");
    // Unconfirmed pledges do not roll up into the budget.
    assert_eq!(json["metrics"]["budget"]["total_pledged"], 0.0);
}

#[tokio::test]
async fn test_duplicate_sponsor_is_rejected() {
    let backend = backend_with_principal();
    backend.ledger.add_company(55);
    let id = create_mega_event(&backend, 100).await;
    let app = common::build_test_app(&backend);
    common::post_json_as(
        app,
        &format!("/api/v1/mega-events/{id}/sponsors"),
        PRINCIPAL,
        &json!({ "company_id": 55 }),
    )
    .await;

    let app = common::build_test_app(&backend);
    let (status, json) = common::post_json_as(
        app,
        &format!("/api/v1/mega-events/{id}/sponsors"),
        PRINCIPAL,
        &json!({ "company_id": 55 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "already_sponsor");
}
