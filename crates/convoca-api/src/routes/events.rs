//! Routes for the Event context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use convoca_core::category::Category;
use convoca_core::location::Location;
use convoca_events::application::command_handlers;
use convoca_events::domain::aggregate::{EventKind, ParticipantKind};
use convoca_events::domain::commands::{
    AddImages, AddSponsor, ChangeEventStatus, CreateEvent, RegisterAttendance,
    RegisterParticipant, UpdateEvent,
};
use convoca_events::domain::lifecycle::EventStatus;
use convoca_events::domain::view::EventView;

use super::{ImageUpload, decode_images, parse_object_id};
use crate::error::ApiError;
use crate::extract::Caller;
use crate::state::AppState;

/// Per-request image count cap for events.
const IMAGES_PER_REQUEST: usize = 5;

#[derive(Debug, Deserialize)]
struct CreateEventRequest {
    title: String,
    description: Option<String>,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    enrollment_deadline: Option<DateTime<Utc>>,
    location: Location,
    kind: EventKind,
    category: Option<Category>,
    #[serde(default)]
    tags: Vec<String>,
    capacity_ceiling: Option<u32>,
    enrollment_open: Option<bool>,
    #[serde(default)]
    requires_approval: bool,
    #[serde(default)]
    sponsor_company_ids: Vec<i64>,
    #[serde(default)]
    promoter_company_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct UpdateEventRequest {
    title: Option<String>,
    description: Option<String>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    enrollment_deadline: Option<DateTime<Utc>>,
    location: Option<Location>,
    kind: Option<EventKind>,
    category: Option<Category>,
    tags: Option<Vec<String>>,
    capacity_ceiling: Option<u32>,
    enrollment_open: Option<bool>,
    requires_approval: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ChangeStatusRequest {
    target: EventStatus,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegisterParticipantRequest {
    member_id: i64,
    #[serde(default)]
    kind: ParticipantKind,
    comments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegisterAttendanceRequest {
    member_id: i64,
    attended: bool,
}

#[derive(Debug, Deserialize)]
struct AddSponsorRequest {
    company_id: i64,
}

#[derive(Debug, Deserialize)]
struct AddImagesRequest {
    images: Vec<ImageUpload>,
}

async fn create_event(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventView>), ApiError> {
    let command = CreateEvent {
        title: body.title,
        description: body.description,
        starts_at: body.starts_at,
        ends_at: body.ends_at,
        enrollment_deadline: body.enrollment_deadline,
        location: body.location,
        kind: body.kind,
        category: body.category,
        tags: body.tags,
        capacity_ceiling: body.capacity_ceiling,
        enrollment_open: body.enrollment_open,
        requires_approval: body.requires_approval,
        sponsor_company_ids: body.sponsor_company_ids,
        promoter_company_ids: body.promoter_company_ids,
    };
    let view = command_handlers::handle_create_event(
        command,
        &actor,
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.events.as_ref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<EventView>, ApiError> {
    let event_id = parse_object_id(&event_id, "event")?;
    let view = command_handlers::handle_get_event(event_id, state.events.as_ref()).await?;
    Ok(Json(view))
}

async fn update_event(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(event_id): Path<String>,
    Json(body): Json<UpdateEventRequest>,
) -> Result<Json<EventView>, ApiError> {
    let event_id = parse_object_id(&event_id, "event")?;
    let command = UpdateEvent {
        title: body.title,
        description: body.description,
        starts_at: body.starts_at,
        ends_at: body.ends_at,
        enrollment_deadline: body.enrollment_deadline,
        location: body.location,
        kind: body.kind,
        category: body.category,
        tags: body.tags,
        capacity_ceiling: body.capacity_ceiling,
        enrollment_open: body.enrollment_open,
        requires_approval: body.requires_approval,
    };
    let view = command_handlers::handle_update_event(
        event_id,
        command,
        &actor,
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

async fn delete_event(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(event_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let event_id = parse_object_id(&event_id, "event")?;
    command_handlers::handle_delete_event(
        event_id,
        &actor,
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_status(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(event_id): Path<String>,
    Json(body): Json<ChangeStatusRequest>,
) -> Result<Json<EventView>, ApiError> {
    let event_id = parse_object_id(&event_id, "event")?;
    let view = command_handlers::handle_change_status(
        event_id,
        ChangeEventStatus {
            target: body.target,
            reason: body.reason,
        },
        &actor,
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

async fn register_participant(
    State(state): State<AppState>,
    Caller(_actor): Caller,
    Path(event_id): Path<String>,
    Json(body): Json<RegisterParticipantRequest>,
) -> Result<Json<EventView>, ApiError> {
    let event_id = parse_object_id(&event_id, "event")?;
    let view = command_handlers::handle_register_participant(
        event_id,
        RegisterParticipant {
            member_id: body.member_id,
            kind: body.kind,
            comments: body.comments,
        },
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

async fn register_attendance(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(event_id): Path<String>,
    Json(body): Json<RegisterAttendanceRequest>,
) -> Result<Json<EventView>, ApiError> {
    let event_id = parse_object_id(&event_id, "event")?;
    let view = command_handlers::handle_register_attendance(
        event_id,
        RegisterAttendance {
            member_id: body.member_id,
            attended: body.attended,
        },
        &actor,
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

async fn add_sponsor(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(event_id): Path<String>,
    Json(body): Json<AddSponsorRequest>,
) -> Result<Json<EventView>, ApiError> {
    let event_id = parse_object_id(&event_id, "event")?;
    let view = command_handlers::handle_add_sponsor(
        event_id,
        AddSponsor {
            company_id: body.company_id,
        },
        &actor,
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

async fn add_images(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(event_id): Path<String>,
    Json(body): Json<AddImagesRequest>,
) -> Result<Json<EventView>, ApiError> {
    let event_id = parse_object_id(&event_id, "event")?;
    let images = decode_images(body.images, IMAGES_PER_REQUEST)?;
    let view = command_handlers::handle_add_images(
        event_id,
        AddImages { images },
        &actor,
        state.clock.as_ref(),
        state.events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

async fn remove_image(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path((event_id, image_id)): Path<(String, Uuid)>,
) -> Result<Json<EventView>, ApiError> {
    let event_id = parse_object_id(&event_id, "event")?;
    let view = command_handlers::handle_remove_image(
        event_id,
        image_id,
        &actor,
        state.clock.as_ref(),
        state.events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

/// Returns the router for the event context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_event))
        .route(
            "/{event_id}",
            axum::routing::get(get_event)
                .patch(update_event)
                .delete(delete_event),
        )
        .route("/{event_id}/status", post(change_status))
        .route("/{event_id}/participants", post(register_participant))
        .route("/{event_id}/attendance", post(register_attendance))
        .route("/{event_id}/sponsors", post(add_sponsor))
        .route("/{event_id}/images", post(add_images))
        .route("/{event_id}/images/{image_id}", delete(remove_image))
}
