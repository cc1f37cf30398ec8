//! Routes for the MegaEvent context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use convoca_core::category::Category;
use convoca_core::location::Location;
use convoca_mega_events::application::command_handlers;
use convoca_mega_events::domain::aggregate::{
    Availability, MegaParticipantKind, OrganizerRole, Priority, SponsorshipTier,
};
use convoca_mega_events::domain::commands::{
    AddMegaImages, AddMegaSponsor, AddOrganizer, ChangeMegaEventStatus, CreateMegaEvent,
    RegisterMegaAttendance, RegisterMegaParticipant, SponsorInput, UpdateMegaEvent,
};
use convoca_mega_events::domain::lifecycle::MegaEventStatus;
use convoca_mega_events::domain::view::MegaEventView;

use super::{ImageUpload, decode_images, parse_object_id};
use crate::error::ApiError;
use crate::extract::Caller;
use crate::state::AppState;

/// Per-request image count cap for mega-events.
const IMAGES_PER_REQUEST: usize = 10;

#[derive(Debug, Deserialize)]
struct SponsorInputRequest {
    company_id: i64,
    #[serde(default)]
    tier: SponsorshipTier,
    amount: Option<f64>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateMegaEventRequest {
    title: String,
    description: Option<String>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    enrollment_deadline: Option<DateTime<Utc>>,
    location: Location,
    category: Option<Category>,
    #[serde(default)]
    tags: Vec<String>,
    capacity_ceiling: Option<u32>,
    #[serde(default)]
    requires_approval: bool,
    priority: Option<Priority>,
    #[serde(default)]
    sponsors: Vec<SponsorInputRequest>,
}

#[derive(Debug, Deserialize)]
struct UpdateMegaEventRequest {
    title: Option<String>,
    description: Option<String>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    enrollment_deadline: Option<DateTime<Utc>>,
    location: Option<Location>,
    category: Option<Category>,
    tags: Option<Vec<String>>,
    capacity_ceiling: Option<u32>,
    requires_approval: Option<bool>,
    priority: Option<Priority>,
}

#[derive(Debug, Deserialize)]
struct ChangeStatusRequest {
    target: MegaEventStatus,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegisterParticipantRequest {
    member_id: i64,
    #[serde(default)]
    kind: MegaParticipantKind,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    availability: Availability,
    comments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegisterAttendanceRequest {
    member_id: i64,
    attended: bool,
}

#[derive(Debug, Deserialize)]
struct AddOrganizerRequest {
    ngo_id: i64,
    role: Option<OrganizerRole>,
    #[serde(default)]
    responsibilities: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AddSponsorRequest {
    company_id: i64,
    #[serde(default)]
    tier: SponsorshipTier,
    amount: Option<f64>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddImagesRequest {
    images: Vec<ImageUpload>,
}

async fn create_mega_event(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Json(body): Json<CreateMegaEventRequest>,
) -> Result<(StatusCode, Json<MegaEventView>), ApiError> {
    let command = CreateMegaEvent {
        title: body.title,
        description: body.description,
        starts_at: body.starts_at,
        ends_at: body.ends_at,
        enrollment_deadline: body.enrollment_deadline,
        location: body.location,
        category: body.category,
        tags: body.tags,
        capacity_ceiling: body.capacity_ceiling,
        requires_approval: body.requires_approval,
        priority: body.priority,
        sponsors: body
            .sponsors
            .into_iter()
            .map(|sponsor| SponsorInput {
                company_id: sponsor.company_id,
                tier: sponsor.tier,
                amount: sponsor.amount,
                description: sponsor.description,
            })
            .collect(),
    };
    let view = command_handlers::handle_create_mega_event(
        command,
        &actor,
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.mega_events.as_ref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_mega_event(
    State(state): State<AppState>,
    Path(mega_event_id): Path<String>,
) -> Result<Json<MegaEventView>, ApiError> {
    let mega_event_id = parse_object_id(&mega_event_id, "mega-event")?;
    let view =
        command_handlers::handle_get_mega_event(mega_event_id, state.mega_events.as_ref()).await?;
    Ok(Json(view))
}

async fn update_mega_event(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(mega_event_id): Path<String>,
    Json(body): Json<UpdateMegaEventRequest>,
) -> Result<Json<MegaEventView>, ApiError> {
    let mega_event_id = parse_object_id(&mega_event_id, "mega-event")?;
    let command = UpdateMegaEvent {
        title: body.title,
        description: body.description,
        starts_at: body.starts_at,
        ends_at: body.ends_at,
        enrollment_deadline: body.enrollment_deadline,
        location: body.location,
        category: body.category,
        tags: body.tags,
        capacity_ceiling: body.capacity_ceiling,
        requires_approval: body.requires_approval,
        priority: body.priority,
    };
    let view = command_handlers::handle_update_mega_event(
        mega_event_id,
        command,
        &actor,
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.mega_events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

async fn delete_mega_event(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(mega_event_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mega_event_id = parse_object_id(&mega_event_id, "mega-event")?;
    command_handlers::handle_delete_mega_event(
        mega_event_id,
        &actor,
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.mega_events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_status(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(mega_event_id): Path<String>,
    Json(body): Json<ChangeStatusRequest>,
) -> Result<Json<MegaEventView>, ApiError> {
    let mega_event_id = parse_object_id(&mega_event_id, "mega-event")?;
    let view = command_handlers::handle_change_status(
        mega_event_id,
        ChangeMegaEventStatus {
            target: body.target,
            reason: body.reason,
        },
        &actor,
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.mega_events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

async fn register_participant(
    State(state): State<AppState>,
    Caller(_actor): Caller,
    Path(mega_event_id): Path<String>,
    Json(body): Json<RegisterParticipantRequest>,
) -> Result<Json<MegaEventView>, ApiError> {
    let mega_event_id = parse_object_id(&mega_event_id, "mega-event")?;
    let view = command_handlers::handle_register_participant(
        mega_event_id,
        RegisterMegaParticipant {
            member_id: body.member_id,
            kind: body.kind,
            skills: body.skills,
            availability: body.availability,
            comments: body.comments,
        },
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.mega_events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

async fn register_attendance(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(mega_event_id): Path<String>,
    Json(body): Json<RegisterAttendanceRequest>,
) -> Result<Json<MegaEventView>, ApiError> {
    let mega_event_id = parse_object_id(&mega_event_id, "mega-event")?;
    let view = command_handlers::handle_register_attendance(
        mega_event_id,
        RegisterMegaAttendance {
            member_id: body.member_id,
            attended: body.attended,
        },
        &actor,
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.mega_events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

async fn add_organizer(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(mega_event_id): Path<String>,
    Json(body): Json<AddOrganizerRequest>,
) -> Result<Json<MegaEventView>, ApiError> {
    let mega_event_id = parse_object_id(&mega_event_id, "mega-event")?;
    let view = command_handlers::handle_add_organizer(
        mega_event_id,
        AddOrganizer {
            ngo_id: body.ngo_id,
            role: body.role,
            responsibilities: body.responsibilities,
        },
        &actor,
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.mega_events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

async fn add_sponsor(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(mega_event_id): Path<String>,
    Json(body): Json<AddSponsorRequest>,
) -> Result<Json<MegaEventView>, ApiError> {
    let mega_event_id = parse_object_id(&mega_event_id, "mega-event")?;
    let view = command_handlers::handle_add_sponsor(
        mega_event_id,
        AddMegaSponsor {
            company_id: body.company_id,
            tier: body.tier,
            amount: body.amount,
            description: body.description,
        },
        &actor,
        state.clock.as_ref(),
        state.ledger.as_ref(),
        state.mega_events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

async fn add_images(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(mega_event_id): Path<String>,
    Json(body): Json<AddImagesRequest>,
) -> Result<Json<MegaEventView>, ApiError> {
    let mega_event_id = parse_object_id(&mega_event_id, "mega-event")?;
    let images = decode_images(body.images, IMAGES_PER_REQUEST)?;
    let view = command_handlers::handle_add_images(
        mega_event_id,
        AddMegaImages { images },
        &actor,
        state.clock.as_ref(),
        state.mega_events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

async fn remove_image(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path((mega_event_id, image_id)): Path<(String, Uuid)>,
) -> Result<Json<MegaEventView>, ApiError> {
    let mega_event_id = parse_object_id(&mega_event_id, "mega-event")?;
    let view = command_handlers::handle_remove_image(
        mega_event_id,
        image_id,
        &actor,
        state.clock.as_ref(),
        state.mega_events.as_ref(),
        &state.locks,
    )
    .await?;
    Ok(Json(view))
}

/// Returns the router for the mega-event context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_mega_event))
        .route(
            "/{mega_event_id}",
            axum::routing::get(get_mega_event)
                .patch(update_mega_event)
                .delete(delete_mega_event),
        )
        .route("/{mega_event_id}/status", post(change_status))
        .route("/{mega_event_id}/participants", post(register_participant))
        .route("/{mega_event_id}/attendance", post(register_attendance))
        .route("/{mega_event_id}/organizers", post(add_organizer))
        .route("/{mega_event_id}/sponsors", post(add_sponsor))
        .route("/{mega_event_id}/images", post(add_images))
        .route("/{mega_event_id}/images/{image_id}", delete(remove_image))
}
