//! Command handlers for the Event context.
//!
//! Each handler authorizes the actor, runs the domain logic, and drives the
//! dual-write protocol: ledger-transaction-first strict creates and deletes,
//! document-first best-effort-mirrored updates. Mutations of an existing
//! aggregate serialize on its lock before loading.

use bson::oid::ObjectId;

use convoca_core::actor::{Actor, Role};
use convoca_core::clock::Clock;
use convoca_core::documents::DocumentCollection;
use convoca_core::dual_write;
use convoca_core::error::DomainError;
use convoca_core::ledger::{EventMirror, Ledger, NewEventRow, ParticipantRow};
use convoca_core::locks::AggregateLocks;

use crate::domain::aggregate::Event;
use crate::domain::commands::{
    AddImages, AddSponsor, ChangeEventStatus, CreateEvent, RegisterAttendance,
    RegisterParticipant, UpdateEvent,
};
use crate::domain::view::EventView;

fn lock_key(event_id: ObjectId) -> String {
    format!("event:{}", event_id.to_hex())
}

fn new_event_row(event: &Event) -> NewEventRow {
    NewEventRow {
        title: event.title.clone(),
        description: (!event.description.is_empty()).then(|| event.description.clone()),
        starts_at: event.starts_at,
        ends_at: event.ends_at,
        location_address: event.location.address.clone(),
        event_kind: event.kind.as_str().to_owned(),
        ngo_id: event.ngo_id,
        status: event.status.as_str().to_owned(),
        sponsor_company_ids: event.sponsor_company_ids.clone(),
        promoter_company_ids: event.promoter_company_ids.clone(),
    }
}

fn event_mirror(event: &Event) -> EventMirror {
    EventMirror {
        title: event.title.clone(),
        description: (!event.description.is_empty()).then(|| event.description.clone()),
        starts_at: event.starts_at,
        ends_at: event.ends_at,
        location_address: event.location.address.clone(),
        event_kind: event.kind.as_str().to_owned(),
    }
}

/// Loads a live (non-soft-deleted) event.
async fn load_active(
    documents: &dyn DocumentCollection<Event>,
    event_id: ObjectId,
) -> Result<Event, DomainError> {
    match documents.find(event_id).await? {
        Some(event) if event.active => Ok(event),
        _ => Err(DomainError::NotFound("event".into())),
    }
}

/// Only the owning NGO may manage an event.
fn authorize_owner(event: &Event, actor: &Actor) -> Result<(), DomainError> {
    if actor.role != Role::Ngo || actor.ledger_id != event.ngo_id {
        return Err(DomainError::Unauthorized(
            "only the owning NGO may manage this event".into(),
        ));
    }
    Ok(())
}

/// Handles the `CreateEvent` command: validates the actor and the payload,
/// inserts the ledger rows inside a transaction, persists the document
/// aggregate, then commits (compensating the document if the commit fails).
///
/// # Errors
///
/// Returns `Unauthorized` for non-NGO actors, `Validation` for invariant
/// violations, and `DualWriteFailure` when the cross-store write could not
/// be made atomic.
pub async fn handle_create_event(
    command: CreateEvent,
    actor: &Actor,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<Event>,
) -> Result<EventView, DomainError> {
    if actor.role != Role::Ngo {
        return Err(DomainError::Unauthorized("only NGOs can create events".into()));
    }
    if !ledger.is_active_ngo(actor.ledger_id).await? {
        return Err(DomainError::Unauthorized("only NGOs can create events".into()));
    }

    let mut event = Event::create(command, actor.ledger_id, clock.now())?;

    let (ledger_event_id, txn) = ledger.insert_event(&new_event_row(&event)).await?;
    event.ledger_event_id = ledger_event_id;

    let document_id = dual_write::create(txn, documents.insert(&event), |id| {
        documents.remove(id)
    })
    .await?;
    event.id = Some(document_id);

    tracing::info!(ledger_event_id, "event created");
    Ok(EventView::from(&event))
}

/// Returns the safe projection of a live event.
///
/// # Errors
///
/// Returns `NotFound` if the event is absent or soft-deleted.
pub async fn handle_get_event(
    event_id: ObjectId,
    documents: &dyn DocumentCollection<Event>,
) -> Result<EventView, DomainError> {
    let event = load_active(documents, event_id).await?;
    Ok(EventView::from(&event))
}

/// Handles the `UpdateEvent` command: saves the document first, then mirrors
/// the ledger row best-effort.
///
/// # Errors
///
/// Returns `NotFound`, `Unauthorized` or `Validation` before anything is
/// written. A ledger mirror failure is logged, not surfaced.
pub async fn handle_update_event(
    event_id: ObjectId,
    command: UpdateEvent,
    actor: &Actor,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<Event>,
    locks: &AggregateLocks,
) -> Result<EventView, DomainError> {
    let _guard = locks.acquire(lock_key(event_id)).await;
    let mut event = load_active(documents, event_id).await?;
    authorize_owner(&event, actor)?;

    event.apply_update(command)?;
    event.updated_at = clock.now();
    documents.save(&mut event).await?;

    dual_write::mirror(
        ledger.mirror_event(event.ledger_event_id, &event_mirror(&event)),
        "event",
    )
    .await;

    Ok(EventView::from(&event))
}

/// Handles the `DeleteEvent` operation: only permitted while no participants
/// are registered. Ledger child rows and the core row are deleted inside one
/// transaction; the document is soft-deleted between the statements and the
/// commit, and restored if the commit fails.
///
/// # Errors
///
/// Returns `HasDependents` if participants are registered, and
/// `DualWriteFailure` when the cross-store delete could not be made atomic.
pub async fn handle_delete_event(
    event_id: ObjectId,
    actor: &Actor,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<Event>,
    locks: &AggregateLocks,
) -> Result<(), DomainError> {
    let _guard = locks.acquire(lock_key(event_id)).await;
    let mut event = load_active(documents, event_id).await?;
    authorize_owner(&event, actor)?;

    if !event.participants.is_empty() {
        return Err(DomainError::HasDependents);
    }

    let txn = ledger.delete_event(event.ledger_event_id).await?;

    let restore = event.clone();
    event.soft_delete(actor.ledger_id, clock.now());
    if let Err(err) = documents.save(&mut event).await {
        if let Err(rollback_err) = txn.rollback().await {
            tracing::error!(error = %rollback_err, "ledger rollback failed after document soft-delete failure");
        }
        return Err(DomainError::DualWriteFailure(format!(
            "document soft-delete failed: {err}"
        )));
    }

    dual_write::commit(txn, move || async move {
        let mut restore = restore;
        documents.save(&mut restore).await
    })
    .await?;

    tracing::info!(ledger_event_id = event.ledger_event_id, "event deleted");
    Ok(())
}

/// Handles the `ChangeEventStatus` command through the lifecycle engine and
/// mirrors the new status to the ledger best-effort.
///
/// # Errors
///
/// Returns `Unauthorized`, `InvalidTransition` or `PreconditionFailed`
/// before anything is written.
pub async fn handle_change_status(
    event_id: ObjectId,
    command: ChangeEventStatus,
    actor: &Actor,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<Event>,
    locks: &AggregateLocks,
) -> Result<EventView, DomainError> {
    let _guard = locks.acquire(lock_key(event_id)).await;
    let mut event = load_active(documents, event_id).await?;
    authorize_owner(&event, actor)?;

    event.change_status(command.target, actor.ledger_id, command.reason, clock.now())?;
    event.updated_at = clock.now();
    documents.save(&mut event).await?;

    dual_write::mirror(
        ledger.mirror_event_status(event.ledger_event_id, event.status.as_str()),
        "event status",
    )
    .await;

    tracing::info!(
        ledger_event_id = event.ledger_event_id,
        status = event.status.as_str(),
        "event status changed"
    );
    Ok(EventView::from(&event))
}

/// Handles the `RegisterParticipant` command: verifies the member against
/// the ledger, applies the registration rules, saves the document and
/// mirrors the join row best-effort.
///
/// # Errors
///
/// Returns `NotFound` for unknown members and the registration-rule errors
/// of [`Event::register_participant`].
pub async fn handle_register_participant(
    event_id: ObjectId,
    command: RegisterParticipant,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<Event>,
    locks: &AggregateLocks,
) -> Result<EventView, DomainError> {
    if !ledger.member_exists(command.member_id).await? {
        return Err(DomainError::NotFound("member".into()));
    }

    let _guard = locks.acquire(lock_key(event_id)).await;
    let mut event = load_active(documents, event_id).await?;

    let status =
        event.register_participant(command.member_id, command.kind, command.comments, clock.now())?;
    event.updated_at = clock.now();
    documents.save(&mut event).await?;

    dual_write::mirror(
        ledger.insert_event_participant(
            event.ledger_event_id,
            &ParticipantRow {
                member_id: command.member_id,
                kind: command.kind.as_str().to_owned(),
                status: status.as_str().to_owned(),
            },
        ),
        "event participant",
    )
    .await;

    Ok(EventView::from(&event))
}

/// Handles the `RegisterAttendance` command and mirrors the attendance flag
/// best-effort.
///
/// # Errors
///
/// Returns `Unauthorized` for non-owners and `NotRegistered` for members
/// without a membership record.
pub async fn handle_register_attendance(
    event_id: ObjectId,
    command: RegisterAttendance,
    actor: &Actor,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<Event>,
    locks: &AggregateLocks,
) -> Result<EventView, DomainError> {
    let _guard = locks.acquire(lock_key(event_id)).await;
    let mut event = load_active(documents, event_id).await?;
    authorize_owner(&event, actor)?;

    event.register_attendance(command.member_id, command.attended)?;
    event.updated_at = clock.now();
    documents.save(&mut event).await?;

    dual_write::mirror(
        ledger.set_event_attendance(event.ledger_event_id, command.member_id, command.attended),
        "event attendance",
    )
    .await;

    Ok(EventView::from(&event))
}

/// Handles the `AddSponsor` command: the company must exist in the ledger;
/// the embedded list is the primary write, the join row a best-effort mirror.
///
/// # Errors
///
/// Returns `NotFound` for unknown companies and `AlreadySponsor` for
/// duplicates.
pub async fn handle_add_sponsor(
    event_id: ObjectId,
    command: AddSponsor,
    actor: &Actor,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<Event>,
    locks: &AggregateLocks,
) -> Result<EventView, DomainError> {
    if !ledger.company_exists(command.company_id).await? {
        return Err(DomainError::NotFound("company".into()));
    }

    let _guard = locks.acquire(lock_key(event_id)).await;
    let mut event = load_active(documents, event_id).await?;
    authorize_owner(&event, actor)?;

    event.add_sponsor(command.company_id)?;
    event.updated_at = clock.now();
    documents.save(&mut event).await?;

    dual_write::mirror(
        ledger.insert_event_sponsor(event.ledger_event_id, command.company_id),
        "event sponsor",
    )
    .await;

    Ok(EventView::from(&event))
}

/// Handles the `AddImages` command. Images live only in the document store.
///
/// # Errors
///
/// Returns `TooManyImages` if the append would exceed the per-event ceiling.
pub async fn handle_add_images(
    event_id: ObjectId,
    command: AddImages,
    actor: &Actor,
    clock: &dyn Clock,
    documents: &dyn DocumentCollection<Event>,
    locks: &AggregateLocks,
) -> Result<EventView, DomainError> {
    let _guard = locks.acquire(lock_key(event_id)).await;
    let mut event = load_active(documents, event_id).await?;
    authorize_owner(&event, actor)?;

    event.add_images(command.images, clock.now())?;
    event.updated_at = clock.now();
    documents.save(&mut event).await?;

    Ok(EventView::from(&event))
}

/// Removes an embedded image from the event.
///
/// # Errors
///
/// Returns `NotFound` if no image with that id is attached.
pub async fn handle_remove_image(
    event_id: ObjectId,
    image_id: uuid::Uuid,
    actor: &Actor,
    clock: &dyn Clock,
    documents: &dyn DocumentCollection<Event>,
    locks: &AggregateLocks,
) -> Result<EventView, DomainError> {
    let _guard = locks.acquire(lock_key(event_id)).await;
    let mut event = load_active(documents, event_id).await?;
    authorize_owner(&event, actor)?;

    event.remove_image(image_id)?;
    event.updated_at = clock.now();
    documents.save(&mut event).await?;

    Ok(EventView::from(&event))
}
