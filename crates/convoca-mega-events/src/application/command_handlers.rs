//! Command handlers for the MegaEvent context.
//!
//! Same shape as the Event handlers: authorize, run the domain logic, drive
//! the dual-write protocol. Management operations require an active
//! organizer with a managing role; sponsor and attendance operations accept
//! any active organizer.

use bson::oid::ObjectId;

use convoca_core::actor::{Actor, Role};
use convoca_core::clock::Clock;
use convoca_core::documents::DocumentCollection;
use convoca_core::dual_write;
use convoca_core::error::DomainError;
use convoca_core::ledger::{
    Ledger, MegaEventMirror, NewMegaEventRow, OrganizerRow, ParticipantRow, SponsorRow,
};
use convoca_core::locks::AggregateLocks;

use crate::domain::aggregate::{MegaEvent, PledgeStatus};
use crate::domain::commands::{
    AddMegaImages, AddMegaSponsor, AddOrganizer, ChangeMegaEventStatus, CreateMegaEvent,
    RegisterMegaAttendance, RegisterMegaParticipant, UpdateMegaEvent,
};
use crate::domain::view::MegaEventView;

fn lock_key(mega_event_id: ObjectId) -> String {
    format!("mega-event:{}", mega_event_id.to_hex())
}

fn new_mega_event_row(mega_event: &MegaEvent) -> NewMegaEventRow {
    NewMegaEventRow {
        title: mega_event.title.clone(),
        description: (!mega_event.description.is_empty()).then(|| mega_event.description.clone()),
        starts_at: mega_event.starts_at,
        ends_at: mega_event.ends_at,
        location_address: mega_event.location.address.clone(),
        principal_ngo_id: mega_event.principal_ngo_id,
        status: mega_event.status.as_str().to_owned(),
        sponsors: mega_event.sponsors.iter().map(sponsor_row).collect(),
    }
}

fn sponsor_row(pledge: &crate::domain::aggregate::SponsorPledge) -> SponsorRow {
    SponsorRow {
        company_id: pledge.company_id,
        tier: pledge.tier.as_str().to_owned(),
        amount: pledge.amount,
        status: pledge.status.as_str().to_owned(),
    }
}

fn mega_event_mirror(mega_event: &MegaEvent) -> MegaEventMirror {
    MegaEventMirror {
        title: mega_event.title.clone(),
        description: (!mega_event.description.is_empty()).then(|| mega_event.description.clone()),
        starts_at: mega_event.starts_at,
        ends_at: mega_event.ends_at,
        location_address: mega_event.location.address.clone(),
    }
}

/// Loads a live (non-soft-deleted) mega-event.
async fn load_active(
    documents: &dyn DocumentCollection<MegaEvent>,
    mega_event_id: ObjectId,
) -> Result<MegaEvent, DomainError> {
    match documents.find(mega_event_id).await? {
        Some(mega_event) if mega_event.active => Ok(mega_event),
        _ => Err(DomainError::NotFound("mega-event".into())),
    }
}

/// Management operations need an active organizer holding a managing role.
fn authorize_manager(mega_event: &MegaEvent, actor: &Actor) -> Result<(), DomainError> {
    let manages = actor.role == Role::Ngo
        && mega_event
            .active_organizer(actor.ledger_id)
            .is_some_and(|organizer| organizer.role.can_manage());
    if manages {
        Ok(())
    } else {
        Err(DomainError::Unauthorized(
            "only a coordinating organizer may manage this mega-event".into(),
        ))
    }
}

/// Sponsor and attendance operations accept any active organizer.
fn authorize_organizer(mega_event: &MegaEvent, actor: &Actor) -> Result<(), DomainError> {
    if actor.role == Role::Ngo && mega_event.active_organizer(actor.ledger_id).is_some() {
        Ok(())
    } else {
        Err(DomainError::Unauthorized(
            "only an organizing NGO may perform this operation".into(),
        ))
    }
}

/// Handles the `CreateMegaEvent` command: validates the actor and payload,
/// inserts the ledger rows (core row, principal organizer, initial sponsor
/// pledges) inside a transaction, persists the document aggregate, then
/// commits (compensating the document if the commit fails).
///
/// # Errors
///
/// Returns `Unauthorized` for non-NGO actors, `Validation` for invariant
/// violations, and `DualWriteFailure` when the cross-store write could not
/// be made atomic.
pub async fn handle_create_mega_event(
    command: CreateMegaEvent,
    actor: &Actor,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<MegaEvent>,
) -> Result<MegaEventView, DomainError> {
    if actor.role != Role::Ngo {
        return Err(DomainError::Unauthorized(
            "only NGOs can create mega-events".into(),
        ));
    }
    if !ledger.is_active_ngo(actor.ledger_id).await? {
        return Err(DomainError::Unauthorized(
            "only NGOs can create mega-events".into(),
        ));
    }

    let mut mega_event = MegaEvent::create(command, actor.ledger_id, clock.now())?;

    let (ledger_mega_event_id, txn) =
        ledger.insert_mega_event(&new_mega_event_row(&mega_event)).await?;
    mega_event.ledger_mega_event_id = ledger_mega_event_id;

    let document_id = dual_write::create(txn, documents.insert(&mega_event), |id| {
        documents.remove(id)
    })
    .await?;
    mega_event.id = Some(document_id);

    tracing::info!(ledger_mega_event_id, "mega-event created");
    Ok(MegaEventView::from(&mega_event))
}

/// Returns the safe projection of a live mega-event.
///
/// # Errors
///
/// Returns `NotFound` if the mega-event is absent or soft-deleted.
pub async fn handle_get_mega_event(
    mega_event_id: ObjectId,
    documents: &dyn DocumentCollection<MegaEvent>,
) -> Result<MegaEventView, DomainError> {
    let mega_event = load_active(documents, mega_event_id).await?;
    Ok(MegaEventView::from(&mega_event))
}

/// Handles the `UpdateMegaEvent` command: saves the document first, then
/// mirrors the ledger row best-effort.
///
/// # Errors
///
/// Returns `NotFound`, `Unauthorized` or `Validation` before anything is
/// written. A ledger mirror failure is logged, not surfaced.
pub async fn handle_update_mega_event(
    mega_event_id: ObjectId,
    command: UpdateMegaEvent,
    actor: &Actor,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<MegaEvent>,
    locks: &AggregateLocks,
) -> Result<MegaEventView, DomainError> {
    let _guard = locks.acquire(lock_key(mega_event_id)).await;
    let mut mega_event = load_active(documents, mega_event_id).await?;
    authorize_manager(&mega_event, actor)?;

    mega_event.apply_update(command)?;
    mega_event.updated_at = clock.now();
    documents.save(&mut mega_event).await?;

    dual_write::mirror(
        ledger.mirror_mega_event(
            mega_event.ledger_mega_event_id,
            &mega_event_mirror(&mega_event),
        ),
        "mega-event",
    )
    .await;

    Ok(MegaEventView::from(&mega_event))
}

/// Handles the `DeleteMegaEvent` operation: only permitted while no
/// participants are registered. Ledger child rows and the core row are
/// deleted inside one transaction; the document is soft-deleted between the
/// statements and the commit, and restored if the commit fails.
///
/// # Errors
///
/// Returns `HasDependents` if participants are registered, and
/// `DualWriteFailure` when the cross-store delete could not be made atomic.
pub async fn handle_delete_mega_event(
    mega_event_id: ObjectId,
    actor: &Actor,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<MegaEvent>,
    locks: &AggregateLocks,
) -> Result<(), DomainError> {
    let _guard = locks.acquire(lock_key(mega_event_id)).await;
    let mut mega_event = load_active(documents, mega_event_id).await?;
    authorize_manager(&mega_event, actor)?;

    if !mega_event.participants.is_empty() {
        return Err(DomainError::HasDependents);
    }

    let txn = ledger.delete_mega_event(mega_event.ledger_mega_event_id).await?;

    let restore = mega_event.clone();
    mega_event.soft_delete(actor.ledger_id, clock.now());
    if let Err(err) = documents.save(&mut mega_event).await {
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

    tracing::info!(
        ledger_mega_event_id = mega_event.ledger_mega_event_id,
        "mega-event deleted"
    );
    Ok(())
}

/// Handles the `ChangeMegaEventStatus` command through the lifecycle engine
/// and mirrors the new status to the ledger best-effort.
///
/// # Errors
///
/// Returns `Unauthorized`, `InvalidTransition` or `PreconditionFailed`
/// before anything is written.
pub async fn handle_change_status(
    mega_event_id: ObjectId,
    command: ChangeMegaEventStatus,
    actor: &Actor,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<MegaEvent>,
    locks: &AggregateLocks,
) -> Result<MegaEventView, DomainError> {
    let _guard = locks.acquire(lock_key(mega_event_id)).await;
    let mut mega_event = load_active(documents, mega_event_id).await?;
    authorize_manager(&mega_event, actor)?;

    mega_event.change_status(command.target, actor.ledger_id, command.reason, clock.now())?;
    mega_event.updated_at = clock.now();
    documents.save(&mut mega_event).await?;

    dual_write::mirror(
        ledger.mirror_mega_event_status(
            mega_event.ledger_mega_event_id,
            mega_event.status.as_str(),
        ),
        "mega-event status",
    )
    .await;

    tracing::info!(
        ledger_mega_event_id = mega_event.ledger_mega_event_id,
        status = mega_event.status.as_str(),
        "mega-event status changed"
    );
    Ok(MegaEventView::from(&mega_event))
}

/// Handles the `RegisterMegaParticipant` command: verifies the member
/// against the ledger, applies the registration rules, saves the document
/// and mirrors the join row best-effort.
///
/// # Errors
///
/// Returns `NotFound` for unknown members and the registration-rule errors
/// of [`MegaEvent::register_participant`].
pub async fn handle_register_participant(
    mega_event_id: ObjectId,
    command: RegisterMegaParticipant,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<MegaEvent>,
    locks: &AggregateLocks,
) -> Result<MegaEventView, DomainError> {
    if !ledger.member_exists(command.member_id).await? {
        return Err(DomainError::NotFound("member".into()));
    }

    let _guard = locks.acquire(lock_key(mega_event_id)).await;
    let mut mega_event = load_active(documents, mega_event_id).await?;

    let status = mega_event.register_participant(
        command.member_id,
        command.kind,
        command.skills,
        command.availability,
        command.comments,
        clock.now(),
    )?;
    mega_event.updated_at = clock.now();
    documents.save(&mut mega_event).await?;

    dual_write::mirror(
        ledger.insert_mega_event_participant(
            mega_event.ledger_mega_event_id,
            &ParticipantRow {
                member_id: command.member_id,
                kind: command.kind.as_str().to_owned(),
                status: status.as_str().to_owned(),
            },
        ),
        "mega-event participant",
    )
    .await;

    Ok(MegaEventView::from(&mega_event))
}

/// Handles the `RegisterMegaAttendance` command and mirrors the attendance
/// flag best-effort.
///
/// # Errors
///
/// Returns `Unauthorized` for non-organizers and `NotRegistered` for members
/// without a membership record.
pub async fn handle_register_attendance(
    mega_event_id: ObjectId,
    command: RegisterMegaAttendance,
    actor: &Actor,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<MegaEvent>,
    locks: &AggregateLocks,
) -> Result<MegaEventView, DomainError> {
    let _guard = locks.acquire(lock_key(mega_event_id)).await;
    let mut mega_event = load_active(documents, mega_event_id).await?;
    authorize_organizer(&mega_event, actor)?;

    mega_event.register_attendance(command.member_id, command.attended)?;
    mega_event.updated_at = clock.now();
    documents.save(&mut mega_event).await?;

    dual_write::mirror(
        ledger.set_mega_event_attendance(
            mega_event.ledger_mega_event_id,
            command.member_id,
            command.attended,
        ),
        "mega-event attendance",
    )
    .await;

    Ok(MegaEventView::from(&mega_event))
}

/// Handles the `AddOrganizer` command: the joining organization must be an
/// active NGO in the ledger; the embedded record is the primary write, the
/// join row a best-effort mirror.
///
/// # Errors
///
/// Returns `NotAnNgo` if the joining organization is not an active NGO and
/// `AlreadyOrganizer` for duplicates.
pub async fn handle_add_organizer(
    mega_event_id: ObjectId,
    command: AddOrganizer,
    actor: &Actor,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<MegaEvent>,
    locks: &AggregateLocks,
) -> Result<MegaEventView, DomainError> {
    if !ledger.is_active_ngo(command.ngo_id).await? {
        return Err(DomainError::NotAnNgo(command.ngo_id));
    }

    let _guard = locks.acquire(lock_key(mega_event_id)).await;
    let mut mega_event = load_active(documents, mega_event_id).await?;
    authorize_manager(&mega_event, actor)?;

    let role = command.role.unwrap_or_default();
    mega_event.add_organizer(
        command.ngo_id,
        command.role,
        command.responsibilities,
        clock.now(),
    )?;
    mega_event.updated_at = clock.now();
    documents.save(&mut mega_event).await?;

    dual_write::mirror(
        ledger.insert_mega_event_organizer(
            mega_event.ledger_mega_event_id,
            &OrganizerRow {
                ngo_id: command.ngo_id,
                role: role.as_str().to_owned(),
                active: true,
            },
        ),
        "mega-event organizer",
    )
    .await;

    Ok(MegaEventView::from(&mega_event))
}

/// Handles the `AddMegaSponsor` command: the company must exist in the
/// ledger; the pledge starts in the pledged state.
///
/// # Errors
///
/// Returns `NotFound` for unknown companies and `AlreadySponsor` for
/// duplicates.
pub async fn handle_add_sponsor(
    mega_event_id: ObjectId,
    command: AddMegaSponsor,
    actor: &Actor,
    clock: &dyn Clock,
    ledger: &dyn Ledger,
    documents: &dyn DocumentCollection<MegaEvent>,
    locks: &AggregateLocks,
) -> Result<MegaEventView, DomainError> {
    if !ledger.company_exists(command.company_id).await? {
        return Err(DomainError::NotFound("company".into()));
    }

    let _guard = locks.acquire(lock_key(mega_event_id)).await;
    let mut mega_event = load_active(documents, mega_event_id).await?;
    authorize_organizer(&mega_event, actor)?;

    mega_event.add_sponsor(
        command.company_id,
        command.tier,
        command.amount,
        command.description,
        clock.now(),
    )?;
    mega_event.updated_at = clock.now();
    documents.save(&mut mega_event).await?;

    dual_write::mirror(
        ledger.insert_mega_event_sponsor(
            mega_event.ledger_mega_event_id,
            &SponsorRow {
                company_id: command.company_id,
                tier: command.tier.as_str().to_owned(),
                amount: command.amount,
                status: PledgeStatus::Pledged.as_str().to_owned(),
            },
        ),
        "mega-event sponsor",
    )
    .await;

    Ok(MegaEventView::from(&mega_event))
}

/// Handles the `AddMegaImages` command. Images live only in the document
/// store.
///
/// # Errors
///
/// Returns `TooManyImages` if the append would exceed the per-mega-event
/// ceiling.
pub async fn handle_add_images(
    mega_event_id: ObjectId,
    command: AddMegaImages,
    actor: &Actor,
    clock: &dyn Clock,
    documents: &dyn DocumentCollection<MegaEvent>,
    locks: &AggregateLocks,
) -> Result<MegaEventView, DomainError> {
    let _guard = locks.acquire(lock_key(mega_event_id)).await;
    let mut mega_event = load_active(documents, mega_event_id).await?;
    authorize_manager(&mega_event, actor)?;

    mega_event.add_images(command.images, clock.now())?;
    mega_event.updated_at = clock.now();
    documents.save(&mut mega_event).await?;

    Ok(MegaEventView::from(&mega_event))
}

/// Removes an embedded image from the mega-event.
///
/// # Errors
///
/// Returns `NotFound` if no image with that id is attached.
pub async fn handle_remove_image(
    mega_event_id: ObjectId,
    image_id: uuid::Uuid,
    actor: &Actor,
    clock: &dyn Clock,
    documents: &dyn DocumentCollection<MegaEvent>,
    locks: &AggregateLocks,
) -> Result<MegaEventView, DomainError> {
    let _guard = locks.acquire(lock_key(mega_event_id)).await;
    let mut mega_event = load_active(documents, mega_event_id).await?;
    authorize_manager(&mega_event, actor)?;

    mega_event.remove_image(image_id)?;
    mega_event.updated_at = clock.now();
    documents.save(&mut mega_event).await?;

    Ok(MegaEventView::from(&mega_event))
}
