//! The Event aggregate root.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use convoca_core::category::Category;
use convoca_core::documents::Aggregate;
use convoca_core::error::DomainError;
use convoca_core::history::StateHistoryEntry;
use convoca_core::image::PromoImage;
use convoca_core::location::Location;
use convoca_core::membership::ParticipationStatus;

use super::commands::{CreateEvent, UpdateEvent};
use super::lifecycle::EventStatus;

/// Hard ceiling on embedded promotional images per event.
pub const EVENT_IMAGE_CEILING: u32 = 10;

/// Largest capacity ceiling an event may declare.
pub const EVENT_CAPACITY_MAX: u32 = 5_000;

/// What an event is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A conference.
    Conference,
    /// A hands-on workshop.
    Workshop,
    /// A seminar.
    Seminar,
    /// A training course.
    Training,
    /// A volunteering activity.
    Volunteering,
    /// A fundraising drive.
    Fundraising,
    /// A cultural gathering.
    Cultural,
    /// A sports activity.
    Sports,
    /// Anything else.
    Other,
}

impl EventKind {
    /// Returns the snake_case tag for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conference => "conference",
            Self::Workshop => "workshop",
            Self::Seminar => "seminar",
            Self::Training => "training",
            Self::Volunteering => "volunteering",
            Self::Fundraising => "fundraising",
            Self::Cultural => "cultural",
            Self::Sports => "sports",
            Self::Other => "other",
        }
    }
}

/// How a member participates in an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    /// Regular attendee.
    #[default]
    Participant,
    /// Volunteer helping to run the event.
    Volunteer,
}

impl ParticipantKind {
    /// Returns the snake_case tag for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::Volunteer => "volunteer",
        }
    }
}

/// A participant membership record, owned exclusively by its event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// External member id (ledger reference).
    pub member_id: i64,
    /// Participation kind.
    pub kind: ParticipantKind,
    /// Approval state of the registration.
    pub status: ParticipationStatus,
    /// When the member registered.
    pub registered_at: DateTime<Utc>,
    /// Attendance flag; unset until attendance is recorded.
    pub attended: Option<bool>,
    /// Free-text comments.
    pub comments: String,
}

/// Metrics derived from the embedded participant list.
///
/// Always re-derived on every mutating save, never independently settable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMetrics {
    /// Number of membership records.
    pub total_registered: u32,
    /// Number of members with `attended == Some(true)`.
    pub total_attended: u32,
    /// `round(100 * total_attended / total_registered)`, 0 when empty.
    pub attendance_pct: u32,
    /// Capacity utilization stamped by the finish snapshot.
    pub capacity_utilization_pct: Option<u32>,
    /// When the final snapshot was computed.
    pub final_computed_at: Option<DateTime<Utc>>,
}

/// The aggregate root for a single-organization event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Document id, assigned by the document store.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Ledger row id (system of record), assigned inside the create
    /// transaction. 1:1, unique, immutable after creation.
    pub ledger_event_id: i64,
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: String,
    /// Start timestamp.
    pub starts_at: DateTime<Utc>,
    /// Optional end timestamp; must be after `starts_at` when set.
    pub ends_at: Option<DateTime<Utc>>,
    /// Enrollment deadline; must not be after `starts_at` when set.
    pub enrollment_deadline: Option<DateTime<Utc>>,
    /// Stamped when the event is finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Stamped when the event is cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Where the event takes place.
    pub location: Location,
    /// Event kind.
    pub kind: EventKind,
    /// Thematic category.
    pub category: Category,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Owning NGO (ledger reference).
    pub ngo_id: i64,
    /// Ledger id of the user who created the event.
    pub created_by: i64,
    /// Capacity ceiling; unlimited when unset.
    pub capacity_ceiling: Option<u32>,
    /// Whether new registrations are accepted.
    pub enrollment_open: bool,
    /// Whether registrations start in the awaiting-approval state.
    pub requires_approval: bool,
    /// Lifecycle status.
    pub status: EventStatus,
    /// Public visibility flag.
    pub public: bool,
    /// Soft-delete flag.
    pub active: bool,
    /// Sponsoring companies (ledger references).
    pub sponsor_company_ids: Vec<i64>,
    /// Promoting companies (ledger references).
    pub promoter_company_ids: Vec<i64>,
    /// Embedded participant list, unique by member id.
    pub participants: Vec<Participant>,
    /// Embedded promotional images.
    pub images: Vec<PromoImage>,
    /// Derived metrics.
    pub metrics: EventMetrics,
    /// Append-only state-history log.
    pub history: Vec<StateHistoryEntry<EventStatus>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-save timestamp.
    pub updated_at: DateTime<Utc>,
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    let trimmed = title.trim();
    if trimmed.len() < 3 {
        return Err(DomainError::Validation(
            "title must be at least 3 characters".into(),
        ));
    }
    if trimmed.len() > 200 {
        return Err(DomainError::Validation(
            "title must be at most 200 characters".into(),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), DomainError> {
    if description.len() > 5_000 {
        return Err(DomainError::Validation(
            "description must be at most 5000 characters".into(),
        ));
    }
    Ok(())
}

fn validate_capacity(ceiling: u32) -> Result<(), DomainError> {
    if ceiling == 0 || ceiling > EVENT_CAPACITY_MAX {
        return Err(DomainError::Validation(format!(
            "capacity ceiling must be between 1 and {EVENT_CAPACITY_MAX}"
        )));
    }
    Ok(())
}

impl Event {
    /// Creates a new draft event from a create command.
    ///
    /// The ledger id is assigned later, inside the create transaction.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the title, description, dates,
    /// location or capacity ceiling violate the aggregate invariants.
    pub fn create(command: CreateEvent, ngo_id: i64, now: DateTime<Utc>) -> Result<Self, DomainError> {
        validate_title(&command.title)?;
        let description = command.description.unwrap_or_default();
        validate_description(&description)?;
        command.location.validate()?;
        if let Some(ends_at) = command.ends_at {
            if ends_at <= command.starts_at {
                return Err(DomainError::Validation(
                    "end date must be after the start date".into(),
                ));
            }
        }
        if let Some(deadline) = command.enrollment_deadline {
            if deadline > command.starts_at {
                return Err(DomainError::Validation(
                    "enrollment deadline must not be after the start date".into(),
                ));
            }
        }
        if let Some(ceiling) = command.capacity_ceiling {
            validate_capacity(ceiling)?;
        }

        let status = EventStatus::Draft;
        Ok(Self {
            id: None,
            ledger_event_id: 0,
            title: command.title.trim().to_owned(),
            description,
            starts_at: command.starts_at,
            ends_at: command.ends_at,
            enrollment_deadline: command.enrollment_deadline,
            finished_at: None,
            cancelled_at: None,
            location: command.location,
            kind: command.kind,
            category: command.category.unwrap_or_default(),
            tags: command.tags,
            ngo_id,
            created_by: ngo_id,
            capacity_ceiling: command.capacity_ceiling,
            enrollment_open: command.enrollment_open.unwrap_or(true),
            requires_approval: command.requires_approval,
            status,
            public: false,
            active: true,
            sponsor_company_ids: command.sponsor_company_ids,
            promoter_company_ids: command.promoter_company_ids,
            participants: Vec::new(),
            images: Vec::new(),
            metrics: EventMetrics::default(),
            history: vec![StateHistoryEntry {
                previous: None,
                next: status,
                at: now,
                acting_user_id: ngo_id,
                reason: "event created".to_owned(),
            }],
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies an update command to the mutable fields.
    ///
    /// The lifecycle status is not among them; only `change_status` moves it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the command carries no changes or
    /// the resulting field values violate the aggregate invariants.
    pub fn apply_update(&mut self, command: UpdateEvent) -> Result<(), DomainError> {
        if command.is_empty() {
            return Err(DomainError::Validation("no changes provided".into()));
        }

        if let Some(title) = command.title {
            validate_title(&title)?;
            self.title = title.trim().to_owned();
        }
        if let Some(description) = command.description {
            validate_description(&description)?;
            self.description = description;
        }
        if let Some(starts_at) = command.starts_at {
            self.starts_at = starts_at;
        }
        if let Some(ends_at) = command.ends_at {
            self.ends_at = Some(ends_at);
        }
        if let Some(deadline) = command.enrollment_deadline {
            self.enrollment_deadline = Some(deadline);
        }
        if let Some(location) = command.location {
            location.validate()?;
            self.location = location;
        }
        if let Some(kind) = command.kind {
            self.kind = kind;
        }
        if let Some(category) = command.category {
            self.category = category;
        }
        if let Some(tags) = command.tags {
            self.tags = tags;
        }
        if let Some(ceiling) = command.capacity_ceiling {
            validate_capacity(ceiling)?;
            self.capacity_ceiling = Some(ceiling);
        }
        if let Some(open) = command.enrollment_open {
            self.enrollment_open = open;
        }
        if let Some(requires_approval) = command.requires_approval {
            self.requires_approval = requires_approval;
        }

        if let Some(ends_at) = self.ends_at {
            if ends_at <= self.starts_at {
                return Err(DomainError::Validation(
                    "end date must be after the start date".into(),
                ));
            }
        }
        if let Some(deadline) = self.enrollment_deadline {
            if deadline > self.starts_at {
                return Err(DomainError::Validation(
                    "enrollment deadline must not be after the start date".into(),
                ));
            }
        }
        Ok(())
    }
}

impl Aggregate for Event {
    const COLLECTION: &'static str = "events";
    const LEDGER_ID_FIELD: &'static str = "ledger_event_id";

    fn document_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_document_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn ledger_id(&self) -> i64 {
        self.ledger_event_id
    }

    fn set_ledger_id(&mut self, id: i64) {
        self.ledger_event_id = id;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn recompute_metrics(&mut self) {
        let total_registered = self.participants.len() as u32;
        let total_attended = self
            .participants
            .iter()
            .filter(|participant| participant.attended == Some(true))
            .count() as u32;
        self.metrics.total_registered = total_registered;
        self.metrics.total_attended = total_attended;
        self.metrics.attendance_pct = if total_registered == 0 {
            0
        } else {
            (f64::from(total_attended) * 100.0 / f64::from(total_registered)).round() as u32
        };
    }
}
