//! Commands for the Event context.

use chrono::{DateTime, Utc};

use convoca_core::category::Category;
use convoca_core::image::NormalizedImage;
use convoca_core::location::Location;

use super::aggregate::{EventKind, ParticipantKind};
use super::lifecycle::EventStatus;

/// Command to create an event in the draft state.
#[derive(Debug, Clone)]
pub struct CreateEvent {
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: Option<String>,
    /// Start timestamp.
    pub starts_at: DateTime<Utc>,
    /// Optional end timestamp.
    pub ends_at: Option<DateTime<Utc>>,
    /// Optional enrollment deadline.
    pub enrollment_deadline: Option<DateTime<Utc>>,
    /// Where the event takes place.
    pub location: Location,
    /// Event kind.
    pub kind: EventKind,
    /// Thematic category; defaults to social.
    pub category: Option<Category>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Capacity ceiling.
    pub capacity_ceiling: Option<u32>,
    /// Whether enrollment starts open; defaults to open.
    pub enrollment_open: Option<bool>,
    /// Whether registrations need organizer approval.
    pub requires_approval: bool,
    /// Sponsoring companies known at create time.
    pub sponsor_company_ids: Vec<i64>,
    /// Promoting companies known at create time.
    pub promoter_company_ids: Vec<i64>,
}

/// Command to update an event's mutable fields. Absent fields are unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateEvent {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New start timestamp.
    pub starts_at: Option<DateTime<Utc>>,
    /// New end timestamp.
    pub ends_at: Option<DateTime<Utc>>,
    /// New enrollment deadline.
    pub enrollment_deadline: Option<DateTime<Utc>>,
    /// New location.
    pub location: Option<Location>,
    /// New event kind.
    pub kind: Option<EventKind>,
    /// New category.
    pub category: Option<Category>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
    /// New capacity ceiling.
    pub capacity_ceiling: Option<u32>,
    /// New enrollment-open flag.
    pub enrollment_open: Option<bool>,
    /// New approval requirement.
    pub requires_approval: Option<bool>,
}

impl UpdateEvent {
    /// Returns whether the command carries no changes at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.starts_at.is_none()
            && self.ends_at.is_none()
            && self.enrollment_deadline.is_none()
            && self.location.is_none()
            && self.kind.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.capacity_ceiling.is_none()
            && self.enrollment_open.is_none()
            && self.requires_approval.is_none()
    }
}

/// Command to move an event to a new lifecycle status.
#[derive(Debug, Clone)]
pub struct ChangeEventStatus {
    /// Requested target status.
    pub target: EventStatus,
    /// Optional human-readable reason for the history log.
    pub reason: Option<String>,
}

/// Command to register an external member as a participant.
#[derive(Debug, Clone)]
pub struct RegisterParticipant {
    /// External member id.
    pub member_id: i64,
    /// Participation kind.
    pub kind: ParticipantKind,
    /// Free-text comments.
    pub comments: Option<String>,
}

/// Command to record a participant's attendance.
#[derive(Debug, Clone)]
pub struct RegisterAttendance {
    /// External member id.
    pub member_id: i64,
    /// Whether the member attended.
    pub attended: bool,
}

/// Command to add a sponsoring company.
#[derive(Debug, Clone)]
pub struct AddSponsor {
    /// Sponsoring company id.
    pub company_id: i64,
}

/// Command to append normalized image uploads.
#[derive(Debug, Clone)]
pub struct AddImages {
    /// Uploads produced by the blob-ingestion collaborator.
    pub images: Vec<NormalizedImage>,
}
