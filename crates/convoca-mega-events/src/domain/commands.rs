//! Commands for the MegaEvent context.

use chrono::{DateTime, Utc};

use convoca_core::category::Category;
use convoca_core::image::NormalizedImage;
use convoca_core::location::Location;

use super::aggregate::{
    Availability, MegaParticipantKind, OrganizerRole, Priority, SponsorshipTier,
};
use super::lifecycle::MegaEventStatus;

/// An initial sponsor pledge supplied at create time.
#[derive(Debug, Clone)]
pub struct SponsorInput {
    /// Sponsoring company id.
    pub company_id: i64,
    /// Sponsorship tier.
    pub tier: SponsorshipTier,
    /// Pledged amount.
    pub amount: Option<f64>,
    /// Free-text description of the contribution.
    pub description: Option<String>,
}

/// Command to create a mega-event in the planning state.
#[derive(Debug, Clone)]
pub struct CreateMegaEvent {
    /// Mega-event title.
    pub title: String,
    /// Mega-event description.
    pub description: Option<String>,
    /// Start timestamp.
    pub starts_at: DateTime<Utc>,
    /// End timestamp (mandatory).
    pub ends_at: DateTime<Utc>,
    /// Optional enrollment deadline.
    pub enrollment_deadline: Option<DateTime<Utc>>,
    /// Where the mega-event takes place.
    pub location: Location,
    /// Thematic category; defaults to social.
    pub category: Option<Category>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Capacity ceiling.
    pub capacity_ceiling: Option<u32>,
    /// Whether registrations need organizer approval.
    pub requires_approval: bool,
    /// Execution priority; defaults to medium.
    pub priority: Option<Priority>,
    /// Sponsor pledges known at create time.
    pub sponsors: Vec<SponsorInput>,
}

/// Command to update a mega-event's mutable fields. Absent fields are
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateMegaEvent {
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
    /// New category.
    pub category: Option<Category>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
    /// New capacity ceiling.
    pub capacity_ceiling: Option<u32>,
    /// New approval requirement.
    pub requires_approval: Option<bool>,
    /// New priority.
    pub priority: Option<Priority>,
}

impl UpdateMegaEvent {
    /// Returns whether the command carries no changes at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.starts_at.is_none()
            && self.ends_at.is_none()
            && self.enrollment_deadline.is_none()
            && self.location.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.capacity_ceiling.is_none()
            && self.requires_approval.is_none()
            && self.priority.is_none()
    }
}

/// Command to move a mega-event to a new lifecycle status.
#[derive(Debug, Clone)]
pub struct ChangeMegaEventStatus {
    /// Requested target status.
    pub target: MegaEventStatus,
    /// Optional human-readable reason for the history log.
    pub reason: Option<String>,
}

/// Command to register an external member as a participant.
#[derive(Debug, Clone)]
pub struct RegisterMegaParticipant {
    /// External member id.
    pub member_id: i64,
    /// Participation kind.
    pub kind: MegaParticipantKind,
    /// Skills the member offers.
    pub skills: Vec<String>,
    /// Declared availability.
    pub availability: Availability,
    /// Free-text comments.
    pub comments: Option<String>,
}

/// Command to record a participant's attendance.
#[derive(Debug, Clone)]
pub struct RegisterMegaAttendance {
    /// External member id.
    pub member_id: i64,
    /// Whether the member attended.
    pub attended: bool,
}

/// Command to add a co-organizing NGO.
#[derive(Debug, Clone)]
pub struct AddOrganizer {
    /// Joining NGO id.
    pub ngo_id: i64,
    /// Role within the umbrella; defaults to collaborator.
    pub role: Option<OrganizerRole>,
    /// Responsibilities the NGO takes on.
    pub responsibilities: Vec<String>,
}

/// Command to add a sponsor pledge.
#[derive(Debug, Clone)]
pub struct AddMegaSponsor {
    /// Sponsoring company id.
    pub company_id: i64,
    /// Sponsorship tier.
    pub tier: SponsorshipTier,
    /// Pledged amount.
    pub amount: Option<f64>,
    /// Free-text description of the contribution.
    pub description: Option<String>,
}

/// Command to append normalized image uploads.
#[derive(Debug, Clone)]
pub struct AddMegaImages {
    /// Uploads produced by the blob-ingestion collaborator.
    pub images: Vec<NormalizedImage>,
}
