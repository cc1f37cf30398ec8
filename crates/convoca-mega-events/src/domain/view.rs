//! Safe external projection of the MegaEvent aggregate.

use chrono::{DateTime, Utc};
use serde::Serialize;

use convoca_core::category::Category;
use convoca_core::history::StateHistoryEntry;
use convoca_core::image::ImageView;
use convoca_core::location::Location;

use super::aggregate::{
    MegaEvent, MegaEventMetrics, MegaParticipant, Organizer, Priority, SponsorPledge,
};
use super::lifecycle::MegaEventStatus;

/// What the outside world sees of a mega-event: the stored aggregate minus
/// raw image bytes, with the document id rendered as a hex string.
#[derive(Debug, Clone, Serialize)]
pub struct MegaEventView {
    /// Document id (hex).
    pub id: String,
    /// Ledger row id.
    pub ledger_mega_event_id: i64,
    /// Mega-event title.
    pub title: String,
    /// Mega-event description.
    pub description: String,
    /// Start timestamp.
    pub starts_at: DateTime<Utc>,
    /// End timestamp.
    pub ends_at: DateTime<Utc>,
    /// Enrollment deadline.
    pub enrollment_deadline: Option<DateTime<Utc>>,
    /// When the mega-event finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// When the mega-event was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Where the mega-event takes place.
    pub location: Location,
    /// Thematic category.
    pub category: Category,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Principal organizing NGO.
    pub principal_ngo_id: i64,
    /// Co-organizing NGOs.
    pub organizers: Vec<Organizer>,
    /// Sponsor pledges.
    pub sponsors: Vec<SponsorPledge>,
    /// Capacity ceiling.
    pub capacity_ceiling: Option<u32>,
    /// Whether enrollment is open.
    pub enrollment_open: bool,
    /// Whether registrations need approval.
    pub requires_approval: bool,
    /// Lifecycle status.
    pub status: MegaEventStatus,
    /// Execution priority.
    pub priority: Priority,
    /// Public visibility flag.
    pub public: bool,
    /// Soft-delete flag.
    pub active: bool,
    /// Participant membership records.
    pub participants: Vec<MegaParticipant>,
    /// Image metadata with inline data URLs.
    pub images: Vec<ImageView>,
    /// Derived metrics.
    pub metrics: MegaEventMetrics,
    /// State-history log.
    pub history: Vec<StateHistoryEntry<MegaEventStatus>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-save timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&MegaEvent> for MegaEventView {
    fn from(mega_event: &MegaEvent) -> Self {
        Self {
            id: mega_event.id.map(|id| id.to_hex()).unwrap_or_default(),
            ledger_mega_event_id: mega_event.ledger_mega_event_id,
            title: mega_event.title.clone(),
            description: mega_event.description.clone(),
            starts_at: mega_event.starts_at,
            ends_at: mega_event.ends_at,
            enrollment_deadline: mega_event.enrollment_deadline,
            finished_at: mega_event.finished_at,
            cancelled_at: mega_event.cancelled_at,
            location: mega_event.location.clone(),
            category: mega_event.category,
            tags: mega_event.tags.clone(),
            principal_ngo_id: mega_event.principal_ngo_id,
            organizers: mega_event.organizers.clone(),
            sponsors: mega_event.sponsors.clone(),
            capacity_ceiling: mega_event.capacity_ceiling,
            enrollment_open: mega_event.enrollment_open,
            requires_approval: mega_event.requires_approval,
            status: mega_event.status,
            priority: mega_event.priority,
            public: mega_event.public,
            active: mega_event.active,
            participants: mega_event.participants.clone(),
            images: mega_event.images.iter().map(ImageView::from).collect(),
            metrics: mega_event.metrics.clone(),
            history: mega_event.history.clone(),
            created_at: mega_event.created_at,
            updated_at: mega_event.updated_at,
        }
    }
}
