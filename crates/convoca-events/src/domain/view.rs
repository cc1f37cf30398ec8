//! Safe external projection of the Event aggregate.

use chrono::{DateTime, Utc};
use serde::Serialize;

use convoca_core::category::Category;
use convoca_core::history::StateHistoryEntry;
use convoca_core::image::ImageView;
use convoca_core::location::Location;

use super::aggregate::{Event, EventKind, EventMetrics, Participant};
use super::lifecycle::EventStatus;

/// What the outside world sees of an event: the stored aggregate minus raw
/// image bytes, with the document id rendered as a hex string.
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    /// Document id (hex).
    pub id: String,
    /// Ledger row id.
    pub ledger_event_id: i64,
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: String,
    /// Start timestamp.
    pub starts_at: DateTime<Utc>,
    /// Optional end timestamp.
    pub ends_at: Option<DateTime<Utc>>,
    /// Enrollment deadline.
    pub enrollment_deadline: Option<DateTime<Utc>>,
    /// When the event finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// When the event was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Where the event takes place.
    pub location: Location,
    /// Event kind.
    pub kind: EventKind,
    /// Thematic category.
    pub category: Category,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Owning NGO.
    pub ngo_id: i64,
    /// Capacity ceiling.
    pub capacity_ceiling: Option<u32>,
    /// Whether enrollment is open.
    pub enrollment_open: bool,
    /// Whether registrations need approval.
    pub requires_approval: bool,
    /// Lifecycle status.
    pub status: EventStatus,
    /// Public visibility flag.
    pub public: bool,
    /// Soft-delete flag.
    pub active: bool,
    /// Sponsoring companies.
    pub sponsor_company_ids: Vec<i64>,
    /// Promoting companies.
    pub promoter_company_ids: Vec<i64>,
    /// Participant membership records.
    pub participants: Vec<Participant>,
    /// Image metadata with inline data URLs.
    pub images: Vec<ImageView>,
    /// Derived metrics.
    pub metrics: EventMetrics,
    /// State-history log.
    pub history: Vec<StateHistoryEntry<EventStatus>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-save timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&Event> for EventView {
    fn from(event: &Event) -> Self {
        Self {
            id: event
                .id
                .map(|id| id.to_hex())
                .unwrap_or_default(),
            ledger_event_id: event.ledger_event_id,
            title: event.title.clone(),
            description: event.description.clone(),
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            enrollment_deadline: event.enrollment_deadline,
            finished_at: event.finished_at,
            cancelled_at: event.cancelled_at,
            location: event.location.clone(),
            kind: event.kind,
            category: event.category,
            tags: event.tags.clone(),
            ngo_id: event.ngo_id,
            capacity_ceiling: event.capacity_ceiling,
            enrollment_open: event.enrollment_open,
            requires_approval: event.requires_approval,
            status: event.status,
            public: event.public,
            active: event.active,
            sponsor_company_ids: event.sponsor_company_ids.clone(),
            promoter_company_ids: event.promoter_company_ids.clone(),
            participants: event.participants.clone(),
            images: event.images.iter().map(ImageView::from).collect(),
            metrics: event.metrics.clone(),
            history: event.history.clone(),
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}
