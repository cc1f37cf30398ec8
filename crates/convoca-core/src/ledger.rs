//! Relational-ledger abstraction.
//!
//! The ledger is the system of record for identity-bearing facts: user and
//! company accounts, event and mega-event core rows, and membership join
//! rows. Aggregates in the document store reference ledger rows by integer
//! id. Create and delete flows run inside ledger transactions handed back to
//! the dual-write coordinator; mirror methods are best-effort copies whose
//! failures callers log and swallow.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DomainError;

/// An open ledger transaction.
///
/// No calls to the document store may issue further ledger statements through
/// this handle; it exists only so the dual-write coordinator can sequence the
/// document write between the ledger statements and the commit.
#[async_trait]
pub trait LedgerTxn: Send {
    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StoreUnavailable` if the commit fails; the
    /// caller must compensate the document side.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    /// Rolls the transaction back.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StoreUnavailable` if the rollback itself fails;
    /// the store will discard the transaction when the connection drops.
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}

/// Core columns of a new event row, plus the join rows known at create time.
#[derive(Debug, Clone)]
pub struct NewEventRow {
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: Option<String>,
    /// Start timestamp.
    pub starts_at: DateTime<Utc>,
    /// Optional end timestamp.
    pub ends_at: Option<DateTime<Utc>>,
    /// Flattened location address.
    pub location_address: String,
    /// Event kind tag.
    pub event_kind: String,
    /// Owning NGO.
    pub ngo_id: i64,
    /// Initial status tag.
    pub status: String,
    /// Sponsor join rows to insert in the same transaction.
    pub sponsor_company_ids: Vec<i64>,
    /// Promoter join rows to insert in the same transaction.
    pub promoter_company_ids: Vec<i64>,
}

/// Core columns of a new mega-event row, plus the join rows known at create
/// time. The principal NGO is always inserted as an organizer row with the
/// principal-coordinator role.
#[derive(Debug, Clone)]
pub struct NewMegaEventRow {
    /// Mega-event title.
    pub title: String,
    /// Mega-event description.
    pub description: Option<String>,
    /// Start timestamp.
    pub starts_at: DateTime<Utc>,
    /// End timestamp (mandatory for mega-events).
    pub ends_at: DateTime<Utc>,
    /// Flattened location address.
    pub location_address: String,
    /// Principal organizing NGO.
    pub principal_ngo_id: i64,
    /// Initial status tag.
    pub status: String,
    /// Sponsor pledge rows to insert in the same transaction.
    pub sponsors: Vec<SponsorRow>,
}

/// Mirror of the mutable event columns for the best-effort update path.
#[derive(Debug, Clone)]
pub struct EventMirror {
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: Option<String>,
    /// Start timestamp.
    pub starts_at: DateTime<Utc>,
    /// Optional end timestamp.
    pub ends_at: Option<DateTime<Utc>>,
    /// Flattened location address.
    pub location_address: String,
    /// Event kind tag.
    pub event_kind: String,
}

/// Mirror of the mutable mega-event columns for the best-effort update path.
#[derive(Debug, Clone)]
pub struct MegaEventMirror {
    /// Mega-event title.
    pub title: String,
    /// Mega-event description.
    pub description: Option<String>,
    /// Start timestamp.
    pub starts_at: DateTime<Utc>,
    /// End timestamp.
    pub ends_at: DateTime<Utc>,
    /// Flattened location address.
    pub location_address: String,
}

/// A participant membership row.
#[derive(Debug, Clone)]
pub struct ParticipantRow {
    /// External member id.
    pub member_id: i64,
    /// Participation kind tag.
    pub kind: String,
    /// Participation status tag.
    pub status: String,
}

/// A sponsor pledge row.
#[derive(Debug, Clone)]
pub struct SponsorRow {
    /// Sponsoring company id.
    pub company_id: i64,
    /// Sponsorship tier tag.
    pub tier: String,
    /// Pledged amount.
    pub amount: Option<f64>,
    /// Pledge status tag.
    pub status: String,
}

/// An organizer membership row.
#[derive(Debug, Clone)]
pub struct OrganizerRow {
    /// Organizing NGO id.
    pub ngo_id: i64,
    /// Organizer role tag.
    pub role: String,
    /// Whether the membership is active.
    pub active: bool,
}

/// Relational store of record for identity and join facts.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Returns whether `user_id` is an active NGO account.
    async fn is_active_ngo(&self, user_id: i64) -> Result<bool, DomainError>;

    /// Returns whether `company_id` is a registered company account.
    async fn company_exists(&self, company_id: i64) -> Result<bool, DomainError>;

    /// Returns whether `member_id` is a registered external member.
    async fn member_exists(&self, member_id: i64) -> Result<bool, DomainError>;

    /// Opens a transaction, inserts the event core row and its initial join
    /// rows, and returns the assigned id together with the still-open
    /// transaction for the dual-write coordinator to finish.
    async fn insert_event(
        &self,
        row: &NewEventRow,
    ) -> Result<(i64, Box<dyn LedgerTxn>), DomainError>;

    /// Mega-event counterpart of [`Ledger::insert_event`].
    async fn insert_mega_event(
        &self,
        row: &NewMegaEventRow,
    ) -> Result<(i64, Box<dyn LedgerTxn>), DomainError>;

    /// Opens a transaction and deletes the event's child rows in dependency
    /// order followed by the core row, returning the still-open transaction.
    async fn delete_event(&self, event_id: i64) -> Result<Box<dyn LedgerTxn>, DomainError>;

    /// Mega-event counterpart of [`Ledger::delete_event`].
    async fn delete_mega_event(
        &self,
        mega_event_id: i64,
    ) -> Result<Box<dyn LedgerTxn>, DomainError>;

    /// Best-effort mirror of the mutable event columns.
    async fn mirror_event(&self, event_id: i64, row: &EventMirror) -> Result<(), DomainError>;

    /// Best-effort mirror of the mutable mega-event columns.
    async fn mirror_mega_event(
        &self,
        mega_event_id: i64,
        row: &MegaEventMirror,
    ) -> Result<(), DomainError>;

    /// Best-effort mirror of the event status column.
    async fn mirror_event_status(&self, event_id: i64, status: &str) -> Result<(), DomainError>;

    /// Best-effort mirror of the mega-event status column.
    async fn mirror_mega_event_status(
        &self,
        mega_event_id: i64,
        status: &str,
    ) -> Result<(), DomainError>;

    /// Best-effort insert of an event participant join row.
    async fn insert_event_participant(
        &self,
        event_id: i64,
        row: &ParticipantRow,
    ) -> Result<(), DomainError>;

    /// Best-effort insert of a mega-event participant join row.
    async fn insert_mega_event_participant(
        &self,
        mega_event_id: i64,
        row: &ParticipantRow,
    ) -> Result<(), DomainError>;

    /// Best-effort update of an event participant's attendance flag.
    async fn set_event_attendance(
        &self,
        event_id: i64,
        member_id: i64,
        attended: bool,
    ) -> Result<(), DomainError>;

    /// Best-effort update of a mega-event participant's attendance flag.
    async fn set_mega_event_attendance(
        &self,
        mega_event_id: i64,
        member_id: i64,
        attended: bool,
    ) -> Result<(), DomainError>;

    /// Best-effort insert of an event sponsor join row.
    async fn insert_event_sponsor(
        &self,
        event_id: i64,
        company_id: i64,
    ) -> Result<(), DomainError>;

    /// Best-effort insert of a mega-event sponsor pledge row.
    async fn insert_mega_event_sponsor(
        &self,
        mega_event_id: i64,
        row: &SponsorRow,
    ) -> Result<(), DomainError>;

    /// Best-effort insert of a mega-event organizer row.
    async fn insert_mega_event_organizer(
        &self,
        mega_event_id: i64,
        row: &OrganizerRow,
    ) -> Result<(), DomainError>;
}
