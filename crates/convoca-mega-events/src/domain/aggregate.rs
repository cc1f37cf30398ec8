//! The MegaEvent aggregate root.

use bson::oid::ObjectId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use convoca_core::category::Category;
use convoca_core::documents::Aggregate;
use convoca_core::error::DomainError;
use convoca_core::history::StateHistoryEntry;
use convoca_core::image::PromoImage;
use convoca_core::location::Location;
use convoca_core::membership::ParticipationStatus;

use super::commands::{CreateMegaEvent, UpdateMegaEvent};
use super::lifecycle::MegaEventStatus;

/// Hard ceiling on embedded promotional images per mega-event.
pub const MEGA_EVENT_IMAGE_CEILING: u32 = 20;

/// Largest capacity ceiling a mega-event may declare.
pub const MEGA_EVENT_CAPACITY_MAX: u32 = 10_000;

/// Longest allowed mega-event duration, in days.
pub const MEGA_EVENT_MAX_DURATION_DAYS: i64 = 30;

/// How a member participates in a mega-event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MegaParticipantKind {
    /// Regular attendee.
    #[default]
    Participant,
    /// Volunteer helping to run the event.
    Volunteer,
    /// Invited speaker.
    Speaker,
    /// Session facilitator.
    Facilitator,
    /// Special guest.
    SpecialGuest,
}

impl MegaParticipantKind {
    /// Returns the snake_case tag for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Participant => "participant",
            Self::Volunteer => "volunteer",
            Self::Speaker => "speaker",
            Self::Facilitator => "facilitator",
            Self::SpecialGuest => "special_guest",
        }
    }
}

/// A member's declared availability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Available for the whole event.
    #[default]
    Full,
    /// Partially available.
    Partial,
    /// Available only at specific hours.
    SpecificHours,
}

/// Role an organization holds within the umbrella.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizerRole {
    /// Leads the whole mega-event; exactly one, assigned at creation.
    PrincipalCoordinator,
    /// Shares management duties with the principal.
    CoOrganizer,
    /// Contributes without management duties.
    #[default]
    Collaborator,
    /// Provides support services.
    Support,
}

impl OrganizerRole {
    /// Returns the snake_case tag for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PrincipalCoordinator => "principal_coordinator",
            Self::CoOrganizer => "co_organizer",
            Self::Collaborator => "collaborator",
            Self::Support => "support",
        }
    }

    /// Whether this role may manage the mega-event (change status, add
    /// organizers, edit).
    #[must_use]
    pub const fn can_manage(self) -> bool {
        matches!(self, Self::PrincipalCoordinator | Self::CoOrganizer)
    }
}

/// Sponsorship tier of a pledge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SponsorshipTier {
    /// Headline sponsor.
    Principal,
    /// Gold tier.
    Gold,
    /// Silver tier.
    Silver,
    /// Bronze tier.
    Bronze,
    /// In-kind collaborator.
    #[default]
    Collaborator,
    /// Promotional backer.
    Promoter,
}

impl SponsorshipTier {
    /// Returns the snake_case tag for this tier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Principal => "principal",
            Self::Gold => "gold",
            Self::Silver => "silver",
            Self::Bronze => "bronze",
            Self::Collaborator => "collaborator",
            Self::Promoter => "promoter",
        }
    }
}

/// State of a sponsor's pledge, independent of the event lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PledgeStatus {
    /// Committed but not yet confirmed.
    #[default]
    Pledged,
    /// Confirmed; counts toward the pledged total.
    Confirmed,
    /// Paid out.
    Paid,
    /// Withdrawn.
    Cancelled,
}

impl PledgeStatus {
    /// Returns the snake_case tag for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pledged => "pledged",
            Self::Confirmed => "confirmed",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Execution priority of the mega-event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Default priority.
    #[default]
    Medium,
    /// High priority.
    High,
    /// Critical priority.
    Critical,
}

/// A participant membership record, owned exclusively by its mega-event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MegaParticipant {
    /// External member id (ledger reference).
    pub member_id: i64,
    /// Participation kind.
    pub kind: MegaParticipantKind,
    /// Skills the member offers.
    pub skills: Vec<String>,
    /// Declared availability.
    pub availability: Availability,
    /// Approval state of the registration.
    pub status: ParticipationStatus,
    /// When the member registered.
    pub registered_at: DateTime<Utc>,
    /// Attendance flag; unset until attendance is recorded.
    pub attended: Option<bool>,
    /// Free-text comments.
    pub comments: String,
}

/// A co-organizing NGO membership record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organizer {
    /// Organizing NGO id (ledger reference).
    pub ngo_id: i64,
    /// Role within the umbrella.
    pub role: OrganizerRole,
    /// When the NGO joined.
    pub joined_at: DateTime<Utc>,
    /// Responsibilities the NGO took on.
    pub responsibilities: Vec<String>,
    /// Whether the membership is active.
    pub active: bool,
}

/// A sponsor pledge record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorPledge {
    /// Sponsoring company id (ledger reference).
    pub company_id: i64,
    /// Sponsorship tier.
    pub tier: SponsorshipTier,
    /// Pledged amount.
    pub amount: Option<f64>,
    /// Free-text description of the contribution.
    pub description: String,
    /// When the pledge was made.
    pub pledged_at: DateTime<Utc>,
    /// Pledge state.
    pub status: PledgeStatus,
}

/// Estimated-impact figures, supplied by organizers rather than derived.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImpactEstimate {
    /// People reached.
    pub people_reached: Option<u32>,
    /// Media mentions.
    pub media_coverage: Option<u32>,
    /// Social media reach.
    pub social_media_reach: Option<u32>,
}

/// Budget rollup; the pledged total is derived from confirmed pledges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetRollup {
    /// Sum of confirmed pledge amounts.
    pub total_pledged: f64,
    /// Amount spent.
    pub total_spent: f64,
    /// `total_pledged - total_spent`.
    pub balance: f64,
}

/// Metrics derived from the embedded collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MegaEventMetrics {
    /// Number of membership records.
    pub total_registered: u32,
    /// Number of members with `attended == Some(true)`.
    pub total_attended: u32,
    /// `round(100 * total_attended / total_registered)`, 0 when empty.
    pub attendance_pct: u32,
    /// Number of active organizer records.
    pub total_active_organizers: u32,
    /// Number of sponsor pledge records.
    pub total_sponsors: u32,
    /// Estimated-impact figures.
    pub impact: ImpactEstimate,
    /// Budget rollup.
    pub budget: BudgetRollup,
    /// When the final snapshot was computed.
    pub final_computed_at: Option<DateTime<Utc>>,
}

/// The aggregate root for a multi-organization mega-event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MegaEvent {
    /// Document id, assigned by the document store.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Ledger row id (system of record), assigned inside the create
    /// transaction. 1:1, unique, immutable after creation.
    pub ledger_mega_event_id: i64,
    /// Mega-event title.
    pub title: String,
    /// Mega-event description.
    pub description: String,
    /// Start timestamp.
    pub starts_at: DateTime<Utc>,
    /// End timestamp; mandatory, at most 30 days after the start.
    pub ends_at: DateTime<Utc>,
    /// Enrollment deadline. Carried but not enforced at registration time.
    pub enrollment_deadline: Option<DateTime<Utc>>,
    /// Stamped when the mega-event is finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Stamped when the mega-event is cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Where the mega-event takes place.
    pub location: Location,
    /// Thematic category.
    pub category: Category,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Principal organizing NGO (ledger reference).
    pub principal_ngo_id: i64,
    /// Ledger id of the user who created the mega-event.
    pub created_by: i64,
    /// Co-organizing NGOs, including the principal.
    pub organizers: Vec<Organizer>,
    /// Sponsor pledges.
    pub sponsors: Vec<SponsorPledge>,
    /// Capacity ceiling; unlimited when unset.
    pub capacity_ceiling: Option<u32>,
    /// Whether new registrations are accepted. Closed until the call for
    /// participation opens.
    pub enrollment_open: bool,
    /// Whether registrations start in the awaiting-approval state.
    pub requires_approval: bool,
    /// Lifecycle status.
    pub status: MegaEventStatus,
    /// Execution priority.
    pub priority: Priority,
    /// Public visibility flag.
    pub public: bool,
    /// Soft-delete flag.
    pub active: bool,
    /// Embedded participant list, unique by member id.
    pub participants: Vec<MegaParticipant>,
    /// Embedded promotional images.
    pub images: Vec<PromoImage>,
    /// Derived metrics.
    pub metrics: MegaEventMetrics,
    /// Append-only state-history log.
    pub history: Vec<StateHistoryEntry<MegaEventStatus>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-save timestamp.
    pub updated_at: DateTime<Utc>,
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    let trimmed = title.trim();
    if trimmed.len() < 5 {
        return Err(DomainError::Validation(
            "title must be at least 5 characters".into(),
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
    if ceiling == 0 || ceiling > MEGA_EVENT_CAPACITY_MAX {
        return Err(DomainError::Validation(format!(
            "capacity ceiling must be between 1 and {MEGA_EVENT_CAPACITY_MAX}"
        )));
    }
    Ok(())
}

fn validate_dates(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<(), DomainError> {
    if ends_at <= starts_at {
        return Err(DomainError::Validation(
            "end date must be after the start date".into(),
        ));
    }
    if ends_at - starts_at > Duration::days(MEGA_EVENT_MAX_DURATION_DAYS) {
        return Err(DomainError::Validation(format!(
            "mega-event duration must not exceed {MEGA_EVENT_MAX_DURATION_DAYS} days"
        )));
    }
    Ok(())
}

impl MegaEvent {
    /// Creates a new mega-event in the planning state. The principal NGO is
    /// enrolled as an organizer with the principal-coordinator role.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the title, description, dates,
    /// location or capacity ceiling violate the aggregate invariants.
    pub fn create(
        command: CreateMegaEvent,
        principal_ngo_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        validate_title(&command.title)?;
        let description = command.description.unwrap_or_default();
        validate_description(&description)?;
        command.location.validate()?;
        validate_dates(command.starts_at, command.ends_at)?;
        if let Some(ceiling) = command.capacity_ceiling {
            validate_capacity(ceiling)?;
        }

        let status = MegaEventStatus::Planning;
        let sponsors = command
            .sponsors
            .into_iter()
            .map(|pledge| SponsorPledge {
                company_id: pledge.company_id,
                tier: pledge.tier,
                amount: pledge.amount,
                description: pledge.description.unwrap_or_default(),
                pledged_at: now,
                status: PledgeStatus::Pledged,
            })
            .collect();

        let mut mega_event = Self {
            id: None,
            ledger_mega_event_id: 0,
            title: command.title.trim().to_owned(),
            description,
            starts_at: command.starts_at,
            ends_at: command.ends_at,
            enrollment_deadline: command.enrollment_deadline,
            finished_at: None,
            cancelled_at: None,
            location: command.location,
            category: command.category.unwrap_or_default(),
            tags: command.tags,
            principal_ngo_id,
            created_by: principal_ngo_id,
            organizers: vec![Organizer {
                ngo_id: principal_ngo_id,
                role: OrganizerRole::PrincipalCoordinator,
                joined_at: now,
                responsibilities: Vec::new(),
                active: true,
            }],
            sponsors,
            capacity_ceiling: command.capacity_ceiling,
            enrollment_open: false,
            requires_approval: command.requires_approval,
            status,
            priority: command.priority.unwrap_or_default(),
            public: false,
            active: true,
            participants: Vec::new(),
            images: Vec::new(),
            metrics: MegaEventMetrics::default(),
            history: vec![StateHistoryEntry {
                previous: None,
                next: status,
                at: now,
                acting_user_id: principal_ngo_id,
                reason: "mega-event created".to_owned(),
            }],
            created_at: now,
            updated_at: now,
        };
        mega_event.recompute_metrics();
        Ok(mega_event)
    }

    /// Applies an update command to the mutable fields.
    ///
    /// The lifecycle status is not among them; only `change_status` moves it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the command carries no changes or
    /// the resulting field values violate the aggregate invariants.
    pub fn apply_update(&mut self, command: UpdateMegaEvent) -> Result<(), DomainError> {
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
            self.ends_at = ends_at;
        }
        if let Some(deadline) = command.enrollment_deadline {
            self.enrollment_deadline = Some(deadline);
        }
        if let Some(location) = command.location {
            location.validate()?;
            self.location = location;
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
        if let Some(requires_approval) = command.requires_approval {
            self.requires_approval = requires_approval;
        }
        if let Some(priority) = command.priority {
            self.priority = priority;
        }

        validate_dates(self.starts_at, self.ends_at)
    }

    /// Finds the active organizer record for an NGO, if any.
    #[must_use]
    pub fn active_organizer(&self, ngo_id: i64) -> Option<&Organizer> {
        self.organizers
            .iter()
            .find(|organizer| organizer.ngo_id == ngo_id && organizer.active)
    }
}

impl Aggregate for MegaEvent {
    const COLLECTION: &'static str = "mega_events";
    const LEDGER_ID_FIELD: &'static str = "ledger_mega_event_id";

    fn document_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_document_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn ledger_id(&self) -> i64 {
        self.ledger_mega_event_id
    }

    fn set_ledger_id(&mut self, id: i64) {
        self.ledger_mega_event_id = id;
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
        self.metrics.total_active_organizers = self
            .organizers
            .iter()
            .filter(|organizer| organizer.active)
            .count() as u32;
        self.metrics.total_sponsors = self.sponsors.len() as u32;
        self.metrics.budget.total_pledged = self
            .sponsors
            .iter()
            .filter(|pledge| pledge.status == PledgeStatus::Confirmed)
            .filter_map(|pledge| pledge.amount)
            .sum();
        self.metrics.budget.balance =
            self.metrics.budget.total_pledged - self.metrics.budget.total_spent;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use convoca_core::location::Location;

    use super::*;
    use crate::domain::commands::{CreateMegaEvent, SponsorInput};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn command() -> CreateMegaEvent {
        CreateMegaEvent {
            title: "City Reforestation Summit".to_owned(),
            description: None,
            starts_at: now() + Duration::days(10),
            ends_at: now() + Duration::days(12),
            enrollment_deadline: None,
            location: Location::from_address("Parque Urbano"),
            category: None,
            tags: Vec::new(),
            capacity_ceiling: Some(500),
            requires_approval: false,
            priority: None,
            sponsors: vec![SponsorInput {
                company_id: 12,
                tier: SponsorshipTier::Gold,
                amount: Some(5_000.0),
                description: None,
            }],
        }
    }

    #[test]
    fn test_create_enrolls_principal_as_coordinator() {
        let mega_event = MegaEvent::create(command(), 7, now()).unwrap();

        assert_eq!(mega_event.status, MegaEventStatus::Planning);
        assert!(!mega_event.enrollment_open);
        assert!(!mega_event.public);
        assert_eq!(mega_event.organizers.len(), 1);
        assert_eq!(
            mega_event.organizers[0].role,
            OrganizerRole::PrincipalCoordinator
        );
        assert_eq!(mega_event.metrics.total_active_organizers, 1);
        assert_eq!(mega_event.metrics.total_sponsors, 1);
        assert_eq!(mega_event.history.len(), 1);
    }

    #[test]
    fn test_create_rejects_duration_over_thirty_days() {
        let mut cmd = command();
        cmd.ends_at = cmd.starts_at + Duration::days(31);

        let result = MegaEvent::create(cmd, 7, now());

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_short_title() {
        let mut cmd = command();
        cmd.title = "Expo".to_owned();

        let result = MegaEvent::create(cmd, 7, now());

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_initial_pledges_do_not_count_toward_pledged_total() {
        let mega_event = MegaEvent::create(command(), 7, now()).unwrap();

        // Pledges start unconfirmed; only confirmed ones roll up.
        assert_eq!(mega_event.metrics.budget.total_pledged, 0.0);
    }

    #[test]
    fn test_confirmed_pledges_roll_up_into_budget() {
        let mut mega_event = MegaEvent::create(command(), 7, now()).unwrap();
        mega_event.sponsors[0].status = PledgeStatus::Confirmed;

        mega_event.recompute_metrics();

        assert_eq!(mega_event.metrics.budget.total_pledged, 5_000.0);
        assert_eq!(mega_event.metrics.budget.balance, 5_000.0);
    }

    #[test]
    fn test_apply_update_revalidates_duration() {
        let mut mega_event = MegaEvent::create(command(), 7, now()).unwrap();

        let result = mega_event.apply_update(UpdateMegaEvent {
            ends_at: Some(mega_event.starts_at + Duration::days(45)),
            ..UpdateMegaEvent::default()
        });

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
