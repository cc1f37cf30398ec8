//! Registration rules for the MegaEvent context.
//!
//! Every mutation here recomputes the derived metrics synchronously and
//! idempotently from the embedded collections. Unlike plain events, the
//! enrollment deadline is not enforced at registration time.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use convoca_core::documents::Aggregate as _;
use convoca_core::error::DomainError;
use convoca_core::image::{self, NormalizedImage};
use convoca_core::membership::ParticipationStatus;

use super::aggregate::{
    Availability, MEGA_EVENT_IMAGE_CEILING, MegaEvent, MegaParticipant, MegaParticipantKind,
    Organizer, OrganizerRole, PledgeStatus, SponsorPledge, SponsorshipTier,
};

impl MegaEvent {
    /// Registers an external member as a participant.
    ///
    /// The initial participation status is awaiting-approval when the
    /// mega-event requires approval, confirmed otherwise.
    ///
    /// # Errors
    ///
    /// - `AlreadyRegistered` if the member already holds a record.
    /// - `CapacityExceeded` if the capacity ceiling has been reached.
    /// - `EnrollmentClosed` if the enrollment-open flag is off.
    pub fn register_participant(
        &mut self,
        member_id: i64,
        kind: MegaParticipantKind,
        skills: Vec<String>,
        availability: Availability,
        comments: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ParticipationStatus, DomainError> {
        if self
            .participants
            .iter()
            .any(|participant| participant.member_id == member_id)
        {
            return Err(DomainError::AlreadyRegistered(member_id));
        }
        if let Some(ceiling) = self.capacity_ceiling {
            if self.participants.len() as u32 >= ceiling {
                return Err(DomainError::CapacityExceeded(ceiling));
            }
        }
        if !self.enrollment_open {
            return Err(DomainError::EnrollmentClosed);
        }

        let status = if self.requires_approval {
            ParticipationStatus::AwaitingApproval
        } else {
            ParticipationStatus::Confirmed
        };
        self.participants.push(MegaParticipant {
            member_id,
            kind,
            skills,
            availability,
            status,
            registered_at: now,
            attended: None,
            comments: comments.unwrap_or_default(),
        });
        self.recompute_metrics();
        Ok(status)
    }

    /// Records a participant's attendance and recomputes the metrics.
    ///
    /// Idempotent: recording the same flag twice leaves the aggregate in the
    /// same state as recording it once.
    ///
    /// # Errors
    ///
    /// Returns `NotRegistered` if the member holds no membership record.
    pub fn register_attendance(&mut self, member_id: i64, attended: bool) -> Result<(), DomainError> {
        let participant = self
            .participants
            .iter_mut()
            .find(|participant| participant.member_id == member_id)
            .ok_or(DomainError::NotRegistered(member_id))?;
        participant.attended = Some(attended);
        self.recompute_metrics();
        Ok(())
    }

    /// Adds a co-organizing NGO with the given role (collaborator when none
    /// is given) and recomputes the active-organizer count.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyOrganizer` if an active record for the NGO exists.
    pub fn add_organizer(
        &mut self,
        ngo_id: i64,
        role: Option<OrganizerRole>,
        responsibilities: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.active_organizer(ngo_id).is_some() {
            return Err(DomainError::AlreadyOrganizer(ngo_id));
        }
        self.organizers.push(Organizer {
            ngo_id,
            role: role.unwrap_or_default(),
            joined_at: now,
            responsibilities,
            active: true,
        });
        self.recompute_metrics();
        Ok(())
    }

    /// Adds a sponsor pledge in the pledged state and recomputes the sponsor
    /// count and pledged total.
    ///
    /// # Errors
    ///
    /// Returns `AlreadySponsor` if a pledge record for the company exists.
    pub fn add_sponsor(
        &mut self,
        company_id: i64,
        tier: SponsorshipTier,
        amount: Option<f64>,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self
            .sponsors
            .iter()
            .any(|pledge| pledge.company_id == company_id)
        {
            return Err(DomainError::AlreadySponsor(company_id));
        }
        self.sponsors.push(SponsorPledge {
            company_id,
            tier,
            amount,
            description: description.unwrap_or_default(),
            pledged_at: now,
            status: PledgeStatus::Pledged,
        });
        self.recompute_metrics();
        Ok(())
    }

    /// Appends normalized image uploads, enforcing the per-mega-event
    /// ceiling.
    ///
    /// # Errors
    ///
    /// Returns `TooManyImages` if the append would exceed the ceiling.
    pub fn add_images(
        &mut self,
        uploads: Vec<NormalizedImage>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        image::append_images(&mut self.images, uploads, MEGA_EVENT_IMAGE_CEILING, now)
    }

    /// Removes an embedded image by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no image with that id is attached.
    pub fn remove_image(&mut self, image_id: Uuid) -> Result<(), DomainError> {
        image::remove_image(&mut self.images, image_id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use convoca_core::location::Location;

    use super::*;
    use crate::domain::commands::CreateMegaEvent;
    use crate::domain::lifecycle::MegaEventStatus;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn enrolling_mega_event(capacity: Option<u32>) -> MegaEvent {
        let mut mega_event = MegaEvent::create(
            CreateMegaEvent {
                title: "City Reforestation Summit".to_owned(),
                description: None,
                starts_at: now() + Duration::days(10),
                ends_at: now() + Duration::days(12),
                enrollment_deadline: None,
                location: Location::from_address("Parque Urbano"),
                category: None,
                tags: Vec::new(),
                capacity_ceiling: capacity,
                requires_approval: false,
                priority: None,
                sponsors: Vec::new(),
            },
            7,
            now(),
        )
        .unwrap();
        mega_event
            .change_status(MegaEventStatus::CallForParticipation, 7, None, now())
            .unwrap();
        mega_event
    }

    fn register(mega_event: &mut MegaEvent, member_id: i64) -> Result<ParticipationStatus, DomainError> {
        mega_event.register_participant(
            member_id,
            MegaParticipantKind::Participant,
            Vec::new(),
            Availability::Full,
            None,
            now(),
        )
    }

    #[test]
    fn test_capacity_boundary_admits_exactly_the_ceiling() {
        let mut mega_event = enrolling_mega_event(Some(2));

        register(&mut mega_event, 1).unwrap();
        register(&mut mega_event, 2).unwrap();
        let result = register(&mut mega_event, 3);

        assert!(matches!(result, Err(DomainError::CapacityExceeded(2))));
        assert_eq!(mega_event.metrics.total_registered, 2);
    }

    #[test]
    fn test_registration_before_the_call_is_closed() {
        let mut mega_event = MegaEvent::create(
            CreateMegaEvent {
                title: "City Reforestation Summit".to_owned(),
                description: None,
                starts_at: now() + Duration::days(10),
                ends_at: now() + Duration::days(12),
                enrollment_deadline: None,
                location: Location::from_address("Parque Urbano"),
                category: None,
                tags: Vec::new(),
                capacity_ceiling: None,
                requires_approval: false,
                priority: None,
                sponsors: Vec::new(),
            },
            7,
            now(),
        )
        .unwrap();

        let result = register(&mut mega_event, 31);

        assert!(matches!(result, Err(DomainError::EnrollmentClosed)));
    }

    #[test]
    fn test_past_deadline_does_not_gate_mega_event_registration() {
        let mut mega_event = enrolling_mega_event(None);
        mega_event.enrollment_deadline = Some(now() - Duration::hours(1));

        let result = register(&mut mega_event, 31);

        assert!(result.is_ok());
    }

    #[test]
    fn test_duplicate_organizer_fails_when_active() {
        let mut mega_event = enrolling_mega_event(None);
        mega_event
            .add_organizer(8, Some(OrganizerRole::CoOrganizer), Vec::new(), now())
            .unwrap();

        let result = mega_event.add_organizer(8, None, Vec::new(), now());

        assert!(matches!(result, Err(DomainError::AlreadyOrganizer(8))));
        assert_eq!(mega_event.metrics.total_active_organizers, 2);
    }

    #[test]
    fn test_inactive_organizer_record_may_be_re_added() {
        let mut mega_event = enrolling_mega_event(None);
        mega_event
            .add_organizer(8, None, Vec::new(), now())
            .unwrap();
        mega_event.organizers.last_mut().unwrap().active = false;
        mega_event.recompute_metrics();

        let result = mega_event.add_organizer(8, None, Vec::new(), now());

        assert!(result.is_ok());
        assert_eq!(mega_event.metrics.total_active_organizers, 2);
    }

    #[test]
    fn test_organizer_defaults_to_collaborator_role() {
        let mut mega_event = enrolling_mega_event(None);

        mega_event
            .add_organizer(8, None, Vec::new(), now())
            .unwrap();

        assert_eq!(
            mega_event.organizers.last().unwrap().role,
            OrganizerRole::Collaborator
        );
    }

    #[test]
    fn test_new_pledge_starts_pledged_and_does_not_roll_up() {
        let mut mega_event = enrolling_mega_event(None);

        mega_event
            .add_sponsor(12, SponsorshipTier::Gold, Some(5_000.0), None, now())
            .unwrap();

        assert_eq!(mega_event.metrics.total_sponsors, 1);
        assert_eq!(mega_event.metrics.budget.total_pledged, 0.0);
        assert_eq!(
            mega_event.sponsors[0].status,
            PledgeStatus::Pledged
        );
    }

    #[test]
    fn test_duplicate_sponsor_fails_regardless_of_pledge_state() {
        let mut mega_event = enrolling_mega_event(None);
        mega_event
            .add_sponsor(12, SponsorshipTier::Gold, Some(5_000.0), None, now())
            .unwrap();
        mega_event.sponsors[0].status = PledgeStatus::Cancelled;

        let result = mega_event.add_sponsor(12, SponsorshipTier::Silver, None, None, now());

        assert!(matches!(result, Err(DomainError::AlreadySponsor(12))));
    }

    #[test]
    fn test_attendance_is_idempotent() {
        let mut mega_event = enrolling_mega_event(None);
        register(&mut mega_event, 31).unwrap();

        mega_event.register_attendance(31, true).unwrap();
        let once = mega_event.clone();
        mega_event.register_attendance(31, true).unwrap();

        assert_eq!(
            mega_event.metrics.total_attended,
            once.metrics.total_attended
        );
        assert_eq!(mega_event.metrics.attendance_pct, 100);
    }
}
