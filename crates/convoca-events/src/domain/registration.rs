//! Registration rules for the Event context.
//!
//! Every mutation here recomputes the derived metrics synchronously and
//! idempotently from the embedded collections.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use convoca_core::documents::Aggregate as _;
use convoca_core::error::DomainError;
use convoca_core::image::{self, NormalizedImage};
use convoca_core::membership::ParticipationStatus;

use super::aggregate::{EVENT_IMAGE_CEILING, Event, Participant, ParticipantKind};

impl Event {
    /// Registers an external member as a participant.
    ///
    /// The initial participation status is awaiting-approval when the event
    /// requires approval, confirmed otherwise.
    ///
    /// # Errors
    ///
    /// - `AlreadyRegistered` if the member already holds a record.
    /// - `CapacityExceeded` if the capacity ceiling has been reached.
    /// - `EnrollmentClosed` if the enrollment-open flag is off.
    /// - `EnrollmentDeadlinePassed` if the deadline is set and in the past.
    pub fn register_participant(
        &mut self,
        member_id: i64,
        kind: ParticipantKind,
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
        if let Some(deadline) = self.enrollment_deadline {
            if now > deadline {
                return Err(DomainError::EnrollmentDeadlinePassed);
            }
        }

        let status = if self.requires_approval {
            ParticipationStatus::AwaitingApproval
        } else {
            ParticipationStatus::Confirmed
        };
        self.participants.push(Participant {
            member_id,
            kind,
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

    /// Adds a sponsoring company to the embedded list.
    ///
    /// # Errors
    ///
    /// Returns `AlreadySponsor` if the company is already listed.
    pub fn add_sponsor(&mut self, company_id: i64) -> Result<(), DomainError> {
        if self.sponsor_company_ids.contains(&company_id) {
            return Err(DomainError::AlreadySponsor(company_id));
        }
        self.sponsor_company_ids.push(company_id);
        Ok(())
    }

    /// Appends normalized image uploads, enforcing the per-event ceiling.
    ///
    /// # Errors
    ///
    /// Returns `TooManyImages` if the append would exceed the ceiling.
    pub fn add_images(
        &mut self,
        uploads: Vec<NormalizedImage>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        image::append_images(&mut self.images, uploads, EVENT_IMAGE_CEILING, now)
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
