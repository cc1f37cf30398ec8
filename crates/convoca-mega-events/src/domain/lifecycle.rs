//! MegaEvent lifecycle state machine.
//!
//! Seven states: the plain-event machine plus an explicit call-for-
//! participation and organizing phase, with postponement instead of
//! suspension.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use convoca_core::documents::Aggregate as _;
use convoca_core::error::DomainError;
use convoca_core::history::StateHistoryEntry;

use super::aggregate::MegaEvent;

/// Lifecycle status of a mega-event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MegaEventStatus {
    /// Being planned by the organizing NGOs.
    Planning,
    /// Open call for participants; publicly visible, enrolling.
    CallForParticipation,
    /// Participants recruited; logistics underway.
    Organizing,
    /// Currently running.
    InProgress,
    /// Over; metrics frozen. Terminal.
    Finished,
    /// Pushed back; may reopen the call later.
    Postponed,
    /// Called off. Terminal.
    Cancelled,
}

impl MegaEventStatus {
    /// Returns the statuses reachable from this one.
    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Planning => &[Self::CallForParticipation, Self::Cancelled],
            Self::CallForParticipation => {
                &[Self::Organizing, Self::Postponed, Self::Cancelled]
            }
            Self::Organizing => &[Self::InProgress, Self::Postponed, Self::Cancelled],
            Self::InProgress => &[Self::Finished, Self::Postponed],
            Self::Postponed => &[Self::CallForParticipation, Self::Cancelled],
            Self::Finished | Self::Cancelled => &[],
        }
    }

    /// Returns whether `target` is reachable from this status.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Returns whether no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Returns the snake_case tag for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::CallForParticipation => "call_for_participation",
            Self::Organizing => "organizing",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
            Self::Postponed => "postponed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for MegaEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn invalid_transition(from: MegaEventStatus, to: MegaEventStatus) -> DomainError {
    DomainError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
        allowed: from
            .allowed_transitions()
            .iter()
            .map(ToString::to_string)
            .collect(),
    }
}

impl MegaEvent {
    /// Moves the mega-event to `target`, enforcing the transition table and
    /// the target-specific guards, applying the target's side effects and
    /// appending a state-history entry.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` if the target is not
    /// reachable from the current status, or `DomainError::PreconditionFailed`
    /// if a guard rejects it. State is unchanged on error.
    pub fn change_status(
        &mut self,
        target: MegaEventStatus,
        acting_user_id: i64,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let current = self.status;
        if !current.can_transition_to(target) {
            return Err(invalid_transition(current, target));
        }
        self.check_guard(target, now)?;

        self.apply_effects(target, now);
        self.status = target;
        self.history.push(StateHistoryEntry {
            previous: Some(current),
            next: target,
            at: now,
            acting_user_id,
            reason: reason.unwrap_or_else(|| format!("changed from {current} to {target}")),
        });
        Ok(())
    }

    /// Target-specific preconditions.
    fn check_guard(&self, target: MegaEventStatus, now: DateTime<Utc>) -> Result<(), DomainError> {
        match target {
            MegaEventStatus::CallForParticipation => {
                if self.title.trim().is_empty() || self.location.address.trim().is_empty() {
                    return Err(DomainError::PreconditionFailed(
                        "mega-event needs a title, a start date and a location to open the call"
                            .into(),
                    ));
                }
                if self.starts_at <= now {
                    return Err(DomainError::PreconditionFailed(
                        "cannot open the call for a mega-event whose start date has passed".into(),
                    ));
                }
                if !self.organizers.iter().any(|organizer| organizer.active) {
                    return Err(DomainError::PreconditionFailed(
                        "at least one active organizing NGO is required to open the call".into(),
                    ));
                }
            }
            MegaEventStatus::Organizing => {
                if self.participants.is_empty() {
                    return Err(DomainError::PreconditionFailed(
                        "at least one registered participant is required to start organizing"
                            .into(),
                    ));
                }
            }
            MegaEventStatus::InProgress => {
                if self.starts_at > now {
                    return Err(DomainError::PreconditionFailed(
                        "mega-event cannot be in progress before its start date".into(),
                    ));
                }
                if self.ends_at < now {
                    return Err(DomainError::PreconditionFailed(
                        "mega-event cannot be in progress after its end date".into(),
                    ));
                }
            }
            MegaEventStatus::Finished => {
                if self.ends_at > now {
                    return Err(DomainError::PreconditionFailed(
                        "cannot finish a mega-event that has not ended yet".into(),
                    ));
                }
            }
            MegaEventStatus::Cancelled => {
                if !self.participants.is_empty() {
                    tracing::warn!(
                        ledger_mega_event_id = self.ledger_mega_event_id,
                        participants = self.participants.len(),
                        "cancelling mega-event with registered participants"
                    );
                }
            }
            MegaEventStatus::Planning | MegaEventStatus::Postponed => {}
        }
        Ok(())
    }

    /// Side effects, a pure function of the target status.
    fn apply_effects(&mut self, target: MegaEventStatus, now: DateTime<Utc>) {
        match target {
            MegaEventStatus::CallForParticipation => {
                self.public = true;
                self.enrollment_open = true;
            }
            MegaEventStatus::Organizing
            | MegaEventStatus::InProgress
            | MegaEventStatus::Postponed => {
                self.enrollment_open = false;
            }
            MegaEventStatus::Finished => {
                self.enrollment_open = false;
                self.recompute_metrics();
                self.metrics.final_computed_at = Some(now);
                self.finished_at = Some(now);
            }
            MegaEventStatus::Cancelled => {
                self.public = false;
                self.enrollment_open = false;
                self.cancelled_at = Some(now);
            }
            MegaEventStatus::Planning => {
                self.public = false;
                self.enrollment_open = false;
            }
        }
    }

    /// Soft-deletes the mega-event: flips the active flag off and forces the
    /// status to cancelled, recording the change in the history log.
    ///
    /// Callers must have verified that no participants are registered.
    pub fn soft_delete(&mut self, acting_user_id: i64, now: DateTime<Utc>) {
        let previous = self.status;
        self.active = false;
        self.public = false;
        self.enrollment_open = false;
        self.cancelled_at = Some(now);
        self.status = MegaEventStatus::Cancelled;
        self.history.push(StateHistoryEntry {
            previous: Some(previous),
            next: MegaEventStatus::Cancelled,
            at: now,
            acting_user_id,
            reason: "mega-event deleted".to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use convoca_core::location::Location;

    use super::*;
    use crate::domain::commands::CreateMegaEvent;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn planning_mega_event() -> MegaEvent {
        MegaEvent::create(
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
                sponsors: Vec::new(),
            },
            7,
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_transition_table_matches_the_lifecycle() {
        use MegaEventStatus::{
            CallForParticipation, Cancelled, Finished, InProgress, Organizing, Planning, Postponed,
        };

        assert!(Planning.can_transition_to(CallForParticipation));
        assert!(!Planning.can_transition_to(Organizing));
        assert!(CallForParticipation.can_transition_to(Postponed));
        assert!(Organizing.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Postponed));
        assert!(!InProgress.can_transition_to(Cancelled));
        assert!(Postponed.can_transition_to(CallForParticipation));
        assert!(Finished.is_terminal());
        assert!(Cancelled.is_terminal());
    }

    #[test]
    fn test_opening_the_call_requires_an_active_organizer() {
        let mut mega_event = planning_mega_event();
        mega_event.organizers[0].active = false;

        let result =
            mega_event.change_status(MegaEventStatus::CallForParticipation, 7, None, now());

        assert!(matches!(result, Err(DomainError::PreconditionFailed(_))));
        assert_eq!(mega_event.status, MegaEventStatus::Planning);
    }

    #[test]
    fn test_opening_the_call_opens_visibility_and_enrollment() {
        let mut mega_event = planning_mega_event();

        mega_event
            .change_status(MegaEventStatus::CallForParticipation, 7, None, now())
            .unwrap();

        assert!(mega_event.public);
        assert!(mega_event.enrollment_open);
        assert_eq!(mega_event.history.len(), 2);
    }

    #[test]
    fn test_organizing_requires_a_registered_participant() {
        let mut mega_event = planning_mega_event();
        mega_event
            .change_status(MegaEventStatus::CallForParticipation, 7, None, now())
            .unwrap();

        let result = mega_event.change_status(MegaEventStatus::Organizing, 7, None, now());

        assert!(matches!(result, Err(DomainError::PreconditionFailed(_))));
    }

    #[test]
    fn test_full_happy_path_to_finished() {
        let mut mega_event = planning_mega_event();
        mega_event
            .change_status(MegaEventStatus::CallForParticipation, 7, None, now())
            .unwrap();
        mega_event
            .register_participant(31, Default::default(), Vec::new(), Default::default(), None, now())
            .unwrap();
        mega_event
            .change_status(MegaEventStatus::Organizing, 7, None, now())
            .unwrap();
        assert!(!mega_event.enrollment_open);

        let during = mega_event.starts_at + Duration::hours(1);
        mega_event
            .change_status(MegaEventStatus::InProgress, 7, None, during)
            .unwrap();

        let after = mega_event.ends_at + Duration::hours(1);
        mega_event
            .change_status(MegaEventStatus::Finished, 7, None, after)
            .unwrap();

        assert_eq!(mega_event.finished_at, Some(after));
        assert_eq!(mega_event.metrics.final_computed_at, Some(after));
        assert_eq!(mega_event.history.len(), 5);
    }

    #[test]
    fn test_postpone_closes_enrollment_and_allows_reopening() {
        let mut mega_event = planning_mega_event();
        mega_event
            .change_status(MegaEventStatus::CallForParticipation, 7, None, now())
            .unwrap();

        mega_event
            .change_status(MegaEventStatus::Postponed, 7, None, now())
            .unwrap();
        assert!(!mega_event.enrollment_open);

        mega_event
            .change_status(MegaEventStatus::CallForParticipation, 7, None, now())
            .unwrap();
        assert!(mega_event.enrollment_open);
    }

    #[test]
    fn test_invalid_transition_reports_allowed_targets() {
        let mut mega_event = planning_mega_event();

        let result = mega_event.change_status(MegaEventStatus::InProgress, 7, None, now());

        match result.unwrap_err() {
            DomainError::InvalidTransition { from, allowed, .. } => {
                assert_eq!(from, "planning");
                assert_eq!(
                    allowed,
                    vec!["call_for_participation".to_owned(), "cancelled".to_owned()]
                );
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
    }
}
