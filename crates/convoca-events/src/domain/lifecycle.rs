//! Event lifecycle state machine.
//!
//! Statuses are a tagged enum with an exhaustive transition-table lookup;
//! each target status has a guard (precondition) and a side-effect function.
//! Every successful transition appends a state-history entry.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use convoca_core::documents::Aggregate as _;
use convoca_core::error::DomainError;
use convoca_core::history::StateHistoryEntry;

use super::aggregate::Event;

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Being edited, not visible.
    Draft,
    /// Publicly visible, enrolling.
    Published,
    /// Currently running.
    InProgress,
    /// Over; metrics frozen. Terminal.
    Finished,
    /// Temporarily on hold.
    Suspended,
    /// Called off. Terminal.
    Cancelled,
}

impl EventStatus {
    /// Returns the statuses reachable from this one.
    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Published, Self::Cancelled],
            Self::Published => &[Self::InProgress, Self::Suspended, Self::Cancelled],
            Self::InProgress => &[Self::Finished, Self::Suspended],
            Self::Suspended => &[Self::Published, Self::Cancelled],
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
            Self::Draft => "draft",
            Self::Published => "published",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
            Self::Suspended => "suspended",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn invalid_transition(from: EventStatus, to: EventStatus) -> DomainError {
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

impl Event {
    /// Moves the event to `target`, enforcing the transition table and the
    /// target-specific guards, applying the target's side effects and
    /// appending a state-history entry.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` if the target is not
    /// reachable from the current status, or `DomainError::PreconditionFailed`
    /// if a guard rejects it. State is unchanged on error.
    pub fn change_status(
        &mut self,
        target: EventStatus,
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
    fn check_guard(&self, target: EventStatus, now: DateTime<Utc>) -> Result<(), DomainError> {
        match target {
            EventStatus::Published => {
                if self.title.trim().is_empty() || self.location.address.trim().is_empty() {
                    return Err(DomainError::PreconditionFailed(
                        "event needs a title, a start date and a location to be published".into(),
                    ));
                }
                if self.starts_at <= now {
                    return Err(DomainError::PreconditionFailed(
                        "cannot publish an event whose start date has passed".into(),
                    ));
                }
            }
            EventStatus::InProgress => {
                if self.starts_at > now {
                    return Err(DomainError::PreconditionFailed(
                        "event cannot be in progress before its start date".into(),
                    ));
                }
                if let Some(ends_at) = self.ends_at {
                    if ends_at < now {
                        return Err(DomainError::PreconditionFailed(
                            "event cannot be in progress after its end date".into(),
                        ));
                    }
                }
            }
            EventStatus::Finished => {
                if self.ends_at.unwrap_or(self.starts_at) > now {
                    return Err(DomainError::PreconditionFailed(
                        "cannot finish an event that has not ended yet".into(),
                    ));
                }
            }
            EventStatus::Cancelled => {
                if !self.participants.is_empty() {
                    tracing::warn!(
                        ledger_event_id = self.ledger_event_id,
                        participants = self.participants.len(),
                        "cancelling event with registered participants"
                    );
                }
            }
            EventStatus::Draft | EventStatus::Suspended => {}
        }
        Ok(())
    }

    /// Side effects, a pure function of the target status.
    fn apply_effects(&mut self, target: EventStatus, now: DateTime<Utc>) {
        match target {
            EventStatus::Published => {
                self.public = true;
                self.enrollment_open = true;
            }
            EventStatus::InProgress | EventStatus::Suspended => {
                self.enrollment_open = false;
            }
            EventStatus::Finished => {
                self.enrollment_open = false;
                self.recompute_metrics();
                self.metrics.capacity_utilization_pct = self.capacity_ceiling.map(|ceiling| {
                    (f64::from(self.metrics.total_registered) * 100.0 / f64::from(ceiling)).round()
                        as u32
                });
                self.metrics.final_computed_at = Some(now);
                self.finished_at = Some(now);
            }
            EventStatus::Cancelled => {
                self.public = false;
                self.enrollment_open = false;
                self.cancelled_at = Some(now);
            }
            EventStatus::Draft => {
                self.public = false;
            }
        }
    }

    /// Soft-deletes the event: flips the active flag off and forces the
    /// status to cancelled, recording the change in the history log.
    ///
    /// Callers must have verified that no participants are registered.
    pub fn soft_delete(&mut self, acting_user_id: i64, now: DateTime<Utc>) {
        let previous = self.status;
        self.active = false;
        self.public = false;
        self.enrollment_open = false;
        self.cancelled_at = Some(now);
        self.status = EventStatus::Cancelled;
        self.history.push(StateHistoryEntry {
            previous: Some(previous),
            next: EventStatus::Cancelled,
            at: now,
            acting_user_id,
            reason: "event deleted".to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use convoca_core::location::Location;

    use super::*;
    use crate::domain::aggregate::EventKind;
    use crate::domain::commands::CreateEvent;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn draft_event() -> Event {
        Event::create(
            CreateEvent {
                title: "Beach Cleanup".to_owned(),
                description: None,
                starts_at: now() + Duration::days(1),
                ends_at: Some(now() + Duration::days(1) + Duration::hours(4)),
                enrollment_deadline: None,
                location: Location::from_address("Pier 3"),
                kind: EventKind::Volunteering,
                category: None,
                tags: Vec::new(),
                capacity_ceiling: Some(100),
                enrollment_open: None,
                requires_approval: false,
                sponsor_company_ids: Vec::new(),
                promoter_company_ids: Vec::new(),
            },
            7,
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_transition_table_matches_the_lifecycle() {
        assert!(EventStatus::Draft.can_transition_to(EventStatus::Published));
        assert!(EventStatus::Draft.can_transition_to(EventStatus::Cancelled));
        assert!(!EventStatus::Draft.can_transition_to(EventStatus::InProgress));
        assert!(EventStatus::Suspended.can_transition_to(EventStatus::Published));
        assert!(!EventStatus::InProgress.can_transition_to(EventStatus::Cancelled));
        assert!(EventStatus::Finished.is_terminal());
        assert!(EventStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_publish_opens_visibility_and_enrollment() {
        let mut event = draft_event();

        event
            .change_status(EventStatus::Published, 7, None, now())
            .unwrap();

        assert_eq!(event.status, EventStatus::Published);
        assert!(event.public);
        assert!(event.enrollment_open);
        assert_eq!(event.history.len(), 2);
        assert_eq!(event.history[1].previous, Some(EventStatus::Draft));
    }

    #[test]
    fn test_publish_fails_for_past_start_date() {
        let mut event = draft_event();
        event.starts_at = now() - Duration::hours(1);

        let result = event.change_status(EventStatus::Published, 7, None, now());

        assert!(matches!(result, Err(DomainError::PreconditionFailed(_))));
        assert_eq!(event.status, EventStatus::Draft);
        assert_eq!(event.history.len(), 1);
    }

    #[test]
    fn test_in_progress_before_start_fails_precondition() {
        let mut event = draft_event();
        event
            .change_status(EventStatus::Published, 7, None, now())
            .unwrap();

        let result = event.change_status(EventStatus::InProgress, 7, None, now());

        assert!(matches!(result, Err(DomainError::PreconditionFailed(_))));
    }

    #[test]
    fn test_in_progress_after_start_closes_enrollment() {
        let mut event = draft_event();
        event
            .change_status(EventStatus::Published, 7, None, now())
            .unwrap();

        let during = event.starts_at + Duration::hours(1);
        event
            .change_status(EventStatus::InProgress, 7, None, during)
            .unwrap();

        assert_eq!(event.status, EventStatus::InProgress);
        assert!(!event.enrollment_open);
    }

    #[test]
    fn test_invalid_transition_reports_allowed_targets() {
        let mut event = draft_event();

        let result = event.change_status(EventStatus::Finished, 7, None, now());

        match result.unwrap_err() {
            DomainError::InvalidTransition { from, to, allowed } => {
                assert_eq!(from, "draft");
                assert_eq!(to, "finished");
                assert_eq!(allowed, vec!["published".to_owned(), "cancelled".to_owned()]);
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
    }

    #[test]
    fn test_finish_freezes_final_metrics_snapshot() {
        let mut event = draft_event();
        event
            .change_status(EventStatus::Published, 7, None, now())
            .unwrap();
        event
            .register_participant(31, Default::default(), None, now())
            .unwrap();
        let during = event.starts_at + Duration::hours(1);
        event
            .change_status(EventStatus::InProgress, 7, None, during)
            .unwrap();

        let after = event.ends_at.unwrap() + Duration::hours(1);
        event
            .change_status(EventStatus::Finished, 7, None, after)
            .unwrap();

        assert_eq!(event.finished_at, Some(after));
        assert_eq!(event.metrics.final_computed_at, Some(after));
        assert_eq!(event.metrics.capacity_utilization_pct, Some(1));
        assert!(event.status.is_terminal());
    }

    #[test]
    fn test_cancel_closes_visibility_and_stamps_timestamp() {
        let mut event = draft_event();
        event
            .change_status(EventStatus::Published, 7, None, now())
            .unwrap();

        event
            .change_status(EventStatus::Cancelled, 7, Some("venue flooded".to_owned()), now())
            .unwrap();

        assert!(!event.public);
        assert!(!event.enrollment_open);
        assert_eq!(event.cancelled_at, Some(now()));
        assert_eq!(event.history.last().unwrap().reason, "venue flooded");
    }

    #[test]
    fn test_history_grows_by_exactly_one_per_successful_change() {
        let mut event = draft_event();
        let before = event.history.len();

        event
            .change_status(EventStatus::Published, 7, None, now())
            .unwrap();
        assert_eq!(event.history.len(), before + 1);

        event
            .change_status(EventStatus::Suspended, 7, None, now())
            .unwrap();
        assert_eq!(event.history.len(), before + 2);
    }

    #[test]
    fn test_soft_delete_forces_cancelled_and_inactive() {
        let mut event = draft_event();

        event.soft_delete(7, now());

        assert!(!event.active);
        assert_eq!(event.status, EventStatus::Cancelled);
        assert_eq!(event.history.last().unwrap().reason, "event deleted");
    }
}
