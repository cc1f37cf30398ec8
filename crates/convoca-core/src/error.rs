//! Domain error taxonomy.

use thiserror::Error;

/// Top-level domain error type.
///
/// Invariant and lifecycle violations are detected and returned by the
/// component that owns the invariant — never silently corrected.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or missing required input; caller-correctable.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Referenced aggregate or membership absent (or soft-deleted).
    #[error("{0} not found")]
    NotFound(String),

    /// The actor lacks the role or relationship the operation requires.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The requested target state is not reachable from the current state.
    #[error("cannot transition from \"{from}\" to \"{to}\"")]
    InvalidTransition {
        /// Current state.
        from: String,
        /// Requested state.
        to: String,
        /// States reachable from the current one, to aid client retry logic.
        allowed: Vec<String>,
    },

    /// A transition guard rejected the change; state is unchanged.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// The member already holds a membership record on this aggregate.
    #[error("member {0} is already registered")]
    AlreadyRegistered(i64),

    /// The member holds no membership record on this aggregate.
    #[error("member {0} is not registered")]
    NotRegistered(i64),

    /// The capacity ceiling has been reached.
    #[error("capacity ceiling of {0} reached")]
    CapacityExceeded(u32),

    /// The enrollment-open flag is off.
    #[error("enrollment is closed")]
    EnrollmentClosed,

    /// The enrollment deadline is in the past.
    #[error("enrollment deadline has passed")]
    EnrollmentDeadlinePassed,

    /// The organization already holds an active organizer record.
    #[error("organization {0} is already an organizer")]
    AlreadyOrganizer(i64),

    /// The referenced account is not an active NGO.
    #[error("organization {0} is not an active NGO")]
    NotAnNgo(i64),

    /// The company already holds a sponsor record.
    #[error("company {0} is already a sponsor")]
    AlreadySponsor(i64),

    /// The aggregate still has registered participants.
    #[error("aggregate still has registered participants")]
    HasDependents,

    /// The image ceiling has been reached.
    #[error("image limit of {0} reached")]
    TooManyImages(u32),

    /// A cross-store write could not be made atomic; the ledger transaction
    /// was rolled back (or compensated) before surfacing. Retryable.
    #[error("dual write failed: {0}")]
    DualWriteFailure(String),

    /// Pool or connection failure; no partial write was performed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}
