//! Shared membership vocabulary.

use serde::{Deserialize, Serialize};

/// Approval state of a participant membership record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    /// Waiting for organizer approval.
    AwaitingApproval,
    /// Registration confirmed.
    Confirmed,
    /// Registration rejected by an organizer.
    Rejected,
    /// Registration cancelled by the member.
    Cancelled,
}

impl ParticipationStatus {
    /// Returns the snake_case tag for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingApproval => "awaiting_approval",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}
