//! Append-only state-history log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable record of a status change on an aggregate.
///
/// Entries are append-only: they are never edited or removed, and they are
/// totally ordered by timestamp within one aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateHistoryEntry<S> {
    /// State before the change; `None` for the creation entry.
    pub previous: Option<S>,
    /// State after the change.
    pub next: S,
    /// When the change happened.
    pub at: DateTime<Utc>,
    /// Ledger id of the actor who requested the change.
    pub acting_user_id: i64,
    /// Human-readable reason (a default is filled in when none is given).
    pub reason: String,
}
