//! Platform-wide categorization tags.

use serde::{Deserialize, Serialize};

/// Thematic category shared by events and mega-events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Social causes.
    #[default]
    Social,
    /// Environmental causes.
    Environmental,
    /// Education.
    Educational,
    /// Health.
    Health,
    /// Culture and arts.
    Cultural,
    /// Sports.
    Sports,
    /// Technology.
    Technology,
    /// Anything else.
    Other,
}
