//! Event location value types.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// How an event is attended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationMode {
    /// Attendees are physically present.
    #[default]
    InPerson,
    /// Fully remote.
    Virtual,
    /// Mixed physical and remote attendance.
    Hybrid,
}

/// Geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

fn default_city() -> String {
    "Santa Cruz".to_owned()
}

/// Where an event takes place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Street address or venue description.
    pub address: String,
    /// City the event is held in.
    #[serde(default = "default_city")]
    pub city: String,
    /// Attendance mode.
    #[serde(default)]
    pub mode: LocationMode,
    /// Meeting link for virtual or hybrid events.
    #[serde(default)]
    pub virtual_link: Option<String>,
    /// Optional venue coordinates.
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
}

impl Location {
    /// Creates an in-person location from a bare address, defaulting the city.
    #[must_use]
    pub fn from_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            city: "Santa Cruz".to_owned(),
            mode: LocationMode::InPerson,
            virtual_link: None,
            coordinates: None,
        }
    }

    /// Validates that the location is usable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the address is empty.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.address.trim().is_empty() {
            return Err(DomainError::Validation(
                "location address must not be empty".into(),
            ));
        }
        Ok(())
    }
}
