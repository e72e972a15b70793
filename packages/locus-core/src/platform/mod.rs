//! # Platform Services
//!
//! The two OS services the capture workflow consumes: foreground location
//! permission and a one-shot current-position reading.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      PLATFORM SEAMS                                     │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────────────┐      ┌──────────────────────────────┐    │
//! │  │  PermissionGate          │      │  LocationProvider            │    │
//! │  │  ──────────────          │      │  ────────────────            │    │
//! │  │  request_foreground_     │      │  current_position(accuracy)  │    │
//! │  │    access()              │      │    → Position                │    │
//! │  │    → Granted | Denied    │      │    | LocationUnavailable     │    │
//! │  └────────────┬─────────────┘      └──────────────┬───────────────┘    │
//! │               │                                   │                    │
//! │   iOS: CLLocationManager auth      iOS: requestLocation                │
//! │   Android: ACCESS_FINE_LOCATION    Android: getCurrentLocation         │
//! │   CLI: stdin prompt                CLI / tests: FixedLocationProvider  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both traits are object safe so hosts can inject `Arc<dyn ...>`
//! implementations into the capture controller.

mod fixed;

pub use fixed::{FixedLocationProvider, StaticPermissionGate};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Valid latitude range in degrees
pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in degrees
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

// ============================================================================
// PERMISSION
// ============================================================================

/// Outcome of a foreground location permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    /// Location may be read while the app is in use
    Granted,
    /// The user or the system refused access
    Denied,
}

impl PermissionStatus {
    /// Whether location may be read
    pub fn is_granted(self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Requests and reports the authorization needed to read location.
///
/// Implementations prompt only when no decision has been made yet;
/// otherwise they return the prior decision. A denial is final for
/// that call. Retrying is up to the caller.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Ask for foreground location access.
    ///
    /// `Err` means the platform could not answer at all, not that the
    /// user said no.
    async fn request_foreground_access(&self) -> Result<PermissionStatus>;
}

// ============================================================================
// POSITION
// ============================================================================

/// Requested precision tier for a position fix. A hint, not a guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    /// City-level, cheapest on power
    Lowest,
    /// Roughly a kilometre
    Low,
    /// Roughly a hundred metres
    Balanced,
    /// Roughly ten metres
    #[default]
    High,
    /// Best the hardware can do
    Highest,
}

impl Accuracy {
    /// Lowercase name, as accepted by [`FromStr`]
    pub fn as_str(self) -> &'static str {
        match self {
            Accuracy::Lowest => "lowest",
            Accuracy::Low => "low",
            Accuracy::Balanced => "balanced",
            Accuracy::High => "high",
            Accuracy::Highest => "highest",
        }
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Accuracy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowest" => Ok(Accuracy::Lowest),
            "low" => Ok(Accuracy::Low),
            "balanced" => Ok(Accuracy::Balanced),
            "high" => Ok(Accuracy::High),
            "highest" => Ok(Accuracy::Highest),
            other => Err(Error::InvalidConfig(format!(
                "unknown accuracy '{}' (expected lowest, low, balanced, high or highest)",
                other
            ))),
        }
    }
}

/// A single position reading in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude, -90..=90
    pub latitude: f64,
    /// Longitude, -180..=180
    pub longitude: f64,
}

impl Position {
    /// Create a position without checking ranges
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check that both coordinates are finite and in range
    pub fn validate(&self) -> Result<()> {
        validate_coordinates(self.latitude, self.longitude)
    }
}

/// Check that a latitude/longitude pair is finite and in range
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !latitude.is_finite() || !LATITUDE_RANGE.contains(&latitude) {
        return Err(Error::InvalidCoordinates(format!(
            "latitude {} is outside [-90, 90]",
            latitude
        )));
    }
    if !longitude.is_finite() || !LONGITUDE_RANGE.contains(&longitude) {
        return Err(Error::InvalidCoordinates(format!(
            "longitude {} is outside [-180, 180]",
            longitude
        )));
    }
    Ok(())
}

/// Retrieves one current-position reading from the platform.
///
/// Exactly one reading per call. Failures of any kind (location
/// services off, provider timeout, provider error) are reported as
/// [`Error::LocationUnavailable`] with a message.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Read the current position at roughly the requested accuracy
    async fn current_position(&self, accuracy: Accuracy) -> Result<Position>;
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_parsing() {
        assert_eq!("high".parse::<Accuracy>().unwrap(), Accuracy::High);
        assert_eq!(" Balanced ".parse::<Accuracy>().unwrap(), Accuracy::Balanced);
        assert_eq!(Accuracy::default(), Accuracy::High);

        let err = "precise".parse::<Accuracy>().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_accuracy_display_matches_parse() {
        for tier in [
            Accuracy::Lowest,
            Accuracy::Low,
            Accuracy::Balanced,
            Accuracy::High,
            Accuracy::Highest,
        ] {
            assert_eq!(tier.to_string().parse::<Accuracy>().unwrap(), tier);
        }
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Position::new(37.422, -122.084).validate().is_ok());
        assert!(Position::new(90.0, 180.0).validate().is_ok());
        assert!(Position::new(-90.0, -180.0).validate().is_ok());

        assert!(matches!(
            Position::new(90.5, 0.0).validate(),
            Err(Error::InvalidCoordinates(_))
        ));
        assert!(matches!(
            Position::new(0.0, -180.01).validate(),
            Err(Error::InvalidCoordinates(_))
        ));
        assert!(Position::new(f64::NAN, 0.0).validate().is_err());
        assert!(Position::new(0.0, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_permission_status_serialization() {
        let json = serde_json::to_string(&PermissionStatus::Granted).unwrap();
        assert_eq!(json, "\"granted\"");
        assert!(PermissionStatus::Granted.is_granted());
        assert!(!PermissionStatus::Denied.is_granted());
    }
}
