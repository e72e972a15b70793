//! Observable workflow state and user-facing alerts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::storage::LocationRecord;

/// Where the capture workflow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    /// Nothing running
    #[default]
    Idle,
    /// Waiting on the permission prompt
    RequestingPermission,
    /// Waiting on a position fix
    AcquiringLocation,
    /// Writing the record
    Persisting,
    /// Re-reading the full history
    Reloading,
}

impl CaptureState {
    /// Whether no capture is running
    pub fn is_idle(self) -> bool {
        matches!(self, CaptureState::Idle)
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureState::Idle => "idle",
            CaptureState::RequestingPermission => "requesting_permission",
            CaptureState::AcquiringLocation => "acquiring_location",
            CaptureState::Persisting => "persisting",
            CaptureState::Reloading => "reloading",
        };
        f.write_str(name)
    }
}

/// What the presentation layer renders
#[derive(Debug, Clone, Default)]
pub struct CaptureSnapshot {
    /// Current workflow state
    pub state: CaptureState,
    /// True in every state except `Idle`
    pub loading: bool,
    /// Most recent full listing; `None` until the first load
    pub locations: Option<Arc<Vec<LocationRecord>>>,
}

/// A user-facing failure notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Numeric error code (see [`Error::code`])
    pub code: i32,
    /// Short heading
    pub title: String,
    /// Detail, including the underlying cause
    pub message: String,
    /// Whether offering "try again" makes sense
    pub recoverable: bool,
}

impl From<&Error> for Alert {
    fn from(err: &Error) -> Self {
        let title = match err {
            Error::PermissionDenied => "Permission denied",
            Error::LocationUnavailable(_) | Error::InvalidCoordinates(_) => "Location unavailable",
            e if e.is_storage() => "Could not save location",
            _ => "Capture failed",
        };

        Self {
            code: err.code(),
            title: title.to_string(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
        }
    }
}
