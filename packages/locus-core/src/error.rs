//! # Error Handling
//!
//! Error types for Locus Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Workflow Errors                                                   │
//! │  │   ├── CaptureInProgress     - A capture is already running          │
//! │  │   └── CaptureAbandoned      - Caller left before the commit         │
//! │  │                                                                      │
//! │  ├── Permission Errors                                                 │
//! │  │   └── PermissionDenied      - Foreground location access refused    │
//! │  │                                                                      │
//! │  ├── Location Errors                                                   │
//! │  │   ├── LocationUnavailable   - Disabled, timed out, provider failed  │
//! │  │   └── InvalidCoordinates    - Reading outside lat/lon ranges        │
//! │  │                                                                      │
//! │  ├── Storage Errors                                                    │
//! │  │   ├── DatabaseError         - SQLite open/insert/read failure       │
//! │  │   ├── SchemaError           - Schema creation or version mismatch   │
//! │  │   └── StorageClosed         - Store used after close                │
//! │  │                                                                      │
//! │  ├── Preference Errors                                                 │
//! │  │   └── PreferenceError       - Preference file read/write failure    │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      ├── Internal              - Task join failures and the like       │
//! │      ├── SerializationError    - JSON encode/decode failure            │
//! │      └── InvalidConfig         - Bad configuration value               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Surfacing
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ERROR SURFACING FLOW                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Capture workflow          Alert channel            Presentation        │
//! │  ──────────────────────────────────────────────────────────────────     │
//! │                                                                         │
//! │  Result<T, Error>  ──────►  Alert { code, msg }  ──────►  dialog/toast  │
//! │                                                                         │
//! │  Preference failures never reach the alert channel: they are logged    │
//! │  and the default value is used instead.                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for Locus Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Locus Core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Workflow Errors (100-199)
    // ========================================================================

    /// A capture was requested while another one is still running
    #[error("A capture is already in progress.")]
    CaptureInProgress,

    /// The caller stopped waiting before the record was committed
    #[error("The capture was abandoned before its record was saved.")]
    CaptureAbandoned,

    // ========================================================================
    // Permission Errors (200-299)
    // ========================================================================

    /// The user or the system refused foreground location access
    #[error("Location permission was denied.")]
    PermissionDenied,

    // ========================================================================
    // Location Errors (300-399)
    // ========================================================================

    /// No position could be obtained
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// Latitude or longitude outside the valid range
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    // ========================================================================
    // Storage Errors (400-499)
    // ========================================================================

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Schema could not be created or is from a newer version
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// The store has been closed
    #[error("Storage has been closed.")]
    StorageClosed,

    // ========================================================================
    // Preference Errors (500-599)
    // ========================================================================

    /// Preference read/write failure
    #[error("Preference error: {0}")]
    PreferenceError(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Capture workflow
    /// - 200-299: Permission
    /// - 300-399: Location
    /// - 400-499: Storage
    /// - 500-599: Preferences
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Workflow (100-199)
            Error::CaptureInProgress => 100,
            Error::CaptureAbandoned => 101,

            // Permission (200-299)
            Error::PermissionDenied => 200,

            // Location (300-399)
            Error::LocationUnavailable(_) => 300,
            Error::InvalidCoordinates(_) => 301,

            // Storage (400-499)
            Error::DatabaseError(_) => 400,
            Error::SchemaError(_) => 401,
            Error::StorageClosed => 402,

            // Preferences (500-599)
            Error::PreferenceError(_) => 500,

            // Internal (900-999)
            Error::Internal(_) => 900,
            Error::SerializationError(_) => 902,
            Error::InvalidConfig(_) => 904,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors can be resolved by retrying the capture,
    /// possibly after the user changes something outside the app.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::CaptureInProgress
                | Error::CaptureAbandoned
                | Error::PermissionDenied
                | Error::LocationUnavailable(_)
                | Error::InvalidCoordinates(_)
                | Error::DatabaseError(_)
        )
    }

    /// Check if this error requires user action
    pub fn requires_user_action(&self) -> bool {
        matches!(self, Error::PermissionDenied)
    }

    /// Check if this error came from the record store
    pub fn is_storage(&self) -> bool {
        (400..500).contains(&self.code())
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::CaptureInProgress.code(), 100);
        assert_eq!(Error::CaptureAbandoned.code(), 101);
        assert_eq!(Error::PermissionDenied.code(), 200);
        assert_eq!(Error::LocationUnavailable("test".into()).code(), 300);
        assert_eq!(Error::DatabaseError("test".into()).code(), 400);
        assert_eq!(Error::PreferenceError("test".into()).code(), 500);
        assert_eq!(Error::Internal("test".into()).code(), 900);
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(Error::PermissionDenied.is_recoverable());
        assert!(Error::LocationUnavailable("timeout".into()).is_recoverable());
        assert!(Error::DatabaseError("locked".into()).is_recoverable());
        assert!(!Error::SchemaError("newer".into()).is_recoverable());
        assert!(!Error::Internal("join".into()).is_recoverable());
    }

    #[test]
    fn test_storage_classification() {
        assert!(Error::DatabaseError("x".into()).is_storage());
        assert!(Error::StorageClosed.is_storage());
        assert!(!Error::PreferenceError("x".into()).is_storage());
        assert!(Error::PermissionDenied.requires_user_action());
    }

    #[test]
    fn test_rusqlite_conversion_keeps_cause() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.code(), 400);
        assert!(err.to_string().contains("Query returned no rows"));
    }
}
