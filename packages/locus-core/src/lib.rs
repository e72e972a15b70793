//! # Locus Core
//!
//! Records the device's position on demand into a durable local log and
//! keeps a persisted dark-mode preference.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         LOCUS CORE MODULES                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   ┌──────────────────────┐            ┌──────────────────────┐         │
//! │   │  Presentation layer  │            │   Theme preference   │         │
//! │   │  (CLI, app shell)    │──toggle───►│   (dark mode flag)   │         │
//! │   └──────────┬───────────┘            └──────────┬───────────┘         │
//! │              │ capture / subscribe               │                     │
//! │              ▼                                   ▼                     │
//! │   ┌──────────────────────┐            ┌──────────────────────┐         │
//! │   │  Capture controller  │            │   Preference store   │         │
//! │   │  - single flight     │            │   (preferences.json) │         │
//! │   │  - state + alerts    │            └──────────────────────┘         │
//! │   └───┬──────────┬───────┘                                             │
//! │       │          │                                                     │
//! │       ▼          ▼                                                     │
//! │  ┌──────────┐ ┌──────────────┐        ┌──────────────────────┐         │
//! │  │Permission│ │  Location    │        │   Location store     │         │
//! │  │  gate    │ │  provider    │        │   (locations.db)     │◄──┐     │
//! │  └──────────┘ └──────────────┘        └──────────────────────┘   │     │
//! │   platform traits, injected            insert + list_all ────────┘     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`platform`] - Permission and location seams plus fixed test doubles
//! - [`storage`] - SQLite capture log and JSON preference file
//! - [`capture`] - The capture workflow and its observable state
//! - [`theme`] - Dark-mode preference
//!
//! There is no process-wide instance. The host builds one [`Locus`] at
//! startup and passes references to whatever needs them.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod capture;
pub mod error;
pub mod platform;
pub mod storage;
pub mod theme;
pub mod time;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use capture::{
    Alert, CancelOnDrop, CancelToken, CaptureController, CaptureOptions, CaptureSnapshot,
    CaptureState,
};
pub use error::{Error, Result};
pub use platform::{Accuracy, LocationProvider, PermissionGate, PermissionStatus, Position};
pub use storage::{LocationRecord, LocationStore, PreferenceStore};
pub use theme::ThemePreference;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// How long a capture waits for a position fix by default
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// CORE INSTANCE
// ============================================================================

/// Configuration for opening a [`Locus`]
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// SQLite file for the capture log; in-memory if `None`
    pub database_path: Option<PathBuf>,
    /// Accuracy hint for every capture
    pub accuracy: Accuracy,
    /// Upper bound on each position fetch; `None` waits indefinitely
    pub location_timeout: Option<Duration>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            accuracy: Accuracy::default(),
            location_timeout: Some(DEFAULT_LOCATION_TIMEOUT),
        }
    }
}

/// Everything the app needs, wired together
///
/// ## Lifecycle
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                         LOCUS LIFECYCLE                                 │
/// ├─────────────────────────────────────────────────────────────────────────┤
/// │                                                                         │
/// │  1. Open                                                                │
/// │     ┌─────────────┐                                                    │
/// │     │ Locus::     │──► Open locations.db, ensure schema                │
/// │     │ open()      │──► Read the dark-mode flag                         │
/// │     └─────────────┘──► Build the capture controller                    │
/// │            │                                                           │
/// │            ▼                                                           │
/// │  2. Running                                                            │
/// │     ┌─────────────┐                                                    │
/// │     │ controller()│◄─► capture / refresh / subscribe                   │
/// │     │ theme()     │◄─► toggle dark mode                                │
/// │     └─────────────┘                                                    │
/// │            │                                                           │
/// │            ▼                                                           │
/// │  3. Shutdown                                                           │
/// │     ┌─────────────┐                                                    │
/// │     │ shutdown()  │──► Close the database connection                   │
/// │     └─────────────┘                                                    │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub struct Locus {
    store: Arc<LocationStore>,
    preferences: Arc<PreferenceStore>,
    theme: ThemePreference,
    controller: CaptureController,
}

impl Locus {
    /// Open storage and wire up the capture workflow
    ///
    /// A schema or open failure is returned; there is nothing useful the
    /// app can do without its log.
    pub fn open(
        config: CoreConfig,
        preferences: Arc<PreferenceStore>,
        permissions: Arc<dyn PermissionGate>,
        provider: Arc<dyn LocationProvider>,
    ) -> Result<Self> {
        tracing::info!("Opening Locus Core v{}", env!("CARGO_PKG_VERSION"));

        let store = Arc::new(LocationStore::open(config.database_path.as_deref())?);
        let theme = ThemePreference::load(Arc::clone(&preferences));
        let controller = CaptureController::new(
            Arc::clone(&store),
            permissions,
            provider,
            CaptureOptions {
                accuracy: config.accuracy,
                location_timeout: config.location_timeout,
            },
        );

        tracing::info!("Locus Core ready");
        Ok(Self {
            store,
            preferences,
            theme,
            controller,
        })
    }

    /// The capture workflow
    pub fn controller(&self) -> &CaptureController {
        &self.controller
    }

    /// The dark-mode preference
    pub fn theme(&self) -> &ThemePreference {
        &self.theme
    }

    /// The capture log
    pub fn store(&self) -> &Arc<LocationStore> {
        &self.store
    }

    /// The preference file
    pub fn preferences(&self) -> &Arc<PreferenceStore> {
        &self.preferences
    }

    /// Close the capture log
    pub fn shutdown(self) -> Result<()> {
        tracing::info!("Shutting down Locus Core");
        self.store.close()?;
        tracing::info!("Locus Core shutdown complete");
        Ok(())
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Locus Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns build information for debugging
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        target: std::env::consts::OS,
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
    }
}

/// Build information for debugging
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Crate version
    pub version: &'static str,
    /// Operating system the crate was built for
    pub target: &'static str,
    /// Build profile (debug/release)
    pub profile: &'static str,
}

// ============================================================================
// TESTS
// ============================================================================
