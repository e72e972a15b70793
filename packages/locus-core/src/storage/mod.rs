//! # Storage Module
//!
//! Local durable state: the capture log and the preference file.
//!
//! ## Storage Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         STORAGE SYSTEM                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite Database (locations.db)                                 │   │
//! │  │  ──────────────────────────────                                  │   │
//! │  │                                                                 │   │
//! │  │  Tables:                                                       │   │
//! │  │  • schema_version - Schema bookkeeping                         │   │
//! │  │  • locations      - Append-only capture log                    │   │
//! │  │                                                                 │   │
//! │  │  Writes: one IMMEDIATE transaction per insert                  │   │
//! │  │  Reads:  ORDER BY id ASC                                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Preference File (preferences.json)                             │   │
//! │  │  ──────────────────────────────────                              │   │
//! │  │                                                                 │   │
//! │  │  One JSON object, replaced atomically on every write           │   │
//! │  │  • darkMode           - Theme flag                             │   │
//! │  │  • locationPermission - Remembered prompt answer               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod location_store;
pub mod preferences;
mod schema;
mod transaction;

pub use location_store::{LocationRecord, LocationStore};
pub use preferences::PreferenceStore;
