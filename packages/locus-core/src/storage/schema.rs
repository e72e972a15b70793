//! # Database Schema
//!
//! SQL schema definitions for the capture log.
//!
//! ## Schema Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         DATABASE SCHEMA                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐            ┌─────────────────┐                     │
//! │  │ schema_version  │            │    locations    │                     │
//! │  ├─────────────────┤            ├─────────────────┤                     │
//! │  │ version         │            │ id   (AUTOINC)  │                     │
//! │  └─────────────────┘            │ latitude        │                     │
//! │                                 │ longitude       │                     │
//! │                                 │ captured_at     │                     │
//! │                                 └─────────────────┘                     │
//! │                                                                         │
//! │  `locations` is append-only. Rows are never updated or deleted, and    │
//! │  AUTOINCREMENT keeps ids strictly increasing for the life of the file. │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL to create all tables. Every statement is `IF NOT EXISTS`, so the
/// batch can run on every startup.
pub const CREATE_TABLES: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Captured positions, oldest first by id
CREATE TABLE IF NOT EXISTS locations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    -- Decimal degrees
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    -- Unix seconds, UTC
    captured_at INTEGER NOT NULL,
    CONSTRAINT latitude_range CHECK (latitude BETWEEN -90.0 AND 90.0),
    CONSTRAINT longitude_range CHECK (longitude BETWEEN -180.0 AND 180.0)
);
"#;
