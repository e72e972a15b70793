//! # Location Store
//!
//! SQLite-backed append-only log of captured positions.
//!
//! ## Operations
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      LOCATION STORE OPERATIONS                          │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  Capture ctrl   │                                                   │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │  LocationStore  │  High-level API                                   │
//! │  │   (this file)   │  - ensure_schema (idempotent)                     │
//! │  │                 │  - insert (one scoped transaction)                │
//! │  │                 │  - list_all (ORDER BY id ASC)                     │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │    rusqlite     │  Mutex-guarded single connection                  │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │   SQLite DB     │  - In-memory for tests                            │
//! │  │                 │  - File (WAL) for production                      │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::schema;
use super::transaction::WriteTransaction;
use crate::error::{Error, Result};
use crate::platform::{validate_coordinates, Position};

/// How long a file-backed connection waits on a locked database
const BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

const SELECT_COLUMNS: &str = "SELECT id, latitude, longitude, captured_at FROM locations";

/// One captured position. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Store-assigned id, strictly increasing in insertion order
    pub id: i64,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Unix seconds at insert time
    pub captured_at: i64,
}

impl LocationRecord {
    /// The record's coordinates
    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            latitude: row.get(1)?,
            longitude: row.get(2)?,
            captured_at: row.get(3)?,
        })
    }
}

/// The capture log.
///
/// Sole owner of the `locations` table. Every write goes through a
/// [`WriteTransaction`]; the connection sits behind a mutex so only one
/// statement sequence runs at a time.
pub struct LocationStore {
    /// `None` once closed
    conn: Mutex<Option<Connection>>,
    /// Backing file, `None` for in-memory stores
    path: Option<PathBuf>,
}

impl LocationStore {
    /// Open or create a store
    ///
    /// If path is None, creates an in-memory database (useful for testing).
    /// The schema is ensured before this returns.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let conn = match path {
            Some(p) => Self::open_file(p)?,
            None => Connection::open_in_memory().map_err(|e| {
                Error::DatabaseError(format!("Failed to create in-memory database: {}", e))
            })?,
        };

        let store = Self {
            conn: Mutex::new(Some(conn)),
            path: path.map(Path::to_path_buf),
        };
        store.ensure_schema()?;

        match &store.path {
            Some(p) => tracing::info!(path = %p.display(), "Location store opened"),
            None => tracing::info!("In-memory location store opened"),
        }
        Ok(store)
    }

    fn open_file(path: &Path) -> Result<Connection> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::DatabaseError(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::DatabaseError(format!("Failed to open database: {}", e)))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| Error::DatabaseError(format!("Failed to set busy timeout: {}", e)))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| Error::DatabaseError(format!("Failed to enable WAL: {}", e)))?;
        Ok(conn)
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self.conn.lock();
        let conn = guard.as_mut().ok_or(Error::StorageClosed)?;
        f(conn)
    }

    /// Create the tables if they are missing
    ///
    /// Safe to call on every startup and any number of times after.
    /// Fails only if the file was written by a newer schema version.
    pub fn ensure_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            let tx = WriteTransaction::begin(conn)?;

            tx.execute_batch(schema::CREATE_TABLES)
                .map_err(|e| Error::SchemaError(format!("Failed to create tables: {}", e)))?;

            let version: Option<i32> = tx
                .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
                .map_err(|e| Error::SchemaError(format!("Failed to read schema version: {}", e)))?;

            match version {
                None => {
                    tx.execute(
                        "INSERT INTO schema_version (version) VALUES (?)",
                        params![schema::SCHEMA_VERSION],
                    )
                    .map_err(|e| {
                        Error::SchemaError(format!("Failed to set schema version: {}", e))
                    })?;
                    tracing::info!("Database schema created (version {})", schema::SCHEMA_VERSION);
                }
                Some(v) if v > schema::SCHEMA_VERSION => {
                    tx.rollback()?;
                    return Err(Error::SchemaError(format!(
                        "database schema version {} is newer than supported version {}",
                        v,
                        schema::SCHEMA_VERSION
                    )));
                }
                Some(v) => {
                    tracing::debug!("Database schema version: {}", v);
                }
            }

            tx.commit()
        })
    }

    // ========================================================================
    // LOCATION OPERATIONS
    // ========================================================================

    /// Append a captured position and return its id
    ///
    /// Runs as one transaction: the row and its id become visible
    /// together or not at all. Out-of-range coordinates are rejected
    /// before anything is written.
    pub fn insert(&self, latitude: f64, longitude: f64) -> Result<i64> {
        self.insert_unless(latitude, longitude, || false)
    }

    /// Like [`insert`](Self::insert), but `abandoned` is checked once the
    /// connection is held and again right before commit. If it returns
    /// true the transaction is rolled back and
    /// [`Error::CaptureAbandoned`] is returned.
    pub fn insert_unless(
        &self,
        latitude: f64,
        longitude: f64,
        abandoned: impl Fn() -> bool,
    ) -> Result<i64> {
        validate_coordinates(latitude, longitude)?;
        let captured_at = crate::time::now_timestamp();

        self.with_conn(|conn| {
            if abandoned() {
                return Err(Error::CaptureAbandoned);
            }
            let tx = WriteTransaction::begin(conn)?;

            tx.execute(
                "INSERT INTO locations (latitude, longitude, captured_at) VALUES (?, ?, ?)",
                params![latitude, longitude, captured_at],
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to insert location: {}", e)))?;

            let id = tx.last_insert_rowid();
            if abandoned() {
                tx.rollback()?;
                tracing::info!("Insert rolled back, capture was abandoned");
                return Err(Error::CaptureAbandoned);
            }
            tx.commit()?;

            tracing::debug!(record_id = id, "Location recorded");
            Ok(id)
        })
    }

    /// Every record, ordered by id ascending (insertion order)
    pub fn list_all(&self) -> Result<Vec<LocationRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!("{} ORDER BY id ASC", SELECT_COLUMNS))
                .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

            let rows = stmt
                .query_map([], LocationRecord::from_row)
                .map_err(|e| Error::DatabaseError(format!("Failed to query locations: {}", e)))?;

            let mut records = Vec::new();
            for row in rows {
                records.push(
                    row.map_err(|e| Error::DatabaseError(format!("Failed to read row: {}", e)))?,
                );
            }
            Ok(records)
        })
    }

    /// A single record by id
    pub fn get(&self, id: i64) -> Result<Option<LocationRecord>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("{} WHERE id = ?", SELECT_COLUMNS),
                params![id],
                LocationRecord::from_row,
            )
            .optional()
            .map_err(|e| Error::DatabaseError(format!("Failed to get location: {}", e)))
        })
    }

    /// Number of records
    pub fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM locations", [], |row| row.get(0))
                .map_err(|e| Error::DatabaseError(format!("Failed to count locations: {}", e)))?;
            Ok(count as usize)
        })
    }

    /// Close the connection
    ///
    /// Later calls on this store fail with [`Error::StorageClosed`].
    /// Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let Some(conn) = self.conn.lock().take() else {
            return Ok(());
        };
        conn.close()
            .map_err(|(_, e)| Error::DatabaseError(format!("Failed to close database: {}", e)))?;
        tracing::info!("Location store closed");
        Ok(())
    }

    /// Take the connection lock so other callers block until the guard drops
    #[cfg(test)]
    pub(crate) fn hold_connection(&self) -> parking_lot::MutexGuard<'_, Option<Connection>> {
        self.conn.lock()
    }

    /// Run raw SQL against the connection, bypassing the transaction API
    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        self.with_conn(|conn| Ok(conn.execute_batch(sql)?))
    }
}

// ============================================================================
// TESTS
// ============================================================================
