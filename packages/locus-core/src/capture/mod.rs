//! # Capture Module
//!
//! The on-demand capture workflow and the state it exposes to the
//! presentation layer.
//!
//! ## Capture Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         CAPTURE WORKFLOW                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   Idle                                                                  │
//! │    │ capture()                         (second call while busy:         │
//! │    ▼                                    rejected, CaptureInProgress)    │
//! │   RequestingPermission ──── Denied ────────────────► Idle + alert      │
//! │    │ Granted                                                            │
//! │    ▼                                                                    │
//! │   AcquiringLocation ─── unavailable / timeout / cancel ─► Idle + alert │
//! │    │ Position                                                           │
//! │    ▼                                                                    │
//! │   Persisting  (one transaction) ──── StorageError ─────► Idle + alert  │
//! │    │ id                                                                 │
//! │    ▼                                                                    │
//! │   Reloading   (list_all, publish) ── StorageError ─────► Idle + alert  │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │   Idle                                                                  │
//! │                                                                         │
//! │  loading = (state != Idle). The return to Idle happens in a drop       │
//! │  guard, so it also runs if the capture future is dropped mid-flight.   │
//! │  A write already on the blocking pool keeps the guard alive until it   │
//! │  ends; an abandoned write rolls back instead of committing.            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cancel;
mod state;

pub use cancel::{CancelOnDrop, CancelToken};
pub use state::{Alert, CaptureSnapshot, CaptureState};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::platform::{Accuracy, LocationProvider, PermissionGate, Position};
use crate::storage::{LocationRecord, LocationStore};

/// Alerts buffered per subscriber before the oldest are dropped
const ALERT_CHANNEL_CAPACITY: usize = 16;

/// Tunables for the capture workflow
#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    /// Accuracy hint passed to the location provider
    pub accuracy: Accuracy,
    /// Upper bound on the position fetch; `None` waits indefinitely
    pub location_timeout: Option<Duration>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::default(),
            location_timeout: Some(crate::DEFAULT_LOCATION_TIMEOUT),
        }
    }
}

/// Runs captures and publishes their state
///
/// At most one capture runs at a time; further calls are rejected with
/// [`Error::CaptureInProgress`] until it finishes.
pub struct CaptureController {
    store: Arc<LocationStore>,
    permissions: Arc<dyn PermissionGate>,
    provider: Arc<dyn LocationProvider>,
    options: CaptureOptions,
    /// Set while a capture holds the workflow
    in_flight: Arc<AtomicBool>,
    state_tx: Arc<watch::Sender<CaptureSnapshot>>,
    alert_tx: broadcast::Sender<Alert>,
}

impl CaptureController {
    /// Create a controller over an open store and the platform services
    pub fn new(
        store: Arc<LocationStore>,
        permissions: Arc<dyn PermissionGate>,
        provider: Arc<dyn LocationProvider>,
        options: CaptureOptions,
    ) -> Self {
        let (state_tx, _) = watch::channel(CaptureSnapshot::default());
        let (alert_tx, _) = broadcast::channel(ALERT_CHANNEL_CAPACITY);

        Self {
            store,
            permissions,
            provider,
            options,
            in_flight: Arc::new(AtomicBool::new(false)),
            state_tx: Arc::new(state_tx),
            alert_tx,
        }
    }

    // ========================================================================
    // OBSERVATION
    // ========================================================================

    /// Current state, loading flag and history
    pub fn snapshot(&self) -> CaptureSnapshot {
        self.state_tx.borrow().clone()
    }

    /// Whether a capture is running
    pub fn is_loading(&self) -> bool {
        self.state_tx.borrow().loading
    }

    /// Receive every state change
    pub fn subscribe_state(&self) -> watch::Receiver<CaptureSnapshot> {
        self.state_tx.subscribe()
    }

    /// Receive user-facing alerts
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.alert_tx.subscribe()
    }

    // ========================================================================
    // WORKFLOW
    // ========================================================================

    /// Load the history without capturing
    ///
    /// Used at startup to move the listing from not-yet-loaded to loaded.
    /// A storage failure raises an alert and is returned.
    pub async fn refresh(&self) -> Result<Arc<Vec<LocationRecord>>> {
        match self.reload().await {
            Ok(records) => Ok(records),
            Err(err) => {
                self.raise_alert(None, &err);
                Err(err)
            }
        }
    }

    /// Capture the current position, store it and reload the history
    pub async fn capture(&self) -> Result<LocationRecord> {
        self.capture_with_cancel(&CancelToken::new()).await
    }

    /// Like [`capture`](Self::capture), but the position fetch ends with
    /// `LocationUnavailable` as soon as `cancel` fires.
    pub async fn capture_with_cancel(&self, cancel: &CancelToken) -> Result<LocationRecord> {
        let Some(workflow) = WorkflowGuard::acquire(self) else {
            tracing::warn!("Capture rejected: another capture is in progress");
            return Err(Error::CaptureInProgress);
        };

        let attempt = Uuid::new_v4();
        tracing::info!(%attempt, "Capture started");

        match self.run(&workflow, attempt, cancel).await {
            Ok(record) => {
                tracing::info!(%attempt, record_id = record.id, "Capture stored");
                Ok(record)
            }
            Err(err) => {
                self.raise_alert(Some(attempt), &err);
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        workflow: &Arc<WorkflowGuard>,
        attempt: Uuid,
        cancel: &CancelToken,
    ) -> Result<LocationRecord> {
        self.enter(CaptureState::RequestingPermission);
        let status = self.permissions.request_foreground_access().await?;
        if !status.is_granted() {
            return Err(Error::PermissionDenied);
        }

        self.enter(CaptureState::AcquiringLocation);
        let position = self.acquire_position(cancel).await?;
        tracing::debug!(%attempt, latitude = position.latitude, longitude = position.longitude, "Position acquired");

        self.enter(CaptureState::Persisting);
        let id = self.persist(workflow, position).await?;

        self.enter(CaptureState::Reloading);
        let records = self.reload().await?;

        records
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or_else(|| Error::Internal(format!("record {} missing after reload", id)))
    }

    async fn acquire_position(&self, cancel: &CancelToken) -> Result<Position> {
        let fetch = self.provider.current_position(self.options.accuracy);
        let bounded = async {
            match self.options.location_timeout {
                Some(limit) => tokio::time::timeout(limit, fetch).await.unwrap_or_else(|_| {
                    Err(Error::LocationUnavailable(format!(
                        "no position fix within {} ms",
                        limit.as_millis()
                    )))
                }),
                None => fetch.await,
            }
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                Err(Error::LocationUnavailable("location request cancelled".into()))
            }
            result = bounded => result,
        };

        let position = result.map_err(|err| match err {
            Error::LocationUnavailable(_) => err,
            other => Error::LocationUnavailable(other.to_string()),
        })?;

        position.validate().map_err(|err| {
            Error::LocationUnavailable(format!("provider returned an unusable reading: {}", err))
        })?;
        Ok(position)
    }

    /// Insert on the blocking pool
    ///
    /// The write task holds its own handle on the workflow, so the slot
    /// stays taken until the write ends even if this future is dropped.
    /// Dropping it marks the write abandoned and the insert rolls back.
    async fn persist(&self, workflow: &Arc<WorkflowGuard>, position: Position) -> Result<i64> {
        let abandoned = CancelToken::new();
        let _abandon_on_drop = abandoned.drop_guard();

        let store = Arc::clone(&self.store);
        let held = Arc::clone(workflow);
        run_blocking(move || {
            let _held = held;
            store.insert_unless(position.latitude, position.longitude, || {
                abandoned.is_cancelled()
            })
        })
        .await
    }

    /// Read the full history and publish it
    async fn reload(&self) -> Result<Arc<Vec<LocationRecord>>> {
        let store = Arc::clone(&self.store);
        let records = Arc::new(run_blocking(move || store.list_all()).await?);

        let published = Arc::clone(&records);
        self.state_tx
            .send_modify(|snapshot| snapshot.locations = Some(published));
        Ok(records)
    }

    fn enter(&self, state: CaptureState) {
        tracing::debug!(%state, "Capture state changed");
        self.state_tx.send_modify(|snapshot| {
            snapshot.state = state;
            snapshot.loading = true;
        });
    }

    fn raise_alert(&self, attempt: Option<Uuid>, err: &Error) {
        let attempt = attempt.map(|id| id.to_string()).unwrap_or_default();
        if err.is_storage() {
            tracing::error!(%attempt, code = err.code(), "Capture failed: {}", err);
        } else {
            tracing::warn!(%attempt, code = err.code(), "Capture failed: {}", err);
        }

        // No subscribers is fine; the error is also returned to the caller.
        let _ = self.alert_tx.send(Alert::from(err));
    }
}

/// Holds the single capture slot and resets state to `Idle` on drop
struct WorkflowGuard {
    in_flight: Arc<AtomicBool>,
    state_tx: Arc<watch::Sender<CaptureSnapshot>>,
}

impl WorkflowGuard {
    fn acquire(controller: &CaptureController) -> Option<Arc<Self>> {
        controller
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Arc::new(Self {
            in_flight: Arc::clone(&controller.in_flight),
            state_tx: Arc::clone(&controller.state_tx),
        }))
    }
}

impl Drop for WorkflowGuard {
    fn drop(&mut self) {
        self.state_tx.send_modify(|snapshot| {
            snapshot.state = CaptureState::Idle;
            snapshot.loading = false;
        });
        self.in_flight.store(false, Ordering::Release);
        tracing::debug!("Capture workflow back to idle");
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(format!("storage task failed: {}", e)))?
}

// ============================================================================
// TESTS
// ============================================================================
