//! End-to-end capture and preference behavior through the public API.

use std::sync::Arc;

use locus_core::platform::{FixedLocationProvider, StaticPermissionGate};
use locus_core::{CaptureState, CoreConfig, Error, Locus, Position, PreferenceStore};

fn open_locus(
    dir: &std::path::Path,
    permissions: StaticPermissionGate,
    provider: Arc<FixedLocationProvider>,
) -> Locus {
    let preferences = Arc::new(PreferenceStore::open(dir.join("preferences.json")).unwrap());
    let config = CoreConfig {
        database_path: Some(dir.join("locations.db")),
        ..CoreConfig::default()
    };
    Locus::open(config, preferences, Arc::new(permissions), provider).unwrap()
}

#[tokio::test]
async fn captures_accumulate_in_order_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FixedLocationProvider::at(Position::new(37.422, -122.084)));

    let locus = open_locus(dir.path(), StaticPermissionGate::granted(), provider.clone());
    assert!(locus.controller().refresh().await.unwrap().is_empty());

    locus.controller().capture().await.unwrap();
    provider.set_fix(Some(Position::new(40.0, -73.0)));
    locus.controller().capture().await.unwrap();
    locus.shutdown().unwrap();

    let locus = open_locus(dir.path(), StaticPermissionGate::granted(), provider);
    let records = locus.controller().refresh().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, 1);
    assert_eq!(records[0].position(), Position::new(37.422, -122.084));
    assert_eq!(records[1].id, 2);
    assert_eq!(records[1].position(), Position::new(40.0, -73.0));
    assert!(records[0].captured_at <= records[1].captured_at);
}

#[tokio::test]
async fn denied_permission_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FixedLocationProvider::at(Position::new(1.0, 1.0)));
    let locus = open_locus(dir.path(), StaticPermissionGate::denied(), provider);
    let mut alerts = locus.controller().subscribe_alerts();

    let err = locus.controller().capture().await.unwrap_err();
    assert!(matches!(err, Error::PermissionDenied));
    assert!(err.requires_user_action());

    let snapshot = locus.controller().snapshot();
    assert_eq!(snapshot.state, CaptureState::Idle);
    assert!(!snapshot.loading);
    assert_eq!(locus.store().count().unwrap(), 0);
    assert_eq!(alerts.recv().await.unwrap().title, "Permission denied");
}

#[tokio::test]
async fn dark_mode_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(FixedLocationProvider::new());

    let locus = open_locus(dir.path(), StaticPermissionGate::granted(), provider.clone());
    assert!(!locus.theme().dark_mode_enabled());
    assert!(locus.theme().toggle());
    locus.shutdown().unwrap();

    let locus = open_locus(dir.path(), StaticPermissionGate::granted(), provider);
    assert!(locus.theme().dark_mode_enabled());
}
