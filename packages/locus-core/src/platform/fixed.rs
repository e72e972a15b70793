//! Fixed platform stand-ins.
//!
//! Used by hosts without real location hardware (the CLI, desktop builds,
//! tests). They answer immediately and never prompt.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Accuracy, LocationProvider, PermissionGate, PermissionStatus, Position};
use crate::error::{Error, Result};

/// Permission gate that always returns the same decision
#[derive(Debug, Clone, Copy)]
pub struct StaticPermissionGate {
    status: PermissionStatus,
}

impl StaticPermissionGate {
    /// Gate that always grants access
    pub fn granted() -> Self {
        Self {
            status: PermissionStatus::Granted,
        }
    }

    /// Gate that always denies access
    pub fn denied() -> Self {
        Self {
            status: PermissionStatus::Denied,
        }
    }
}

#[async_trait]
impl PermissionGate for StaticPermissionGate {
    async fn request_foreground_access(&self) -> Result<PermissionStatus> {
        Ok(self.status)
    }
}

/// Location provider that reports a configured fix.
///
/// With no fix set, every request fails with `LocationUnavailable`,
/// the same as a device with location services turned off.
#[derive(Debug, Default)]
pub struct FixedLocationProvider {
    fix: RwLock<Option<Position>>,
}

impl FixedLocationProvider {
    /// Provider with no fix
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider reporting `position` on every request
    pub fn at(position: Position) -> Self {
        Self {
            fix: RwLock::new(Some(position)),
        }
    }

    /// Replace the reported fix (`None` simulates location services off)
    pub fn set_fix(&self, position: Option<Position>) {
        *self.fix.write() = position;
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_position(&self, accuracy: Accuracy) -> Result<Position> {
        let fix = *self.fix.read();
        match fix {
            Some(position) => {
                tracing::debug!(%accuracy, "Reporting fixed position");
                Ok(position)
            }
            None => Err(Error::LocationUnavailable(
                "no position fix configured".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_gate() {
        let granted = StaticPermissionGate::granted();
        let denied = StaticPermissionGate::denied();

        assert_eq!(
            granted.request_foreground_access().await.unwrap(),
            PermissionStatus::Granted
        );
        assert_eq!(
            denied.request_foreground_access().await.unwrap(),
            PermissionStatus::Denied
        );
    }

    #[tokio::test]
    async fn test_fixed_provider_without_fix_is_unavailable() {
        let provider = FixedLocationProvider::new();
        let err = provider.current_position(Accuracy::High).await.unwrap_err();
        assert!(matches!(err, Error::LocationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_fixed_provider_reports_fix() {
        let provider = FixedLocationProvider::at(Position::new(37.422, -122.084));
        let pos = provider.current_position(Accuracy::Low).await.unwrap();
        assert_eq!(pos, Position::new(37.422, -122.084));

        provider.set_fix(None);
        assert!(provider.current_position(Accuracy::Low).await.is_err());
    }
}
