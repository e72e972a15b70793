//! # Theme Preference
//!
//! The dark-mode toggle path. The flag is read once when the app starts
//! and written on every toggle; a failed write is logged and the theme
//! drops back to light instead of surfacing an error.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::storage::preferences::keys;
use crate::storage::PreferenceStore;

/// Current dark-mode setting backed by the preference store
pub struct ThemePreference {
    store: Arc<PreferenceStore>,
    dark_mode: AtomicBool,
}

impl ThemePreference {
    /// Read the stored flag. Absent or malformed values mean light mode.
    pub fn load(store: Arc<PreferenceStore>) -> Self {
        let dark_mode = match store.get(keys::DARK_MODE) {
            None => false,
            Some(Value::Bool(enabled)) => enabled,
            Some(other) => {
                tracing::warn!("Ignoring non-boolean {} preference: {}", keys::DARK_MODE, other);
                false
            }
        };

        tracing::debug!(dark_mode, "Theme preference loaded");
        Self {
            store,
            dark_mode: AtomicBool::new(dark_mode),
        }
    }

    /// Whether dark mode is on
    pub fn dark_mode_enabled(&self) -> bool {
        self.dark_mode.load(Ordering::Acquire)
    }

    /// Persist a new setting and return the one now in effect
    pub fn set_dark_mode(&self, enabled: bool) -> bool {
        let effective = match self.store.set(keys::DARK_MODE, Value::Bool(enabled)) {
            Ok(()) => enabled,
            Err(e) => {
                tracing::warn!("Failed to save theme preference, using light mode: {}", e);
                false
            }
        };
        self.dark_mode.store(effective, Ordering::Release);
        effective
    }

    /// Flip the setting and return the one now in effect
    pub fn toggle(&self) -> bool {
        self.set_dark_mode(!self.dark_mode_enabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_to_light() {
        let theme = ThemePreference::load(Arc::new(PreferenceStore::in_memory()));
        assert!(!theme.dark_mode_enabled());
    }

    #[test]
    fn test_toggle_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");

        let theme = ThemePreference::load(Arc::new(PreferenceStore::open(&path).unwrap()));
        assert!(theme.toggle());
        assert!(theme.dark_mode_enabled());

        let reloaded = ThemePreference::load(Arc::new(PreferenceStore::open(&path).unwrap()));
        assert!(reloaded.dark_mode_enabled());

        assert!(!reloaded.toggle());
        let reloaded = ThemePreference::load(Arc::new(PreferenceStore::open(&path).unwrap()));
        assert!(!reloaded.dark_mode_enabled());
    }

    #[test]
    fn test_malformed_value_means_light() {
        let store = Arc::new(PreferenceStore::in_memory());
        store.set(keys::DARK_MODE, json!("yes")).unwrap();

        let theme = ThemePreference::load(store);
        assert!(!theme.dark_mode_enabled());
    }

    #[test]
    fn test_failed_write_falls_back_to_light() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("blocked");
        let store = Arc::new(PreferenceStore::open(blocked.join("preferences.json")).unwrap());
        std::fs::write(&blocked, b"").unwrap();

        let theme = ThemePreference::load(store);
        assert!(!theme.set_dark_mode(true));
        assert!(!theme.dark_mode_enabled());
    }
}
