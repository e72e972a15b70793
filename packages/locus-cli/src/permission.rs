//! Terminal permission prompt.
//!
//! The first capture asks on stdin; the answer is kept in the preference
//! file and replayed afterwards, the way a platform permission API
//! remembers a prior decision.

use std::io::{BufRead, Write};
use std::sync::Arc;

use async_trait::async_trait;
use locus_core::storage::preferences::keys;
use locus_core::{Error, PermissionGate, PermissionStatus, PreferenceStore, Result};

/// Permission gate backed by a stdin prompt and a remembered answer
pub struct PromptPermissionGate {
    preferences: Arc<PreferenceStore>,
    /// `--yes`: grant without asking
    assume_yes: bool,
}

impl PromptPermissionGate {
    pub fn new(preferences: Arc<PreferenceStore>, assume_yes: bool) -> Self {
        Self {
            preferences,
            assume_yes,
        }
    }

    fn remembered(&self) -> Option<PermissionStatus> {
        let value = self.preferences.get(keys::LOCATION_PERMISSION)?;
        match serde_json::from_value(value) {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::warn!("Ignoring unreadable {} preference: {}", keys::LOCATION_PERMISSION, e);
                None
            }
        }
    }

    fn remember(&self, status: PermissionStatus) {
        let saved = serde_json::to_value(status)
            .map_err(Error::from)
            .and_then(|value| self.preferences.set(keys::LOCATION_PERMISSION, value));
        if let Err(e) = saved {
            tracing::warn!("Failed to remember permission decision: {}", e);
        }
    }
}

#[async_trait]
impl PermissionGate for PromptPermissionGate {
    async fn request_foreground_access(&self) -> Result<PermissionStatus> {
        if self.assume_yes {
            self.remember(PermissionStatus::Granted);
            return Ok(PermissionStatus::Granted);
        }

        if let Some(status) = self.remembered() {
            tracing::debug!(?status, "Using remembered permission decision");
            return Ok(status);
        }

        let status = tokio::task::spawn_blocking(|| {
            prompt(&mut std::io::stdin().lock(), &mut std::io::stderr())
        })
        .await
        .map_err(|e| Error::Internal(format!("permission prompt failed: {}", e)))??;

        self.remember(status);
        Ok(status)
    }
}

/// Ask once. Anything but an explicit yes, including end of input, is a denial.
fn prompt(input: &mut impl BufRead, output: &mut impl Write) -> Result<PermissionStatus> {
    write!(output, "Allow locus to read your current location? [y/N] ")
        .and_then(|_| output.flush())
        .map_err(|e| Error::Internal(format!("Failed to write prompt: {}", e)))?;

    let mut answer = String::new();
    let read = input
        .read_line(&mut answer)
        .map_err(|e| Error::Internal(format!("Failed to read answer: {}", e)))?;
    if read == 0 {
        return Ok(PermissionStatus::Denied);
    }

    Ok(match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => PermissionStatus::Granted,
        _ => PermissionStatus::Denied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_prompt_answers() {
        let mut out = Vec::new();
        let granted = prompt(&mut Cursor::new("Yes\n"), &mut out).unwrap();
        assert_eq!(granted, PermissionStatus::Granted);
        assert!(String::from_utf8(out).unwrap().contains("[y/N]"));

        let denied = prompt(&mut Cursor::new("\n"), &mut Vec::new()).unwrap();
        assert_eq!(denied, PermissionStatus::Denied);

        let eof = prompt(&mut Cursor::new(""), &mut Vec::new()).unwrap();
        assert_eq!(eof, PermissionStatus::Denied);
    }

    #[tokio::test]
    async fn test_assume_yes_grants_and_remembers() {
        let prefs = Arc::new(PreferenceStore::in_memory());
        let gate = PromptPermissionGate::new(Arc::clone(&prefs), true);

        let status = gate.request_foreground_access().await.unwrap();
        assert_eq!(status, PermissionStatus::Granted);
        assert_eq!(prefs.get(keys::LOCATION_PERMISSION), Some(json!("granted")));
    }

    #[tokio::test]
    async fn test_remembered_decision_is_replayed() {
        let prefs = Arc::new(PreferenceStore::in_memory());
        prefs.set(keys::LOCATION_PERMISSION, json!("denied")).unwrap();

        let gate = PromptPermissionGate::new(Arc::clone(&prefs), false);
        let status = gate.request_foreground_access().await.unwrap();
        assert_eq!(status, PermissionStatus::Denied);

        // --yes overrides an earlier denial
        let gate = PromptPermissionGate::new(Arc::clone(&prefs), true);
        assert!(gate.request_foreground_access().await.unwrap().is_granted());
        assert_eq!(prefs.get(keys::LOCATION_PERMISSION), Some(json!("granted")));
    }
}
