//! Persisted alert state
//!
//! The state file records, per service slug, when the last alert was sent:
//!
//! ```json
//! { "lastSent": { "whatsapp": "2024-05-01T10:00:00.000Z" } }
//! ```
//!
//! Loading never fails: an absent or corrupt file yields empty state. Saving
//! replaces the file atomically and propagates any I/O error.

use crate::error::StateError;
use crate::series::{format_timestamp, Timestamp};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Last-alert timestamps keyed by service slug
///
/// A slug is present only once an alert has been sent for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertState {
    #[serde(default)]
    pub last_sent: BTreeMap<String, String>,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load state from `path`, falling back to empty state
    pub fn load(path: &Path) -> Self {
        load_or(path, Self::default())
    }

    /// Persist state to `path`
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        save(path, self)
    }

    /// When the last alert for `slug` was sent
    ///
    /// A stored value that is not a valid RFC 3339 timestamp is treated as
    /// absent so that the service is not blocked forever.
    pub fn last_sent_at(&self, slug: &str) -> Option<Timestamp> {
        let raw = self.last_sent.get(slug)?;
        match DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(e) => {
                warn!(
                    "[{}] ignoring unparsable lastSent timestamp '{}': {}",
                    slug, raw, e
                );
                None
            }
        }
    }

    /// Record that an alert for `slug` was sent at `at`
    pub fn record_sent(&mut self, slug: &str, at: &Timestamp) {
        self.last_sent.insert(slug.to_string(), format_timestamp(at));
    }
}

/// Read and parse a JSON document, returning `fallback` on any failure
pub fn load_or<T: DeserializeOwned>(path: &Path, fallback: T) -> T {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!("No readable file at {} ({}), using default", path.display(), e);
            return fallback;
        }
    };

    match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                "Could not parse {} ({}), using default",
                path.display(),
                e
            );
            fallback
        }
    }
}

/// Serialize `value` as pretty JSON and atomically replace the file at `path`
///
/// The document is written to a temporary file in the same directory and then
/// renamed over the target.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), StateError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.write_all(b"\n")?;
    file.flush()?;

    file.persist(path)
        .map_err(|e| StateError::PersistError(format!("{}: {}", path.display(), e.error)))?;

    debug!("Saved state to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = TempDir::new().unwrap();
        let state = AlertState::load(&dir.path().join("state.json"));
        assert_eq!(state, AlertState::default());
    }

    #[test]
    fn test_load_corrupt_file_returns_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let state = AlertState::load(&path);
        assert!(state.last_sent.is_empty());
    }

    #[test]
    fn test_load_or_returns_given_fallback() {
        let dir = TempDir::new().unwrap();
        let mut fallback = AlertState::new();
        fallback
            .last_sent
            .insert("x".to_string(), "2024-01-01T00:00:00.000Z".to_string());

        let loaded = load_or(&dir.path().join("missing.json"), fallback.clone());
        assert_eq!(loaded, fallback);
    }

    #[test]
    fn test_load_document_without_last_sent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{}").unwrap();

        let state = AlertState::load(&path);
        assert!(state.last_sent.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

        let mut state = AlertState::new();
        state.record_sent("whatsapp", &at);
        state.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"lastSent\""));
        assert!(raw.contains("\"whatsapp\": \"2024-05-01T10:00:00.000Z\""));

        let loaded = AlertState::load(&path);
        assert_eq!(loaded.last_sent_at("whatsapp"), Some(at));
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "garbage").unwrap();

        AlertState::new().save(&path).unwrap();

        let loaded: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, serde_json::json!({ "lastSent": {} }));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-such-dir").join("state.json");

        let result = AlertState::new().save(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_unparsable_timestamp_treated_as_absent() {
        let mut state = AlertState::new();
        state
            .last_sent
            .insert("x".to_string(), "yesterday-ish".to_string());

        assert_eq!(state.last_sent_at("x"), None);
        assert_eq!(state.last_sent_at("unknown"), None);
    }

    #[test]
    fn test_accepts_offset_timestamps() {
        let mut state = AlertState::new();
        state
            .last_sent
            .insert("x".to_string(), "2024-05-01T12:00:00+02:00".to_string());

        assert_eq!(
            state.last_sent_at("x"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
    }
}
