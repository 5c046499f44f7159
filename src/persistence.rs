//! Draft persistence.
//!
//! Saves in-progress work so a citizen can resume across sessions. The
//! persisted document is a single JSON object holding the form data, the
//! current step, and the selected language. Every write is a full overwrite
//! of that snapshot; a missing or unreadable document is simply "no saved
//! draft" and is never surfaced as a user-visible error.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::{FieldValue, Language};

/// Errors raised by a storage write. Reads never error; they fall back to
/// "no saved draft".
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode draft: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The persisted snapshot, exactly the on-disk JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDraft {
    /// Field id to value mapping.
    pub form_data: BTreeMap<String, FieldValue>,
    /// 1-based step the citizen was on.
    pub current_step: u8,
    /// Selected UI language.
    pub language: Language,
}

/// Durable local storage for one draft snapshot.
pub trait DraftStorage: Send + Sync {
    /// Load the saved snapshot. `None` when nothing is saved or the stored
    /// document cannot be read or parsed.
    fn load(&self) -> Option<SavedDraft>;

    /// Overwrite the saved snapshot.
    fn save(&self, draft: &SavedDraft) -> Result<(), StorageError>;

    /// Remove the saved snapshot, if any.
    fn clear(&self) -> Result<(), StorageError>;
}

/// File-backed storage: one JSON document under the user's data directory.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Create storage at the default location (`~/.supportflow/draft.json`).
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self { path: Self::default_path()? })
    }

    /// Create storage at a specific path (used by tests and the CLI's
    /// `--storage-path` override).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    fn default_path() -> anyhow::Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".supportflow").join("draft.json"))
    }

    /// The path this storage reads and writes.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl DraftStorage for JsonFileStorage {
    fn load(&self) -> Option<SavedDraft> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(saved) => Some(saved),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable saved draft");
                None
            }
        }
    }

    fn save(&self, draft: &SavedDraft) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(draft)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    saved: Mutex<Option<SavedDraft>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStorage for MemoryStorage {
    fn load(&self) -> Option<SavedDraft> {
        self.saved.lock().ok()?.clone()
    }

    fn save(&self, draft: &SavedDraft) -> Result<(), StorageError> {
        if let Ok(mut slot) = self.saved.lock() {
            *slot = Some(draft.clone());
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        if let Ok(mut slot) = self.saved.lock() {
            *slot = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SavedDraft {
        let mut form_data = BTreeMap::new();
        form_data.insert("name".to_string(), FieldValue::from("Amal"));
        form_data.insert("dependents".to_string(), FieldValue::Number(2.0));
        SavedDraft { form_data, current_step: 2, language: Language::Ar }
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::with_path(dir.path().join("draft.json"));

        assert!(storage.load().is_none());
        storage.save(&sample()).unwrap();
        assert_eq!(storage.load(), Some(sample()));

        storage.clear().unwrap();
        assert!(storage.load().is_none());
    }

    #[test]
    fn test_wire_format_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("formData").is_some());
        assert_eq!(json["currentStep"], 2);
        assert_eq!(json["language"], "ar");
    }

    #[test]
    fn test_truncated_json_reads_as_no_draft() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.json");
        fs::write(&path, r#"{"formData": {"name": "Am"#).unwrap();

        let storage = JsonFileStorage::with_path(path);
        assert!(storage.load().is_none());
    }

    #[test]
    fn test_json_missing_form_data_reads_as_no_draft() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.json");
        fs::write(&path, r#"{"currentStep": 2, "language": "en"}"#).unwrap();

        let storage = JsonFileStorage::with_path(path);
        assert!(storage.load().is_none());
    }

    #[test]
    fn test_clear_on_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::with_path(dir.path().join("never-written.json"));
        assert!(storage.clear().is_ok());
    }

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert!(storage.load().is_none());
        storage.save(&sample()).unwrap();
        assert_eq!(storage.load(), Some(sample()));
        storage.clear().unwrap();
        assert!(storage.load().is_none());
    }
}
