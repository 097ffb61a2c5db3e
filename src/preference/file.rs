//! JSON file preference store.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{OverlayIdentity, Preference, PreferenceResult, PreferenceStore};

/// Stores every overlay's preference in one JSON object keyed by identity.
///
/// The file is read once on open and rewritten in full on each change.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
    entries: BTreeMap<OverlayIdentity, Preference>,
}

impl FilePreferenceStore {
    /// Opens the store at `path`. A missing file is an empty store; a file
    /// that exists but cannot be parsed is an error.
    pub fn open(path: impl Into<PathBuf>) -> PreferenceResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let json = fs::read_to_string(&path)?;
            if json.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&json)?
            }
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), count = entries.len(), "opened preference store");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> PreferenceResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get_preference(&self, identity: &OverlayIdentity) -> Option<Preference> {
        self.entries.get(identity).copied()
    }

    fn set_preference(
        &mut self,
        identity: &OverlayIdentity,
        preference: Preference,
    ) -> PreferenceResult<()> {
        self.entries.insert(identity.clone(), preference);
        self.flush()
    }

    fn clear_preference(&mut self, identity: &OverlayIdentity) -> PreferenceResult<()> {
        if self.entries.remove(identity).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::ManualOffset;
    use crate::preference::{PreferenceError, StoredPosition};

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePreferenceStore::open(dir.path().join("prefs.json")).unwrap();
        assert!(
            store
                .get_preference(&OverlayIdentity::property_pane())
                .is_none()
        );
    }

    #[test]
    fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        let id = OverlayIdentity::property_pane();
        {
            let mut store = FilePreferenceStore::open(&path).unwrap();
            store
                .set_preference(&id, Preference::moved(ManualOffset::new(200, 80)))
                .unwrap();
        }
        let reopened = FilePreferenceStore::open(&path).unwrap();
        assert_eq!(
            reopened.stored_position(&id),
            StoredPosition::Moved(ManualOffset::new(200, 80))
        );
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"isMoved\": true"));
    }

    #[test]
    fn corrupt_file_reports_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{not json").unwrap();
        let err = FilePreferenceStore::open(&path).unwrap_err();
        assert!(matches!(err, PreferenceError::Serialization(_)));
    }

    #[test]
    fn clear_removes_entry_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let id = OverlayIdentity::new("pane");
        let mut store = FilePreferenceStore::open(&path).unwrap();
        store
            .set_preference(&id, Preference::moved(ManualOffset::new(1, 2)))
            .unwrap();
        store.clear_preference(&id).unwrap();
        let reopened = FilePreferenceStore::open(&path).unwrap();
        assert!(reopened.get_preference(&id).is_none());
    }
}
