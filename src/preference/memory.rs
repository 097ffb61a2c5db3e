//! In-memory preference store.

use std::collections::HashMap;

use super::{OverlayIdentity, Preference, PreferenceError, PreferenceResult, PreferenceStore};

/// Keeps preferences for the lifetime of the process.
///
/// Useful as a fallback when the on-disk store cannot be opened, and in
/// tests, where `set_unavailable` simulates a store that rejects writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    entries: HashMap<OverlayIdentity, Preference>,
    unavailable: bool,
    writes: usize,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preference(mut self, identity: OverlayIdentity, preference: Preference) -> Self {
        self.entries.insert(identity, preference);
        self
    }

    /// Makes every subsequent write fail.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Number of accepted or attempted writes.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_preference(&self, identity: &OverlayIdentity) -> Option<Preference> {
        self.entries.get(identity).copied()
    }

    fn set_preference(
        &mut self,
        identity: &OverlayIdentity,
        preference: Preference,
    ) -> PreferenceResult<()> {
        self.writes += 1;
        if self.unavailable {
            return Err(PreferenceError::Unavailable(format!(
                "write to `{identity}` rejected"
            )));
        }
        self.entries.insert(identity.clone(), preference);
        Ok(())
    }

    fn clear_preference(&mut self, identity: &OverlayIdentity) -> PreferenceResult<()> {
        if self.unavailable {
            return Err(PreferenceError::Unavailable(format!(
                "clear of `{identity}` rejected"
            )));
        }
        self.entries.remove(identity);
        Ok(())
    }
}
