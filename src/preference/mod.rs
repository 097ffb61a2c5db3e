//! Persisted "was this overlay moved, and where to" preferences.

mod file;
mod memory;

pub use file::FilePreferenceStore;
pub use memory::MemoryPreferenceStore;

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::constants::PROPERTY_PANE_IDENTITY;
use crate::overlay::ManualOffset;

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Preference store unavailable: {0}")]
    Unavailable(String),
}

pub type PreferenceResult<T> = Result<T, PreferenceError>;

/// Names the overlay a preference belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayIdentity(String);

impl OverlayIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn property_pane() -> Self {
        Self::new(PROPERTY_PANE_IDENTITY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OverlayIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored record. Both fields may be missing in data written by older
/// builds, so neither is trusted on its own; see [`StoredPosition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    #[serde(default)]
    pub is_moved: bool,
    #[serde(default)]
    pub position: Option<ManualOffset>,
}

impl Preference {
    pub fn moved(position: ManualOffset) -> Self {
        Self {
            is_moved: true,
            position: Some(position),
        }
    }
}

/// What a stored preference means for the next activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoredPosition {
    /// No usable override; placement follows the anchor.
    #[default]
    Anchored,
    /// The user moved the overlay here last time.
    Moved(ManualOffset),
}

impl StoredPosition {
    pub fn from_preference(preference: Option<&Preference>) -> Self {
        match preference {
            Some(Preference {
                is_moved: true,
                position: Some(position),
            }) => Self::Moved(*position),
            Some(Preference {
                is_moved: true,
                position: None,
            }) => {
                debug!("ignoring moved preference without a position");
                Self::Anchored
            }
            Some(Preference {
                is_moved: false, ..
            })
            | None => Self::Anchored,
        }
    }

    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved(_))
    }

    pub fn offset(&self) -> Option<ManualOffset> {
        match self {
            Self::Moved(offset) => Some(*offset),
            Self::Anchored => None,
        }
    }
}

/// Backend for overlay preferences.
pub trait PreferenceStore {
    fn get_preference(&self, identity: &OverlayIdentity) -> Option<Preference>;

    fn set_preference(
        &mut self,
        identity: &OverlayIdentity,
        preference: Preference,
    ) -> PreferenceResult<()>;

    fn clear_preference(&mut self, identity: &OverlayIdentity) -> PreferenceResult<()>;

    fn stored_position(&self, identity: &OverlayIdentity) -> StoredPosition {
        StoredPosition::from_preference(self.get_preference(identity).as_ref())
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for &mut T {
    fn get_preference(&self, identity: &OverlayIdentity) -> Option<Preference> {
        (**self).get_preference(identity)
    }

    fn set_preference(
        &mut self,
        identity: &OverlayIdentity,
        preference: Preference,
    ) -> PreferenceResult<()> {
        (**self).set_preference(identity, preference)
    }

    fn clear_preference(&mut self, identity: &OverlayIdentity) -> PreferenceResult<()> {
        (**self).clear_preference(identity)
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Box<T> {
    fn get_preference(&self, identity: &OverlayIdentity) -> Option<Preference> {
        (**self).get_preference(identity)
    }

    fn set_preference(
        &mut self,
        identity: &OverlayIdentity,
        preference: Preference,
    ) -> PreferenceResult<()> {
        (**self).set_preference(identity, preference)
    }

    fn clear_preference(&mut self, identity: &OverlayIdentity) -> PreferenceResult<()> {
        (**self).clear_preference(identity)
    }
}
