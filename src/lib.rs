//! Anchored popover panels for terminal editors.
//!
//! A popover is normally positioned next to its anchor by a
//! [`placement::PlacementEngine`]. In manual mode the user can drag it away,
//! and the spot it was dropped at is remembered through a
//! [`preference::PreferenceStore`] and restored the next time it opens.
//! [`popover::OverlayPositionController`] decides which of those sources
//! owns the position at any moment.

pub mod anchor;
pub mod constants;
pub mod drivers;
pub mod event_loop;
pub mod overlay;
pub mod placement;
pub mod popover;
pub mod preference;
pub mod tracing_sub;
pub mod ui;
