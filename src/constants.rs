//! Shared crate-wide constants.

/// Minimum number of cells a dragged popover must keep within the viewport
/// so the user can grab it again.
pub const MIN_VISIBLE_MARGIN: u16 = 4;

/// Number of ancestor levels an anchor needs before it can be used for
/// positioning.
///
/// Anchors that hang directly off the screen root have no stable
/// coordinate space of their own (the editor re-parents them while
/// rebuilding), so positioning against them is skipped until they are
/// mounted under at least two containers.
pub const MIN_ANCHOR_DEPTH: u8 = 2;

/// Identity used for the editor's property pane preference.
pub const PROPERTY_PANE_IDENTITY: &str = "property_pane";

/// Poll interval for the demo event loop, roughly one frame at 60Hz.
pub const FRAME_POLL_MS: u64 = 16;
