//! Popover positioning: which authority places the overlay, and how a drag
//! takes over from the placement engine.
pub mod controller;
pub mod drag;
pub mod lifecycle;

pub use controller::{Activation, ActivationOptions, Authority, OverlayPositionController};
pub use drag::{DragOutcome, DragSession, DragState, PointerDragTracker};
pub use lifecycle::{Popover, PopoverProps};
