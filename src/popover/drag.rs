use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tracing::trace;

use crate::constants::MIN_VISIBLE_MARGIN;
use crate::overlay::{FloatRect, ManualOffset, OverlayNode};

/// Pointer samples for one press-move-release gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub start_column: u16,
    pub start_row: u16,
    pub last_column: u16,
    pub last_row: u16,
    /// Where the overlay's bounding box started.
    pub origin: ManualOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// The event was not for this tracker.
    Ignored,
    /// A press on the overlay opened a session.
    Started(ManualOffset),
    Moved,
    /// The release position of the overlay's top-left corner.
    Finished(ManualOffset),
    /// The release arrived after the overlay left the screen.
    Abandoned,
}

impl DragOutcome {
    /// Whether the event must not reach anything else (no text selection,
    /// no click-through to the canvas underneath).
    pub fn consumed(&self) -> bool {
        !matches!(self, DragOutcome::Ignored)
    }
}

/// Turns a press-move-release gesture on an overlay into position updates.
///
/// Presses only count inside the overlay, but once a session is open every
/// move and release is accepted wherever the pointer is, so the gesture
/// survives the pointer outrunning the panel.
#[derive(Debug, Clone, Default)]
pub struct PointerDragTracker {
    state: DragState,
    pending_seed: Option<ManualOffset>,
    bounds: Option<Rect>,
    listening: bool,
}

impl PointerDragTracker {
    /// Starts listening. A `seed` is applied after the next layout pass so
    /// that dragging resumes from the remembered position.
    pub fn new(seed: Option<ManualOffset>) -> Self {
        Self {
            state: DragState::Idle,
            pending_seed: seed,
            bounds: None,
            listening: true,
        }
    }

    /// Keeps part of the overlay inside `bounds` while dragging.
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = Some(bounds);
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn session(&self) -> Option<DragSession> {
        match self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session().is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn pending_seed(&self) -> Option<ManualOffset> {
        self.pending_seed
    }

    /// Applies the remembered position once the node has been laid out.
    /// Returns `true` when the seed was consumed.
    pub fn on_layout(&mut self, node: &mut OverlayNode) -> bool {
        if !self.listening || !node.is_attached() {
            return false;
        }
        let Some(seed) = self.pending_seed.take() else {
            return false;
        };
        let rect = node.bounding_rect();
        if rect.top_left() != seed {
            node.set_top(node.offset_top() + (seed.y - rect.y));
            node.set_left(node.offset_left() + (seed.x - rect.x));
        }
        trace!(x = seed.x, y = seed.y, "seeded overlay position");
        true
    }

    pub fn handle_mouse(&mut self, mouse: &MouseEvent, node: &mut OverlayNode) -> DragOutcome {
        if !self.listening {
            return DragOutcome::Ignored;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.press(mouse, node),
            MouseEventKind::Drag(_) | MouseEventKind::Moved => self.motion(mouse, node),
            MouseEventKind::Up(MouseButton::Left) => self.release(node),
            _ => DragOutcome::Ignored,
        }
    }

    /// Stops listening and drops any open session without reporting it.
    pub fn detach(&mut self) -> Option<DragSession> {
        self.listening = false;
        self.pending_seed = None;
        let session = self.session();
        self.state = DragState::Idle;
        session
    }

    fn press(&mut self, mouse: &MouseEvent, node: &OverlayNode) -> DragOutcome {
        if self.is_dragging() || !node.is_attached() {
            return DragOutcome::Ignored;
        }
        let rect = node.bounding_rect();
        if !rect.contains(mouse.column as i32, mouse.row as i32) {
            return DragOutcome::Ignored;
        }
        let origin = rect.top_left();
        // The user has taken over; a seed still waiting for layout is stale.
        self.pending_seed = None;
        self.state = DragState::Dragging(DragSession {
            start_column: mouse.column,
            start_row: mouse.row,
            last_column: mouse.column,
            last_row: mouse.row,
            origin,
        });
        DragOutcome::Started(origin)
    }

    fn motion(&mut self, mouse: &MouseEvent, node: &mut OverlayNode) -> DragOutcome {
        let DragState::Dragging(mut session) = self.state else {
            return DragOutcome::Ignored;
        };
        if !node.is_attached() {
            return DragOutcome::Ignored;
        }
        let dx = mouse.column as i32 - session.last_column as i32;
        let dy = mouse.row as i32 - session.last_row as i32;
        session.last_column = mouse.column;
        session.last_row = mouse.row;
        self.state = DragState::Dragging(session);
        if dx == 0 && dy == 0 {
            return DragOutcome::Moved;
        }

        let rect = node.bounding_rect();
        let mut target = FloatRect {
            x: rect.x + dx,
            y: rect.y + dy,
            ..rect
        };
        if let Some(bounds) = self.bounds {
            target = keep_visible(target, bounds);
        }
        node.set_top(node.offset_top() + (target.y - rect.y));
        node.set_left(node.offset_left() + (target.x - rect.x));
        DragOutcome::Moved
    }

    fn release(&mut self, node: &OverlayNode) -> DragOutcome {
        let DragState::Dragging(_) = self.state else {
            return DragOutcome::Ignored;
        };
        self.state = DragState::Idle;
        if !node.is_attached() {
            return DragOutcome::Abandoned;
        }
        DragOutcome::Finished(node.bounding_rect().top_left())
    }
}

/// Clamps `rect` so at least `MIN_VISIBLE_MARGIN` columns stay inside
/// `bounds` horizontally and its top row stays on screen.
pub fn keep_visible(rect: FloatRect, bounds: Rect) -> FloatRect {
    let margin = MIN_VISIBLE_MARGIN.min(rect.width) as i32;
    let bounds_left = bounds.x as i32;
    let bounds_top = bounds.y as i32;
    let bounds_right = bounds_left + bounds.width as i32;
    let bounds_bottom = bounds_top + bounds.height as i32;

    let min_x = bounds_left - (rect.width as i32 - margin);
    let max_x = (bounds_right - margin).max(min_x);
    let max_y = (bounds_bottom - 1).max(bounds_top);
    FloatRect {
        x: rect.x.clamp(min_x, max_x),
        y: rect.y.clamp(bounds_top, max_y),
        ..rect
    }
}
