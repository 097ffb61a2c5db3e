use crossterm::event::Event;
use ratatui::layout::Rect;
use tracing::{debug, warn};

use super::drag::{DragOutcome, DragSession, PointerDragTracker};
use crate::anchor::Anchor;
use crate::overlay::{ManualOffset, OverlayNode};
use crate::placement::{
    ModifierOverrides, Modifiers, OnCreate, Placement, PlacementEngine, PlacementHandle,
    PlacementOptions,
};
use crate::preference::{OverlayIdentity, Preference, PreferenceStore, StoredPosition};

/// Which source currently decides where the overlay is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// Not activated; nothing positions the overlay.
    Inactive,
    /// The placement engine follows the anchor.
    Placement,
    /// The overlay is pinned at a manual offset.
    Manual(ManualOffset),
    /// A drag is moving the overlay.
    Dragging(DragSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The anchor was missing or unusable; nothing was touched.
    Skipped,
    Automatic,
    Manual { seeded: Option<ManualOffset> },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivationOptions {
    /// Enables dragging and persistence of the overlay position.
    pub manual_mode: bool,
    pub modifiers: ModifierOverrides,
    pub viewport: Rect,
}

/// Reconciles placement, stored preferences and drags for one overlay.
///
/// The controller never holds on to the overlay: the rendering layer lends
/// it for each call. `activate` and `deactivate` are expected to alternate;
/// an extra `activate` tears the previous activation down first.
pub struct OverlayPositionController<E: PlacementEngine, S: PreferenceStore> {
    identity: OverlayIdentity,
    engine: E,
    store: S,
    handle: Option<E::Handle>,
    tracker: Option<PointerDragTracker>,
    // Set exactly when the placement handle is no longer auto-updating.
    manual: Option<ManualOffset>,
}

impl<E: PlacementEngine, S: PreferenceStore> OverlayPositionController<E, S> {
    pub fn new(identity: OverlayIdentity, engine: E, store: S) -> Self {
        Self {
            identity,
            engine,
            store,
            handle: None,
            tracker: None,
            manual: None,
        }
    }

    pub fn identity(&self) -> &OverlayIdentity {
        &self.identity
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn handle(&self) -> Option<&E::Handle> {
        self.handle.as_ref()
    }

    pub fn tracker(&self) -> Option<&PointerDragTracker> {
        self.tracker.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Reads the stored preference for this overlay.
    pub fn stored_position(&self) -> StoredPosition {
        self.store.stored_position(&self.identity)
    }

    pub fn authority(&self) -> Authority {
        if self.handle.is_none() {
            return Authority::Inactive;
        }
        if let Some(session) = self.tracker.as_ref().and_then(|t| t.session()) {
            return Authority::Dragging(session);
        }
        match self.manual {
            Some(offset) => Authority::Manual(offset),
            None => Authority::Placement,
        }
    }

    pub fn activate(
        &mut self,
        anchor: Option<&Anchor>,
        overlay: &mut OverlayNode,
        placement: Placement,
        options: &ActivationOptions,
        stored: StoredPosition,
    ) -> Activation {
        if self.is_active() {
            debug!(identity = %self.identity, "activate while active; rebuilding");
            self.deactivate();
        }
        let Some(anchor) = anchor.filter(|anchor| anchor.is_positionable()) else {
            debug!(identity = %self.identity, "no usable anchor; skipping activation");
            return Activation::Skipped;
        };
        if !overlay.is_attached() {
            debug!(identity = %self.identity, "overlay not mounted; skipping activation");
            return Activation::Skipped;
        }

        let pinned = if options.manual_mode {
            stored.offset()
        } else {
            None
        };
        let on_create = pinned.map(|offset| -> OnCreate {
            Box::new(move |node: &mut OverlayNode| node.place_at(offset))
        });
        let mut handle = self.engine.create(
            anchor,
            overlay,
            PlacementOptions {
                placement: if pinned.is_some() {
                    None
                } else {
                    Some(placement)
                },
                modifiers: Modifiers::default().merged(&options.modifiers),
                viewport: options.viewport,
                on_create,
            },
        );
        if pinned.is_some() {
            handle.disable_auto_updates();
        }
        self.handle = Some(handle);
        self.manual = pinned;

        if !options.manual_mode {
            debug!(identity = %self.identity, %placement, "activated with automatic placement");
            return Activation::Automatic;
        }
        self.tracker = Some(PointerDragTracker::new(pinned).with_bounds(options.viewport));
        debug!(identity = %self.identity, ?pinned, "activated in manual mode");
        Activation::Manual { seeded: pinned }
    }

    /// Tears down the placement handle and pointer tracking. An open drag is
    /// dropped without being persisted. Returns `false` if there was nothing
    /// to tear down.
    pub fn deactivate(&mut self) -> bool {
        let mut torn_down = false;
        if let Some(mut handle) = self.handle.take() {
            handle.destroy();
            torn_down = true;
        }
        if let Some(mut tracker) = self.tracker.take() {
            if let Some(session) = tracker.detach() {
                debug!(identity = %self.identity, ?session, "discarding unfinished drag");
            }
            torn_down = true;
        }
        self.manual = None;
        if torn_down {
            debug!(identity = %self.identity, "deactivated");
        }
        torn_down
    }

    /// Lets the placement engine react to anchor or viewport changes.
    /// Returns `true` if the overlay moved.
    pub fn reflow(
        &mut self,
        anchor: Option<&Anchor>,
        viewport: Rect,
        overlay: &mut OverlayNode,
    ) -> bool {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.set_bounds(viewport);
        }
        let Some(anchor) = anchor.filter(|anchor| anchor.is_positionable()) else {
            return false;
        };
        if !overlay.is_attached() {
            return false;
        }
        match self.handle.as_mut() {
            Some(handle) => handle.update(anchor, viewport, overlay),
            None => false,
        }
    }

    /// Runs work deferred until the overlay has been laid out once.
    pub fn on_layout(&mut self, overlay: &mut OverlayNode) -> bool {
        match self.tracker.as_mut() {
            Some(tracker) => tracker.on_layout(overlay),
            None => false,
        }
    }

    /// Feeds an input event to the drag tracker. Returns `true` if the event
    /// was consumed.
    pub fn handle_event(&mut self, event: &Event, overlay: &mut OverlayNode) -> bool {
        let Event::Mouse(mouse) = event else {
            return false;
        };
        let Some(tracker) = self.tracker.as_mut() else {
            return false;
        };
        let outcome = tracker.handle_mouse(mouse, overlay);
        match outcome {
            DragOutcome::Ignored | DragOutcome::Moved => {}
            DragOutcome::Started(origin) => {
                // The drag owns the position from here on.
                if let Some(handle) = self.handle.as_mut() {
                    handle.disable_auto_updates();
                }
                self.manual.get_or_insert(origin);
            }
            DragOutcome::Finished(offset) => {
                self.manual = Some(offset);
                self.persist(offset);
            }
            DragOutcome::Abandoned => {
                debug!(identity = %self.identity, "drag released on unmounted overlay");
            }
        }
        outcome.consumed()
    }

    fn persist(&mut self, offset: ManualOffset) {
        match self
            .store
            .set_preference(&self.identity, Preference::moved(offset))
        {
            Ok(()) => debug!(
                identity = %self.identity,
                x = offset.x,
                y = offset.y,
                "persisted overlay position"
            ),
            Err(err) => warn!(
                identity = %self.identity,
                error = %err,
                "failed to persist overlay position"
            ),
        }
    }
}

impl<E: PlacementEngine, S: PreferenceStore> Drop for OverlayPositionController<E, S> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorId;
    use crate::overlay::FloatRect;
    use crate::placement::AnchoredPlacementEngine;
    use crate::preference::MemoryPreferenceStore;
    use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

    type Controller = OverlayPositionController<AnchoredPlacementEngine, MemoryPreferenceStore>;

    fn controller() -> Controller {
        OverlayPositionController::new(
            OverlayIdentity::property_pane(),
            AnchoredPlacementEngine::default(),
            MemoryPreferenceStore::new(),
        )
    }

    fn anchor() -> Anchor {
        Anchor::new(AnchorId(7), FloatRect::new(20, 10, 10, 2))
    }

    fn options(manual_mode: bool) -> ActivationOptions {
        ActivationOptions {
            manual_mode,
            viewport: Rect::new(0, 0, 400, 300),
            ..ActivationOptions::default()
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn press(column: u16, row: u16) -> Event {
        mouse(MouseEventKind::Down(MouseButton::Left), column, row)
    }

    fn drag_to(column: u16, row: u16) -> Event {
        mouse(MouseEventKind::Drag(MouseButton::Left), column, row)
    }

    fn release(column: u16, row: u16) -> Event {
        mouse(MouseEventKind::Up(MouseButton::Left), column, row)
    }

    fn placement() -> Placement {
        "bottom-start".parse().unwrap()
    }

    #[test]
    fn automatic_activation_follows_anchor() {
        let mut ctl = controller();
        let mut node = OverlayNode::new(30, 8);
        let mut anchor = anchor();
        let result = ctl.activate(
            Some(&anchor),
            &mut node,
            placement(),
            &options(false),
            StoredPosition::Anchored,
        );
        assert_eq!(result, Activation::Automatic);
        assert_eq!(ctl.authority(), Authority::Placement);
        assert!(ctl.tracker().is_none());
        assert_eq!(node.bounding_rect().top_left(), ManualOffset::new(20, 12));

        anchor.rect.y = 30;
        assert!(ctl.reflow(Some(&anchor), Rect::new(0, 0, 400, 300), &mut node));
        assert_eq!(node.bounding_rect().y, 32);
    }

    #[test]
    fn stored_position_is_ignored_without_manual_mode() {
        let mut ctl = controller();
        let mut node = OverlayNode::new(30, 8);
        ctl.activate(
            Some(&anchor()),
            &mut node,
            placement(),
            &options(false),
            StoredPosition::Moved(ManualOffset::new(200, 80)),
        );
        assert_eq!(ctl.authority(), Authority::Placement);
        assert_eq!(node.bounding_rect().top_left(), ManualOffset::new(20, 12));
    }

    #[test]
    fn pinned_activation_disables_auto_updates() {
        let mut ctl = controller();
        let mut node = OverlayNode::new(30, 8);
        let stored = StoredPosition::Moved(ManualOffset::new(200, 80));
        let result = ctl.activate(
            Some(&anchor()),
            &mut node,
            placement(),
            &options(true),
            stored,
        );
        assert_eq!(
            result,
            Activation::Manual {
                seeded: Some(ManualOffset::new(200, 80))
            }
        );
        assert_eq!(ctl.authority(), Authority::Manual(ManualOffset::new(200, 80)));
        assert!(!ctl.handle().unwrap().is_auto_updating());

        let mut moved_anchor = anchor();
        moved_anchor.rect.x = 90;
        assert!(!ctl.reflow(Some(&moved_anchor), Rect::new(0, 0, 400, 300), &mut node));
        assert_eq!(node.bounding_rect().top_left(), ManualOffset::new(200, 80));
    }

    #[test]
    fn drag_start_takes_over_from_placement() {
        let mut ctl = controller();
        let mut node = OverlayNode::new(30, 8);
        ctl.activate(
            Some(&anchor()),
            &mut node,
            placement(),
            &options(true),
            StoredPosition::Anchored,
        );
        assert_eq!(ctl.authority(), Authority::Placement);
        assert!(ctl.handle_event(&press(21, 13), &mut node));
        assert!(matches!(ctl.authority(), Authority::Dragging(_)));
        assert!(!ctl.handle().unwrap().is_auto_updating());

        ctl.handle_event(&drag_to(25, 15), &mut node);
        ctl.handle_event(&release(25, 15), &mut node);
        assert_eq!(ctl.authority(), Authority::Manual(ManualOffset::new(24, 14)));
        assert_eq!(
            ctl.stored_position(),
            StoredPosition::Moved(ManualOffset::new(24, 14))
        );
        assert_eq!(ctl.store().writes(), 1);
    }

    #[test]
    fn persistence_failure_keeps_visual_result() {
        let mut ctl = controller();
        ctl.store_mut().set_unavailable(true);
        let mut node = OverlayNode::new(30, 8);
        ctl.activate(
            Some(&anchor()),
            &mut node,
            placement(),
            &options(true),
            StoredPosition::Anchored,
        );
        ctl.handle_event(&press(21, 13), &mut node);
        ctl.handle_event(&drag_to(31, 13), &mut node);
        assert!(ctl.handle_event(&release(31, 13), &mut node));
        assert_eq!(node.bounding_rect().top_left(), ManualOffset::new(30, 12));
        assert_eq!(ctl.authority(), Authority::Manual(ManualOffset::new(30, 12)));
        assert_eq!(ctl.stored_position(), StoredPosition::Anchored);
    }

    #[test]
    fn non_mouse_events_pass_through() {
        let mut ctl = controller();
        let mut node = OverlayNode::new(30, 8);
        ctl.activate(
            Some(&anchor()),
            &mut node,
            placement(),
            &options(true),
            StoredPosition::Anchored,
        );
        assert!(!ctl.handle_event(&Event::FocusGained, &mut node));
        // Presses elsewhere belong to the canvas underneath.
        assert!(!ctl.handle_event(&press(0, 0), &mut node));
    }

    #[test]
    fn deactivate_is_idempotent() {
        let mut ctl = controller();
        let mut node = OverlayNode::new(30, 8);
        assert!(!ctl.deactivate());
        ctl.activate(
            Some(&anchor()),
            &mut node,
            placement(),
            &options(true),
            StoredPosition::Anchored,
        );
        assert!(ctl.deactivate());
        assert!(!ctl.deactivate());
        assert_eq!(ctl.authority(), Authority::Inactive);
        assert!(!ctl.on_layout(&mut node));
    }

    #[test]
    fn repeated_activate_rebuilds_cleanly() {
        let mut ctl = controller();
        let mut node = OverlayNode::new(30, 8);
        ctl.activate(
            Some(&anchor()),
            &mut node,
            placement(),
            &options(true),
            StoredPosition::Anchored,
        );
        ctl.handle_event(&press(21, 13), &mut node);
        ctl.activate(
            Some(&anchor()),
            &mut node,
            placement(),
            &options(true),
            StoredPosition::Anchored,
        );
        assert_eq!(ctl.authority(), Authority::Placement);
        assert_eq!(ctl.store().writes(), 0);
    }
}
