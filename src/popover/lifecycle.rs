use crossterm::event::Event;
use ratatui::layout::Rect;
use tracing::debug;

use super::controller::{Activation, ActivationOptions, Authority, OverlayPositionController};
use crate::anchor::{Anchor, AnchorId};
use crate::overlay::OverlayNode;
use crate::placement::{ModifierOverrides, Placement, PlacementEngine};
use crate::preference::{OverlayIdentity, PreferenceStore, StoredPosition};

/// What the rendering layer wants from a popover this frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopoverProps {
    pub is_open: bool,
    pub anchor: Option<Anchor>,
    pub placement: Placement,
    pub modifiers: ModifierOverrides,
    /// Stacking order; only consulted when drawing.
    pub z_index: i32,
    pub manual_mode: bool,
}

/// Inputs whose change forces a full rebuild of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ActivationKey {
    anchor: Option<AnchorId>,
    is_open: bool,
    placement: Placement,
    modifiers: ModifierOverrides,
    manual_mode: bool,
    stored_moved: bool,
}

impl ActivationKey {
    fn new(props: &PopoverProps, stored: StoredPosition) -> Self {
        Self {
            anchor: props
                .anchor
                .filter(|anchor| anchor.is_positionable())
                .map(|anchor| anchor.id),
            is_open: props.is_open,
            placement: props.placement,
            modifiers: props.modifiers.clone(),
            manual_mode: props.manual_mode,
            stored_moved: stored.is_moved(),
        }
    }
}

/// Binds an [`OverlayPositionController`] to the props of one popover.
///
/// Call [`Popover::sync`] before drawing, [`Popover::on_layout`] right after
/// drawing, and route input through [`Popover::handle_event`]. Any change to
/// the anchor, open state, placement, modifiers, manual mode or stored
/// moved-flag tears the controller down and activates it again; other
/// frames only let the placement engine follow the anchor.
pub struct Popover<E: PlacementEngine, S: PreferenceStore> {
    controller: OverlayPositionController<E, S>,
    key: Option<ActivationKey>,
    z_index: i32,
    last_activation: Option<Activation>,
}

impl<E: PlacementEngine, S: PreferenceStore> Popover<E, S> {
    pub fn new(identity: OverlayIdentity, engine: E, store: S) -> Self {
        Self {
            controller: OverlayPositionController::new(identity, engine, store),
            key: None,
            z_index: 0,
            last_activation: None,
        }
    }

    pub fn controller(&self) -> &OverlayPositionController<E, S> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut OverlayPositionController<E, S> {
        &mut self.controller
    }

    pub fn authority(&self) -> Authority {
        self.controller.authority()
    }

    /// Whether the overlay should be drawn.
    pub fn is_visible(&self) -> bool {
        self.controller.is_active()
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn last_activation(&self) -> Option<Activation> {
        self.last_activation
    }

    /// Reconciles the controller with `props`. Returns `true` when the
    /// controller was rebuilt.
    pub fn sync(
        &mut self,
        props: &PopoverProps,
        viewport: Rect,
        overlay: &mut OverlayNode,
    ) -> bool {
        self.z_index = props.z_index;
        let stored = if props.manual_mode {
            self.controller.stored_position()
        } else {
            StoredPosition::Anchored
        };
        let key = ActivationKey::new(props, stored);
        if self.key.as_ref() == Some(&key) {
            self.controller.reflow(props.anchor.as_ref(), viewport, overlay);
            return false;
        }

        debug!(identity = %self.controller.identity(), ?key, "popover inputs changed");
        self.controller.deactivate();
        self.last_activation = None;
        if key.is_open {
            let options = ActivationOptions {
                manual_mode: props.manual_mode,
                modifiers: props.modifiers.clone(),
                viewport,
            };
            self.last_activation = Some(self.controller.activate(
                props.anchor.as_ref(),
                overlay,
                props.placement,
                &options,
                stored,
            ));
        }
        self.key = Some(key);
        true
    }

    pub fn on_layout(&mut self, overlay: &mut OverlayNode) -> bool {
        self.controller.on_layout(overlay)
    }

    pub fn handle_event(&mut self, event: &Event, overlay: &mut OverlayNode) -> bool {
        self.controller.handle_event(event, overlay)
    }

    /// Unmounts the popover. The next `sync` activates from scratch.
    pub fn close(&mut self) {
        self.controller.deactivate();
        self.key = None;
        self.last_activation = None;
    }
}
