use ratatui::layout::Rect;
use tracing::trace;

use super::{Alignment, Boundary, Modifiers, Placement, Side};
use crate::anchor::Anchor;
use crate::overlay::{FloatRect, OverlayNode, Translate};

/// Hook run once, right after the initial placement and before the first
/// frame is drawn.
pub type OnCreate = Box<dyn FnOnce(&mut OverlayNode)>;

pub struct PlacementOptions {
    /// `None` lets the engine fall back to its default placement.
    pub placement: Option<Placement>,
    pub modifiers: Modifiers,
    pub viewport: Rect,
    pub on_create: Option<OnCreate>,
}

impl std::fmt::Debug for PlacementOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacementOptions")
            .field("placement", &self.placement)
            .field("modifiers", &self.modifiers)
            .field("viewport", &self.viewport)
            .field("on_create", &self.on_create.is_some())
            .finish()
    }
}

/// A live placement bound to one anchor/overlay pair.
pub trait PlacementHandle {
    /// Re-runs placement after the anchor or viewport changed. Returns
    /// `true` when the overlay was repositioned.
    fn update(&mut self, anchor: &Anchor, viewport: Rect, overlay: &mut OverlayNode) -> bool;
    fn disable_auto_updates(&mut self);
    fn destroy(&mut self);
    fn is_auto_updating(&self) -> bool;
    fn is_destroyed(&self) -> bool;
}

/// Computes anchor-relative positions for overlays.
pub trait PlacementEngine {
    type Handle: PlacementHandle;

    fn create(
        &mut self,
        anchor: &Anchor,
        overlay: &mut OverlayNode,
        options: PlacementOptions,
    ) -> Self::Handle;
}

impl<T: PlacementEngine + ?Sized> PlacementEngine for &mut T {
    type Handle = T::Handle;

    fn create(
        &mut self,
        anchor: &Anchor,
        overlay: &mut OverlayNode,
        options: PlacementOptions,
    ) -> Self::Handle {
        (**self).create(anchor, overlay, options)
    }
}

/// Default engine: places the overlay on a side of the anchor, flips to
/// another side on overflow and clamps it inside the boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchoredPlacementEngine {
    default_placement: Placement,
}

impl AnchoredPlacementEngine {
    pub fn new(default_placement: Placement) -> Self {
        Self { default_placement }
    }
}

impl PlacementEngine for AnchoredPlacementEngine {
    type Handle = AnchoredHandle;

    fn create(
        &mut self,
        anchor: &Anchor,
        overlay: &mut OverlayNode,
        options: PlacementOptions,
    ) -> Self::Handle {
        let mut handle = AnchoredHandle {
            placement: options.placement.unwrap_or(self.default_placement),
            modifiers: options.modifiers,
            applied: None,
            auto_update: true,
            destroyed: false,
        };
        handle.apply(anchor, options.viewport, overlay);
        if let Some(on_create) = options.on_create {
            on_create(overlay);
        }
        handle
    }
}

#[derive(Debug, Clone)]
pub struct AnchoredHandle {
    placement: Placement,
    modifiers: Modifiers,
    applied: Option<Placement>,
    auto_update: bool,
    destroyed: bool,
}

impl AnchoredHandle {
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Placement actually used for the last computation, after flipping.
    pub fn applied_placement(&self) -> Option<Placement> {
        self.applied
    }

    fn apply(&mut self, anchor: &Anchor, viewport: Rect, overlay: &mut OverlayNode) {
        let (width, height) = overlay.size();
        let (rect, used) = compute_placement(
            anchor.rect,
            width,
            height,
            self.placement,
            &self.modifiers,
            viewport,
        );
        let (origin_x, origin_y) = overlay.origin();
        // Position through the translation only so inline offsets stay free
        // for manual overrides.
        overlay.set_top(0);
        overlay.set_left(0);
        overlay.set_transform(Translate {
            x: rect.x - origin_x,
            y: rect.y - origin_y,
        });
        trace!(placement = %used, x = rect.x, y = rect.y, "placed overlay");
        self.applied = Some(used);
    }
}

impl PlacementHandle for AnchoredHandle {
    fn update(&mut self, anchor: &Anchor, viewport: Rect, overlay: &mut OverlayNode) -> bool {
        if self.destroyed || !self.auto_update {
            return false;
        }
        let before = overlay.bounding_rect();
        self.apply(anchor, viewport, overlay);
        overlay.bounding_rect() != before
    }

    fn disable_auto_updates(&mut self) {
        self.auto_update = false;
    }

    fn destroy(&mut self) {
        self.auto_update = false;
        self.destroyed = true;
    }

    fn is_auto_updating(&self) -> bool {
        self.auto_update && !self.destroyed
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Computes where an overlay of `width`×`height` lands for `placement`.
/// Returns the rect and the placement used after flipping.
pub fn compute_placement(
    anchor: FloatRect,
    width: u16,
    height: u16,
    placement: Placement,
    modifiers: &Modifiers,
    viewport: Rect,
) -> (FloatRect, Placement) {
    let boundary = match modifiers.boundary {
        Boundary::Viewport => FloatRect::from(viewport),
        Boundary::Rect(rect) => rect,
    };

    let mut used = placement;
    let mut rect = rect_for(anchor, width, height, placement);
    if modifiers.flip && !fits_main_axis(rect, placement.side, boundary) {
        if let Some(side) = modifiers
            .flip_order
            .iter()
            .copied()
            .filter(|side| *side != placement.side)
            .find(|side| {
                let candidate = rect_for(anchor, width, height, placement.with_side(*side));
                fits_main_axis(candidate, *side, boundary)
            })
        {
            used = placement.with_side(side);
            rect = rect_for(anchor, width, height, used);
        }
    }

    if modifiers.prevent_overflow {
        rect.x = clamp_axis(rect.x, width, boundary.x, boundary.width);
        rect.y = clamp_axis(rect.y, height, boundary.y, boundary.height);
    }
    (rect, used)
}

fn rect_for(anchor: FloatRect, width: u16, height: u16, placement: Placement) -> FloatRect {
    let w = width as i32;
    let h = height as i32;
    let cross = |start: i32, anchor_len: u16, len: i32| match placement.alignment {
        Alignment::Start => start,
        Alignment::Center => start + (anchor_len as i32 - len) / 2,
        Alignment::End => start + anchor_len as i32 - len,
    };
    let (x, y) = match placement.side {
        Side::Top => (cross(anchor.x, anchor.width, w), anchor.y - h),
        Side::Bottom => (cross(anchor.x, anchor.width, w), anchor.bottom()),
        Side::Left => (anchor.x - w, cross(anchor.y, anchor.height, h)),
        Side::Right => (anchor.right(), cross(anchor.y, anchor.height, h)),
    };
    FloatRect::new(x, y, width, height)
}

fn fits_main_axis(rect: FloatRect, side: Side, boundary: FloatRect) -> bool {
    match side {
        Side::Top => rect.y >= boundary.y,
        Side::Bottom => rect.bottom() <= boundary.bottom(),
        Side::Left => rect.x >= boundary.x,
        Side::Right => rect.right() <= boundary.right(),
    }
}

fn clamp_axis(pos: i32, len: u16, start: i32, span: u16) -> i32 {
    let max = start + span as i32 - len as i32;
    if max < start {
        // Larger than the boundary: pin to the leading edge.
        return start;
    }
    pos.clamp(start, max)
}
