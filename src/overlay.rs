//! The overlay surface that positioning authorities write into.
//!
//! An [`OverlayNode`] plays the role of an absolutely positioned element: it
//! has a containing-block origin, inline `top`/`left` offsets, and an
//! optional translation. Its on-screen bounding box is the sum of the three.
//! The node is owned by the rendering layer; the positioning code only ever
//! borrows it for the duration of a call.
use ratatui::layout::Rect;
use serde::{Deserialize, Serialize};

/// Signed rectangle origin with unsigned size. Popovers may be dragged
/// partially off-screen, so the origin can be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FloatRect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl FloatRect {
    pub fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn top_left(&self) -> ManualOffset {
        ManualOffset {
            x: self.x,
            y: self.y,
        }
    }

    pub fn contains(&self, column: i32, row: i32) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        column >= self.x && column < self.right() && row >= self.y && row < self.bottom()
    }

    /// Portion of the rect that lands inside `bounds`, if any.
    pub fn clip_to(&self, bounds: Rect) -> Option<Rect> {
        let left = self.x.max(bounds.x as i32);
        let top = self.y.max(bounds.y as i32);
        let right = self.right().min(bounds.right() as i32);
        let bottom = self.bottom().min(bounds.bottom() as i32);
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect {
            x: left as u16,
            y: top as u16,
            width: (right - left) as u16,
            height: (bottom - top) as u16,
        })
    }
}

impl From<Rect> for FloatRect {
    fn from(rect: Rect) -> Self {
        Self {
            x: rect.x as i32,
            y: rect.y as i32,
            width: rect.width,
            height: rect.height,
        }
    }
}

/// Absolute screen position of a popover's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ManualOffset {
    pub x: i32,
    pub y: i32,
}

impl ManualOffset {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Translate {
    pub x: i32,
    pub y: i32,
}

/// Inline positioning style. `None` means the property is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InlineStyle {
    pub top: Option<i32>,
    pub left: Option<i32>,
    pub transform: Option<Translate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayNode {
    origin_x: i32,
    origin_y: i32,
    width: u16,
    height: u16,
    style: InlineStyle,
    attached: bool,
    revision: u64,
}

impl OverlayNode {
    /// Creates a mounted node of the given size whose containing block sits
    /// at the screen origin.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            origin_x: 0,
            origin_y: 0,
            width,
            height,
            style: InlineStyle::default(),
            attached: true,
            revision: 0,
        }
    }

    /// Moves the containing block. Used when the mount point is not the
    /// screen root.
    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.origin_x = x;
        self.origin_y = y;
        self
    }

    pub fn origin(&self) -> (i32, i32) {
        (self.origin_x, self.origin_y)
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        if (self.width, self.height) == (width, height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.bump();
    }

    pub fn style(&self) -> InlineStyle {
        self.style
    }

    /// Incremented on every style write; renderers can use it to skip
    /// redundant redraws.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    /// Layout offset from the containing block, ignoring any translation.
    pub fn offset_top(&self) -> i32 {
        self.style.top.unwrap_or(0)
    }

    pub fn offset_left(&self) -> i32 {
        self.style.left.unwrap_or(0)
    }

    pub fn bounding_rect(&self) -> FloatRect {
        let translate = self.style.transform.unwrap_or_default();
        FloatRect {
            x: self.origin_x + self.offset_left() + translate.x,
            y: self.origin_y + self.offset_top() + translate.y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn set_top(&mut self, top: i32) {
        self.style.top = Some(top);
        self.bump();
    }

    pub fn set_left(&mut self, left: i32) {
        self.style.left = Some(left);
        self.bump();
    }

    pub fn set_transform(&mut self, translate: Translate) {
        self.style.transform = Some(translate);
        self.bump();
    }

    pub fn clear_transform(&mut self) {
        self.style.transform = None;
        self.bump();
    }

    /// Pins the node so its bounding box starts exactly at `offset`,
    /// dropping any translation.
    pub fn place_at(&mut self, offset: ManualOffset) {
        self.style = InlineStyle {
            top: Some(offset.y - self.origin_y),
            left: Some(offset.x - self.origin_x),
            transform: None,
        };
        self.bump();
    }

    /// Removes all inline positioning.
    pub fn reset_position(&mut self) {
        self.style = InlineStyle::default();
        self.bump();
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_rect_sums_origin_offset_and_translation() {
        let mut node = OverlayNode::new(10, 4).with_origin(2, 3);
        assert_eq!(node.bounding_rect(), FloatRect::new(2, 3, 10, 4));
        node.set_top(5);
        node.set_left(7);
        node.set_transform(Translate { x: -1, y: 2 });
        assert_eq!(node.bounding_rect(), FloatRect::new(8, 10, 10, 4));
        // offsets ignore the translation
        assert_eq!(node.offset_top(), 5);
        assert_eq!(node.offset_left(), 7);
    }

    #[test]
    fn place_at_lands_exactly_on_offset() {
        let mut node = OverlayNode::new(10, 4).with_origin(-3, 6);
        node.set_transform(Translate { x: 40, y: 40 });
        node.place_at(ManualOffset::new(200, 80));
        assert_eq!(node.bounding_rect().top_left(), ManualOffset::new(200, 80));
        assert!(node.style().transform.is_none());
    }

    #[test]
    fn revision_tracks_style_writes_only() {
        let mut node = OverlayNode::new(4, 4);
        let start = node.revision();
        let _ = node.bounding_rect();
        assert_eq!(node.revision(), start);
        node.set_top(1);
        assert_eq!(node.revision(), start + 1);
        node.resize(4, 4);
        assert_eq!(node.revision(), start + 1);
    }

    #[test]
    fn clip_to_handles_offscreen_origin() {
        let rect = FloatRect::new(-5, -2, 10, 4);
        let bounds = Rect::new(0, 0, 80, 24);
        assert_eq!(rect.clip_to(bounds), Some(Rect::new(0, 0, 5, 2)));
        let gone = FloatRect::new(-20, 0, 10, 4);
        assert_eq!(gone.clip_to(bounds), None);
    }

    #[test]
    fn contains_is_half_open() {
        let rect = FloatRect::new(1, 1, 3, 3);
        assert!(rect.contains(1, 1));
        assert!(rect.contains(3, 3));
        assert!(!rect.contains(4, 1));
        assert!(!FloatRect::new(0, 0, 0, 5).contains(0, 0));
    }
}
