use crate::constants::MIN_ANCHOR_DEPTH;
use crate::overlay::FloatRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

/// The element a popover is positioned against.
///
/// Anchors belong to whatever draws the editor; the positioning code only
/// reads their geometry. An anchor may be detached at any time, in which
/// case it is ignored rather than treated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub id: AnchorId,
    pub rect: FloatRect,
    attached: bool,
    depth: u8,
}

impl Anchor {
    pub fn new(id: AnchorId, rect: FloatRect) -> Self {
        Self {
            id,
            rect,
            attached: true,
            depth: MIN_ANCHOR_DEPTH,
        }
    }

    /// Number of containers between the anchor and the screen root.
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    pub fn detached(mut self) -> Self {
        self.attached = false;
        self
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Whether the anchor can be used as a positioning reference.
    pub fn is_positionable(&self) -> bool {
        self.attached && self.depth >= MIN_ANCHOR_DEPTH && self.rect.width > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positionable_requires_attachment_and_depth() {
        let rect = FloatRect::new(4, 4, 8, 2);
        let anchor = Anchor::new(AnchorId(1), rect);
        assert!(anchor.is_positionable());
        assert!(!anchor.detached().is_positionable());
        assert!(!anchor.with_depth(1).is_positionable());
        assert!(anchor.with_depth(5).is_positionable());
    }

    #[test]
    fn zero_width_anchor_is_not_positionable() {
        let anchor = Anchor::new(AnchorId(2), FloatRect::new(0, 0, 0, 1));
        assert!(!anchor.is_positionable());
    }
}
