//! Anchor-relative placement hints and collision modifiers.
pub mod engine;

pub use engine::{
    AnchoredHandle, AnchoredPlacementEngine, OnCreate, PlacementEngine, PlacementHandle,
    PlacementOptions, compute_placement,
};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::overlay::FloatRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub fn is_vertical(self) -> bool {
        matches!(self, Side::Top | Side::Bottom)
    }

    fn as_str(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Alignment {
    Start,
    #[default]
    Center,
    End,
}

/// Where the overlay sits relative to its anchor, e.g. `bottom-start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub side: Side,
    pub alignment: Alignment,
}

impl Placement {
    pub const fn new(side: Side, alignment: Alignment) -> Self {
        Self { side, alignment }
    }

    pub const fn centered(side: Side) -> Self {
        Self::new(side, Alignment::Center)
    }

    pub fn with_side(self, side: Side) -> Self {
        Self { side, ..self }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::centered(Side::Bottom)
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alignment {
            Alignment::Center => f.write_str(self.side.as_str()),
            Alignment::Start => write!(f, "{}-start", self.side.as_str()),
            Alignment::End => write!(f, "{}-end", self.side.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown placement `{0}`")]
pub struct ParsePlacementError(String);

impl FromStr for Placement {
    type Err = ParsePlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let (side, alignment) = match normalized.split_once('-') {
            Some((side, "start")) => (side, Alignment::Start),
            Some((side, "end")) => (side, Alignment::End),
            Some(_) => return Err(ParsePlacementError(s.to_string())),
            None => (normalized.as_str(), Alignment::Center),
        };
        let side = match side {
            "top" => Side::Top,
            "bottom" => Side::Bottom,
            "left" => Side::Left,
            "right" => Side::Right,
            _ => return Err(ParsePlacementError(s.to_string())),
        };
        Ok(Self::new(side, alignment))
    }
}

/// Region the overlay must stay inside when overflow prevention is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boundary {
    #[default]
    Viewport,
    Rect(FloatRect),
}

/// Collision-avoidance configuration handed to the placement engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifiers {
    pub flip: bool,
    /// Sides tried, in order, when the preferred side overflows.
    pub flip_order: Vec<Side>,
    pub keep_together: bool,
    pub arrow: bool,
    pub prevent_overflow: bool,
    pub boundary: Boundary,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            flip: true,
            flip_order: vec![Side::Right, Side::Left, Side::Bottom, Side::Top],
            keep_together: false,
            arrow: false,
            prevent_overflow: true,
            boundary: Boundary::Viewport,
        }
    }
}

impl Modifiers {
    /// Applies caller overrides on top of these modifiers.
    pub fn merged(&self, overrides: &ModifierOverrides) -> Self {
        Self {
            flip: overrides.flip.unwrap_or(self.flip),
            flip_order: overrides
                .flip_order
                .clone()
                .unwrap_or_else(|| self.flip_order.clone()),
            keep_together: overrides.keep_together.unwrap_or(self.keep_together),
            arrow: overrides.arrow.unwrap_or(self.arrow),
            prevent_overflow: overrides.prevent_overflow.unwrap_or(self.prevent_overflow),
            boundary: overrides.boundary.unwrap_or(self.boundary),
        }
    }
}

/// Partial modifier set; unset fields keep the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModifierOverrides {
    pub flip: Option<bool>,
    pub flip_order: Option<Vec<Side>>,
    pub keep_together: Option<bool>,
    pub arrow: Option<bool>,
    pub prevent_overflow: Option<bool>,
    pub boundary: Option<Boundary>,
}

impl ModifierOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
