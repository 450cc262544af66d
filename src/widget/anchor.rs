//! Anchor points for element positioning.

use crate::geometry::{ScreenSize, Vec2};
use serde::{Deserialize, Serialize};

/// One of the nine normalized screen locations an offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnchorPoint {
    TopLeft,
    Top,
    TopRight,
    Left,
    #[default]
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl AnchorPoint {
    pub const ALL: [AnchorPoint; 9] = [
        Self::TopLeft,
        Self::Top,
        Self::TopRight,
        Self::Left,
        Self::Center,
        Self::Right,
        Self::BottomLeft,
        Self::Bottom,
        Self::BottomRight,
    ];

    /// Parse an anchor name. Accepts `TOPLEFT`, `TopLeft` and `top_left`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_uppercase();
        match key.as_str() {
            "TOPLEFT" => Some(Self::TopLeft),
            "TOP" => Some(Self::Top),
            "TOPRIGHT" => Some(Self::TopRight),
            "LEFT" => Some(Self::Left),
            "CENTER" => Some(Self::Center),
            "RIGHT" => Some(Self::Right),
            "BOTTOMLEFT" => Some(Self::BottomLeft),
            "BOTTOM" => Some(Self::Bottom),
            "BOTTOMRIGHT" => Some(Self::BottomRight),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "TopLeft",
            Self::Top => "Top",
            Self::TopRight => "TopRight",
            Self::Left => "Left",
            Self::Center => "Center",
            Self::Right => "Right",
            Self::BottomLeft => "BottomLeft",
            Self::Bottom => "Bottom",
            Self::BottomRight => "BottomRight",
        }
    }

    /// Normalized screen coordinate of this anchor, in `[0,1] x [0,1]`.
    pub fn normalized(&self) -> Vec2 {
        match self {
            Self::TopLeft => Vec2::new(0.0, 1.0),
            Self::Top => Vec2::new(0.5, 1.0),
            Self::TopRight => Vec2::new(1.0, 1.0),
            Self::Left => Vec2::new(0.0, 0.5),
            Self::Center => Vec2::new(0.5, 0.5),
            Self::Right => Vec2::new(1.0, 0.5),
            Self::BottomLeft => Vec2::new(0.0, 0.0),
            Self::Bottom => Vec2::new(0.5, 0.0),
            Self::BottomRight => Vec2::new(1.0, 0.0),
        }
    }

    /// Pivot matching this anchor, so an offset measured from a top-left
    /// anchor moves the element's top-left corner.
    pub fn pivot(&self) -> Vec2 {
        self.normalized()
    }
}

impl std::fmt::Display for AnchorPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket a pointer position into a 3x3 grid of screen thirds.
pub fn find_nearest_anchor(pointer: Vec2, screen: ScreenSize) -> AnchorPoint {
    let size = screen.as_vec2();
    let third = |value: f32, extent: f32| -> usize {
        if extent <= 0.0 || value < extent / 3.0 {
            0
        } else if value < extent * 2.0 / 3.0 {
            1
        } else {
            2
        }
    };
    let col = third(pointer.x, size.x);
    // Row 0 is the bottom third (Y-up).
    let row = third(pointer.y, size.y);
    match (row, col) {
        (2, 0) => AnchorPoint::TopLeft,
        (2, 1) => AnchorPoint::Top,
        (2, _) => AnchorPoint::TopRight,
        (1, 0) => AnchorPoint::Left,
        (1, 1) => AnchorPoint::Center,
        (1, _) => AnchorPoint::Right,
        (_, 0) => AnchorPoint::BottomLeft,
        (_, 1) => AnchorPoint::Bottom,
        _ => AnchorPoint::BottomRight,
    }
}
