//! Pointer input as delivered by the host's input source.

use crate::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Began,
    Moved,
    Ended,
}

/// One pointer callback, in screen coordinates.
///
/// `pointer_id` identifies the gesture; moves and ends from a different
/// pointer than the one that began a gesture are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: u32,
    pub position: Vec2,
    pub phase: PointerPhase,
}

impl PointerEvent {
    pub fn began(pointer_id: u32, position: Vec2) -> Self {
        Self { pointer_id, position, phase: PointerPhase::Began }
    }

    pub fn moved(pointer_id: u32, position: Vec2) -> Self {
        Self { pointer_id, position, phase: PointerPhase::Moved }
    }

    pub fn ended(pointer_id: u32, position: Vec2) -> Self {
        Self { pointer_id, position, phase: PointerPhase::Ended }
    }
}
