//! Visual node collaborators: anchors, the node surface, and a retained scene.

mod anchor;
mod frame;
mod node;
mod registry;

pub use anchor::{AnchorPoint, find_nearest_anchor};
pub use frame::Frame;
pub use node::{LayoutNode, NodeHandle, NodeRef, relayout_subtree};
pub use registry::{FrameTree, Scene, SceneRef};

use crate::geometry::Vec2;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_WIDGET_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a unique widget ID.
pub fn next_widget_id() -> u64 {
    NEXT_WIDGET_ID.fetch_add(1, Ordering::Relaxed)
}

/// Set a node's anchor, pivot and offset consistently.
///
/// Pure side effect on the node; never touches persistence.
pub fn apply_anchor(node: &mut dyn LayoutNode, anchor: AnchorPoint, offset: Vec2) {
    node.set_anchor(anchor.normalized(), anchor.pivot());
    node.set_position(offset);
}
