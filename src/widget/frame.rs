//! Frame - the retained visual node used by the built-in scene.

use super::node::{LayoutNode, NodeHandle, NodeRef};
use super::next_widget_id;
use crate::geometry::Vec2;

/// A retained node holding the layout fields the engine writes.
#[derive(Debug)]
pub struct Frame {
    /// Unique widget ID.
    pub id: u64,
    /// Debug name (optional).
    pub name: Option<String>,
    /// Parent widget ID.
    pub parent_id: Option<u64>,
    /// Children, non-owning. The scene owns every frame.
    pub children: Vec<NodeHandle>,
    /// Normalized anchor within the parent.
    pub anchor: Vec2,
    /// Normalized pivot within this frame.
    pub pivot: Vec2,
    /// Offset from anchor to pivot.
    pub position: Vec2,
    pub size: Vec2,
    pub visible: bool,
    /// Stacking order, `None` until a stacking context is attached.
    pub stacking_order: Option<i32>,
    /// Label text (overlays and readouts).
    pub text: Option<String>,
    /// Whether this frame arranges its children.
    pub layout_group: bool,
    /// Number of forced re-layout passes run on this frame.
    pub layout_passes: u32,
}

impl Frame {
    pub fn new(name: Option<String>, parent_id: Option<u64>) -> Self {
        let center = Vec2::new(0.5, 0.5);
        Self {
            id: next_widget_id(),
            name,
            parent_id,
            children: Vec::new(),
            anchor: center,
            pivot: center,
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            visible: true,
            stacking_order: None,
            text: None,
            layout_group: false,
            layout_passes: 0,
        }
    }

    /// Builder-style flag for frames that lay out their children.
    pub fn with_layout_group(mut self, layout_group: bool) -> Self {
        self.layout_group = layout_group;
        self
    }
}

impl LayoutNode for Frame {
    fn node_id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_anchor(&mut self, anchor: Vec2, pivot: Vec2) {
        self.anchor = anchor;
        self.pivot = pivot;
    }

    fn anchor(&self) -> Vec2 {
        self.anchor
    }

    fn pivot(&self) -> Vec2 {
        self.pivot
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_stacking_order(&mut self, order: i32) {
        self.stacking_order = Some(order);
    }

    fn stacking_order(&self) -> Option<i32> {
        self.stacking_order
    }

    fn set_text(&mut self, text: &str) {
        self.text = Some(text.to_string());
    }

    fn children(&self) -> Vec<NodeRef> {
        self.children.iter().filter_map(NodeHandle::upgrade).collect()
    }

    fn add_child(&mut self, child: NodeHandle) {
        self.children.retain(NodeHandle::is_alive);
        self.children.push(child);
    }

    fn is_layout_group(&self) -> bool {
        self.layout_group
    }

    fn rebuild_layout(&mut self) {
        self.layout_passes += 1;
    }
}
