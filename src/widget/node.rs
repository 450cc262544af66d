//! The position/size surface every positionable element exposes.

use crate::geometry::Vec2;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Mutable position/size surface of a live visual node.
///
/// The engine only ever issues anchor/pivot/offset/size writes, visibility
/// toggles and "ensure stacking context with order N" through this trait; how
/// a node is drawn is up to the implementor.
pub trait LayoutNode {
    fn node_id(&self) -> u64;

    fn name(&self) -> Option<&str> {
        None
    }

    /// Set the normalized anchor and the matching pivot.
    fn set_anchor(&mut self, anchor: Vec2, pivot: Vec2);
    fn anchor(&self) -> Vec2;
    fn pivot(&self) -> Vec2;

    /// Offset from the anchor to the pivot.
    fn set_position(&mut self, position: Vec2);
    fn position(&self) -> Vec2;

    fn set_size(&mut self, size: Vec2);
    fn size(&self) -> Vec2;

    fn set_visible(&mut self, visible: bool);
    fn is_visible(&self) -> bool;

    /// Ensure the node has a stacking context and give it `order`.
    fn set_stacking_order(&mut self, order: i32);
    fn stacking_order(&self) -> Option<i32>;

    fn set_text(&mut self, _text: &str) {}

    fn children(&self) -> Vec<NodeRef> {
        Vec::new()
    }

    fn add_child(&mut self, _child: NodeHandle) {}

    /// Whether this node arranges its children (and needs a re-layout pass
    /// when its size changes under it).
    fn is_layout_group(&self) -> bool {
        false
    }

    fn rebuild_layout(&mut self) {}
}

pub type NodeRef = Rc<RefCell<dyn LayoutNode>>;

/// Non-owning reference to a live node, checked for liveness before use.
#[derive(Clone)]
pub struct NodeHandle(Weak<RefCell<dyn LayoutNode>>);

impl NodeHandle {
    pub fn new(node: &NodeRef) -> Self {
        Self(Rc::downgrade(node))
    }

    pub fn upgrade(&self) -> Option<NodeRef> {
        self.0.upgrade()
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub fn points_to(&self, node: &NodeRef) -> bool {
        self.upgrade().is_some_and(|n| Rc::ptr_eq(&n, node))
    }
}

impl std::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Force a re-layout pass on every layout group nested under `node`.
///
/// Returns the number of groups rebuilt. `node` itself is included.
pub fn relayout_subtree(node: &NodeRef) -> usize {
    let (is_group, children) = {
        let n = node.borrow();
        (n.is_layout_group(), n.children())
    };
    let mut rebuilt = 0;
    // Inner groups first so outer groups see final child sizes.
    for child in &children {
        rebuilt += relayout_subtree(child);
    }
    if is_group {
        node.borrow_mut().rebuild_layout();
        rebuilt += 1;
    }
    rebuilt
}
