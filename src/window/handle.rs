//! The window-like side of the consumer contract.

use crate::layout::{LayerCategory, LayerManager};
use crate::widget::{NodeHandle, NodeRef};
use std::cell::RefCell;
use std::rc::Rc;

/// What a window-like element exposes to the [`WindowRegistry`](super::WindowRegistry).
///
/// Visibility stays owned by the element: the registry only ever calls
/// `show`/`hide` and then reacts.
pub trait WindowHandle {
    /// Declared kind; one live instance per kind is indexed.
    fn kind(&self) -> &str;

    /// Persistent element id, if the element has one.
    fn element_id(&self) -> Option<&str> {
        None
    }

    fn layer(&self) -> LayerCategory;

    fn is_visible(&self) -> bool;
    fn show(&mut self);
    fn hide(&mut self);

    /// Take the next stacking order for this element's layer.
    fn bring_to_front(&mut self, layers: &mut LayerManager);

    fn on_focus(&mut self) {}
    fn on_blur(&mut self) {}
    fn is_focused(&self) -> bool;

    /// False once the underlying element is permanently destroyed.
    fn is_alive(&self) -> bool {
        true
    }
}

pub type WindowRef = Rc<RefCell<dyn WindowHandle>>;

/// Standard window element over a visual node.
#[derive(Debug)]
pub struct Window {
    kind: String,
    element_id: Option<String>,
    node: NodeHandle,
    layer: LayerCategory,
    focused: bool,
}

impl Window {
    /// Wrap `node` and give it `layer`'s base stacking order.
    pub fn new(kind: &str, node: &NodeRef, layer: LayerCategory) -> Self {
        LayerManager::apply_category(node, layer);
        Self {
            kind: kind.to_string(),
            element_id: None,
            node: NodeHandle::new(node),
            layer,
            focused: false,
        }
    }

    pub fn with_element_id(mut self, element_id: &str) -> Self {
        self.element_id = Some(element_id.to_string());
        self
    }

    pub fn shared(self) -> Rc<RefCell<Window>> {
        Rc::new(RefCell::new(self))
    }

    pub fn node(&self) -> Option<NodeRef> {
        self.node.upgrade()
    }

    /// Move to another tier, reapplying its base stacking order.
    pub fn set_layer_category(&mut self, layer: LayerCategory) {
        self.layer = layer;
        if let Some(node) = self.node.upgrade() {
            LayerManager::apply_category(&node, layer);
        }
    }
}

impl WindowHandle for Window {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    fn layer(&self) -> LayerCategory {
        self.layer
    }

    fn is_visible(&self) -> bool {
        self.node
            .upgrade()
            .is_some_and(|node| node.borrow().is_visible())
    }

    fn show(&mut self) {
        match self.node.upgrade() {
            Some(node) => node.borrow_mut().set_visible(true),
            None => tracing::debug!("show: node of '{}' is gone", self.kind),
        }
    }

    fn hide(&mut self) {
        match self.node.upgrade() {
            Some(node) => node.borrow_mut().set_visible(false),
            None => tracing::debug!("hide: node of '{}' is gone", self.kind),
        }
    }

    fn bring_to_front(&mut self, layers: &mut LayerManager) {
        let order = layers.next_order(self.layer);
        if let Some(node) = self.node.upgrade() {
            LayerManager::set_layer(&node, order);
        }
    }

    fn on_focus(&mut self) {
        self.focused = true;
    }

    fn on_blur(&mut self) {
        self.focused = false;
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn is_alive(&self) -> bool {
        self.node.is_alive()
    }
}
