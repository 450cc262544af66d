//! Drag-to-move affordance shown on every positionable element in edit mode.

use super::{EditMode, EditModeListener, PointerEvent, PointerPhase, SubscriptionId, snap};
use crate::config::LayoutConfig;
use crate::geometry::Vec2;
use crate::layout::{AnchorRegistry, LayerCategory, LayerManager};
use crate::widget::{NodeHandle, NodeRef, SceneRef};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// How pointer motion turns into element motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragMode {
    /// Offset = start offset + total pointer displacement since the gesture
    /// began, optionally grid-snapped. Deterministic for a given start and end.
    #[default]
    Anchored,
    /// Adds each event's pointer delta to the node's current position. For
    /// elements whose local coordinates cannot be read back reliably (e.g.
    /// after reparenting); no snapping.
    RawDelta,
}

#[derive(Debug, Clone, Copy)]
struct DragGesture {
    pointer_id: u32,
    start_pointer: Vec2,
    last_pointer: Vec2,
    start_offset: Vec2,
}

/// Per-element drag controller.
pub struct Draggable {
    element_id: String,
    node: NodeHandle,
    scene: SceneRef,
    mode: DragMode,
    label: Option<String>,
    /// Input-capturing overlay, created on first edit-mode entry.
    overlay: Option<NodeRef>,
    gesture: Option<DragGesture>,
    edit_mode_active: bool,
    /// Node visibility captured when edit mode began.
    visible_before_edit: Option<bool>,
    subscription: Option<SubscriptionId>,
}

impl Draggable {
    /// Create the controller and subscribe it to `edit_mode`.
    pub fn new(
        element_id: &str,
        node: &NodeRef,
        scene: SceneRef,
        edit_mode: &mut EditMode,
        mode: DragMode,
    ) -> Rc<RefCell<Self>> {
        let draggable = Rc::new(RefCell::new(Self {
            element_id: element_id.to_string(),
            node: NodeHandle::new(node),
            scene,
            mode,
            label: None,
            overlay: None,
            gesture: None,
            edit_mode_active: false,
            visible_before_edit: None,
            subscription: None,
        }));
        let weak: Weak<RefCell<dyn EditModeListener>> = Rc::downgrade(&draggable) as _;
        let id = edit_mode.subscribe(weak);
        {
            let mut d = draggable.borrow_mut();
            d.subscription = Some(id);
            if edit_mode.is_active() {
                d.on_edit_mode_changed(true);
            }
        }
        draggable
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn overlay(&self) -> Option<&NodeRef> {
        self.overlay.as_ref()
    }

    /// Text shown on the overlay while in edit mode.
    pub fn set_label(&mut self, label: &str) {
        self.label = Some(label.to_string());
        if let Some(overlay) = &self.overlay {
            overlay.borrow_mut().set_text(label);
        }
    }

    fn ensure_overlay(&mut self, node: &NodeRef) -> NodeRef {
        if let Some(overlay) = &self.overlay {
            return overlay.clone();
        }
        let name = format!("{}.DragOverlay", self.element_id);
        let overlay = self.scene.borrow_mut().create_node(&name, Some(node));
        {
            let mut o = overlay.borrow_mut();
            o.set_anchor(Vec2::new(0.5, 0.5), Vec2::new(0.5, 0.5));
            o.set_position(Vec2::ZERO);
            o.set_text(self.label.as_deref().unwrap_or(&self.element_id));
        }
        LayerManager::apply_category(&overlay, LayerCategory::EditModeOverlay);
        self.overlay = Some(overlay.clone());
        overlay
    }

    /// Dispatch one pointer callback.
    pub fn handle_pointer(
        &mut self,
        event: &PointerEvent,
        config: &LayoutConfig,
        registry: &mut AnchorRegistry,
    ) {
        match event.phase {
            PointerPhase::Began => {
                self.begin(event, registry);
            }
            PointerPhase::Moved => {
                self.update(event, config);
            }
            PointerPhase::Ended => {
                self.end(event, config, registry);
            }
        }
    }

    /// Start a gesture. Ignored outside edit mode or while one is running.
    pub fn begin(&mut self, event: &PointerEvent, registry: &AnchorRegistry) -> bool {
        if !self.edit_mode_active {
            tracing::debug!("'{}': drag begin outside edit mode ignored", self.element_id);
            return false;
        }
        if self.gesture.is_some() {
            tracing::debug!("'{}': drag already active; begin ignored", self.element_id);
            return false;
        }
        let Some(node) = self.node.upgrade() else {
            tracing::debug!("'{}': node gone; drag ignored", self.element_id);
            return false;
        };
        let start_offset = match (self.mode, registry.get(&self.element_id)) {
            (DragMode::Anchored, Some(entry)) => entry.offset,
            _ => node.borrow().position(),
        };
        self.gesture = Some(DragGesture {
            pointer_id: event.pointer_id,
            start_pointer: event.position,
            last_pointer: event.position,
            start_offset,
        });
        true
    }

    fn matching_gesture(&self, event: &PointerEvent) -> Option<DragGesture> {
        match self.gesture {
            Some(g) if g.pointer_id == event.pointer_id => Some(g),
            Some(_) => {
                tracing::debug!("'{}': event from another pointer ignored", self.element_id);
                None
            }
            None => {
                tracing::debug!("'{}': drag event without begin ignored", self.element_id);
                None
            }
        }
    }

    /// Move the element for the current pointer position.
    ///
    /// Returns the new offset, or `None` when there is no matching gesture.
    pub fn update(&mut self, event: &PointerEvent, config: &LayoutConfig) -> Option<Vec2> {
        let mut gesture = self.matching_gesture(event)?;
        let node = self.node.upgrade()?;
        let scale = config.effective_display_scale();

        let offset = match self.mode {
            DragMode::Anchored => {
                let raw = gesture.start_offset + (event.position - gesture.start_pointer) / scale;
                let pitch = config.snap_pitch();
                Vec2::new(snap(raw.x, pitch), snap(raw.y, pitch))
            }
            DragMode::RawDelta => {
                let delta = (event.position - gesture.last_pointer) / scale;
                node.borrow().position() + delta
            }
        };
        gesture.last_pointer = event.position;
        self.gesture = Some(gesture);
        node.borrow_mut().set_position(offset);
        Some(offset)
    }

    /// Finish the gesture and commit the offset under the existing anchor.
    pub fn end(
        &mut self,
        event: &PointerEvent,
        config: &LayoutConfig,
        registry: &mut AnchorRegistry,
    ) -> Option<Vec2> {
        let offset = self.update(event, config)?;
        self.gesture = None;

        let Some(anchor) = registry.get(&self.element_id).map(|e| e.anchor) else {
            tracing::debug!("'{}' is not registered; drag not committed", self.element_id);
            return Some(offset);
        };
        // Zero size leaves the stored size untouched.
        registry.update_position(&self.element_id, anchor, offset, Vec2::ZERO);
        tracing::debug!(
            "'{}' moved to ({}, {}) from {}",
            self.element_id, offset.x, offset.y, anchor
        );
        Some(offset)
    }

    /// Permanent teardown: unsubscribe, restore visibility, drop the overlay.
    pub fn teardown(&mut self, edit_mode: &mut EditMode) {
        if let Some(id) = self.subscription.take() {
            edit_mode.unsubscribe(id);
        }
        if self.edit_mode_active {
            self.on_edit_mode_changed(false);
        }
        if let Some(overlay) = self.overlay.take() {
            self.scene.borrow_mut().destroy_node(&overlay);
        }
        self.gesture = None;
    }
}

impl EditModeListener for Draggable {
    fn on_edit_mode_changed(&mut self, active: bool) {
        self.edit_mode_active = active;
        let Some(node) = self.node.upgrade() else {
            tracing::debug!("'{}': node gone; edit mode change ignored", self.element_id);
            return;
        };

        if active {
            let overlay = self.ensure_overlay(&node);
            {
                // The node may have been resized since the last session.
                let size = node.borrow().size();
                let mut o = overlay.borrow_mut();
                o.set_size(size);
                o.set_visible(true);
            }
            let mut n = node.borrow_mut();
            self.visible_before_edit = Some(n.is_visible());
            n.set_visible(true);
        } else {
            if let Some(overlay) = &self.overlay {
                overlay.borrow_mut().set_visible(false);
            }
            if let Some(visible) = self.visible_before_edit.take() {
                node.borrow_mut().set_visible(visible);
            }
        }
    }
}

impl std::fmt::Debug for Draggable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Draggable")
            .field("element_id", &self.element_id)
            .field("mode", &self.mode)
            .field("dragging", &self.gesture.is_some())
            .field("edit_mode_active", &self.edit_mode_active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{AnchorPoint, FrameTree, Scene};

    struct Fixture {
        tree: Rc<RefCell<FrameTree>>,
        node: NodeRef,
        registry: AnchorRegistry,
        edit_mode: EditMode,
        config: LayoutConfig,
    }

    fn fixture() -> Fixture {
        let tree = FrameTree::shared();
        let node = tree.borrow_mut().create_node("Bags", None);
        let mut registry = AnchorRegistry::new(20.0);
        registry.register("bags", AnchorPoint::Center, Vec2::new(10.0, 20.0), Vec2::new(200.0, 100.0));
        registry.bind_node("bags", &node);
        let config = LayoutConfig {
            grid_size: 0.0,
            ..LayoutConfig::default()
        };
        Fixture { tree, node, registry, edit_mode: EditMode::new(), config }
    }

    fn draggable(f: &mut Fixture, mode: DragMode) -> Rc<RefCell<Draggable>> {
        let scene: SceneRef = f.tree.clone();
        Draggable::new("bags", &f.node, scene, &mut f.edit_mode, mode)
    }

    #[test]
    fn begin_requires_edit_mode() {
        let mut f = fixture();
        let drag = draggable(&mut f, DragMode::Anchored);
        let mut d = drag.borrow_mut();
        assert!(!d.begin(&PointerEvent::began(1, Vec2::ZERO), &f.registry));
        assert!(d.update(&PointerEvent::moved(1, Vec2::new(5.0, 5.0)), &f.config).is_none());
        assert!(d.overlay().is_none());
    }

    #[test]
    fn anchored_drag_commits_offset_under_same_anchor() {
        let mut f = fixture();
        let drag = draggable(&mut f, DragMode::Anchored);
        f.edit_mode.set_active(true);
        let mut d = drag.borrow_mut();

        d.handle_pointer(&PointerEvent::began(1, Vec2::new(100.0, 100.0)), &f.config, &mut f.registry);
        d.handle_pointer(&PointerEvent::moved(1, Vec2::new(130.0, 90.0)), &f.config, &mut f.registry);
        assert_eq!(f.node.borrow().position(), Vec2::new(40.0, 10.0));
        // Not committed until release.
        assert_eq!(f.registry.get("bags").unwrap().offset, Vec2::new(10.0, 20.0));

        d.handle_pointer(&PointerEvent::ended(1, Vec2::new(150.0, 80.0)), &f.config, &mut f.registry);
        let entry = f.registry.get("bags").unwrap();
        assert_eq!(entry.offset, Vec2::new(60.0, 0.0));
        assert_eq!(entry.anchor, AnchorPoint::Center);
        assert_eq!(entry.size, Vec2::new(200.0, 100.0));
        assert!(!d.is_dragging());
    }

    #[test]
    fn display_scale_and_grid_apply() {
        let mut f = fixture();
        f.config.display_scale = 2.0;
        f.config.grid_size = 8.0;
        let drag = draggable(&mut f, DragMode::Anchored);
        f.edit_mode.set_active(true);
        let mut d = drag.borrow_mut();

        d.begin(&PointerEvent::began(1, Vec2::ZERO), &f.registry);
        // (10,20) + (30,-6)/2 = (25,17) -> snapped (24,16)
        let offset = d.end(&PointerEvent::ended(1, Vec2::new(30.0, -6.0)), &f.config, &mut f.registry);
        assert_eq!(offset, Some(Vec2::new(24.0, 16.0)));
    }

    #[test]
    fn other_pointers_and_stray_events_are_ignored() {
        let mut f = fixture();
        let drag = draggable(&mut f, DragMode::Anchored);
        f.edit_mode.set_active(true);
        let mut d = drag.borrow_mut();

        assert!(d.end(&PointerEvent::ended(1, Vec2::new(5.0, 5.0)), &f.config, &mut f.registry).is_none());
        d.begin(&PointerEvent::began(1, Vec2::ZERO), &f.registry);
        assert!(!d.begin(&PointerEvent::began(2, Vec2::ZERO), &f.registry));
        assert!(d.update(&PointerEvent::moved(2, Vec2::new(500.0, 500.0)), &f.config).is_none());
        assert_eq!(f.node.borrow().position(), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn raw_delta_accumulates_per_event() {
        let mut f = fixture();
        let drag = draggable(&mut f, DragMode::RawDelta);
        f.edit_mode.set_active(true);
        let mut d = drag.borrow_mut();

        d.begin(&PointerEvent::began(1, Vec2::ZERO), &f.registry);
        d.update(&PointerEvent::moved(1, Vec2::new(5.0, 0.0)), &f.config);
        // Someone else moves the node mid-gesture; raw mode builds on it.
        f.node.borrow_mut().set_position(Vec2::new(100.0, 100.0));
        let offset = d.end(&PointerEvent::ended(1, Vec2::new(8.0, 2.0)), &f.config, &mut f.registry);
        assert_eq!(offset, Some(Vec2::new(103.0, 102.0)));
        assert_eq!(f.registry.get("bags").unwrap().offset, Vec2::new(103.0, 102.0));
    }

    #[test]
    fn overlay_is_created_once_and_tracks_edit_mode() {
        let mut f = fixture();
        let drag = draggable(&mut f, DragMode::Anchored);
        drag.borrow_mut().set_label("Bags");

        f.edit_mode.set_active(true);
        let overlay = drag.borrow().overlay().cloned().unwrap();
        assert!(overlay.borrow().is_visible());
        assert_eq!(overlay.borrow().stacking_order(), Some(LayerCategory::EditModeOverlay.base_order()));

        f.edit_mode.set_active(false);
        assert!(!overlay.borrow().is_visible());
        f.edit_mode.set_active(true);
        let again = drag.borrow().overlay().cloned().unwrap();
        assert!(Rc::ptr_eq(&overlay, &again));
        assert_eq!(f.tree.borrow().len(), 2);
    }

    #[test]
    fn overlay_matches_node_size_on_each_entry() {
        let mut f = fixture();
        let drag = draggable(&mut f, DragMode::Anchored);

        f.edit_mode.set_active(true);
        let overlay = drag.borrow().overlay().cloned().unwrap();
        assert_eq!(overlay.borrow().size(), Vec2::new(200.0, 100.0));

        f.edit_mode.set_active(false);
        f.node.borrow_mut().set_size(Vec2::new(320.0, 140.0));
        f.edit_mode.set_active(true);
        assert_eq!(overlay.borrow().size(), Vec2::new(320.0, 140.0));
    }

    #[test]
    fn teardown_unsubscribes_and_destroys_overlay() {
        let mut f = fixture();
        let drag = draggable(&mut f, DragMode::Anchored);
        f.edit_mode.set_active(true);
        assert_eq!(f.edit_mode.len(), 1);

        drag.borrow_mut().teardown(&mut f.edit_mode);
        assert!(f.edit_mode.is_empty());
        assert!(drag.borrow().overlay().is_none());
        assert_eq!(f.tree.borrow().len(), 1);
    }
}
