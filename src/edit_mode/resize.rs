//! Corner-handle resizing with snapping, aspect lock and min/max clamps.

use super::{EditMode, EditModeListener, PointerEvent, SubscriptionId, snap};
use crate::config::LayoutConfig;
use crate::geometry::Vec2;
use crate::layout::{AnchorRegistry, LayerCategory, LayerManager};
use crate::widget::{AnchorPoint, NodeHandle, NodeRef, SceneRef, apply_anchor, relayout_subtree};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

const HANDLE_SIZE: f32 = 12.0;

/// Which corner handle is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeCorner {
    pub const ALL: [ResizeCorner; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    fn is_left(&self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft)
    }

    fn is_top(&self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight)
    }

    /// Growth direction per axis: +1 when dragging away from the origin grows it.
    fn signs(&self) -> Vec2 {
        Vec2::new(
            if self.is_left() { -1.0 } else { 1.0 },
            if self.is_top() { 1.0 } else { -1.0 },
        )
    }

    fn anchor(&self) -> AnchorPoint {
        match self {
            Self::TopLeft => AnchorPoint::TopLeft,
            Self::TopRight => AnchorPoint::TopRight,
            Self::BottomLeft => AnchorPoint::BottomLeft,
            Self::BottomRight => AnchorPoint::BottomRight,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.anchor().as_str()
    }
}

#[derive(Debug, Clone, Copy)]
struct ResizeGesture {
    corner: ResizeCorner,
    pointer_id: u32,
    start_pointer: Vec2,
    start_size: Vec2,
    start_offset: Vec2,
    size: Vec2,
    offset: Vec2,
}

/// Per-element resize controller.
pub struct Resizable {
    element_id: String,
    node: NodeHandle,
    scene: SceneRef,
    handles: Vec<(ResizeCorner, NodeRef)>,
    readout: Option<NodeRef>,
    gesture: Option<ResizeGesture>,
    edit_mode_active: bool,
    subscription: Option<SubscriptionId>,
}

impl Resizable {
    /// Create the controller and subscribe it to `edit_mode`.
    pub fn new(
        element_id: &str,
        node: &NodeRef,
        scene: SceneRef,
        edit_mode: &mut EditMode,
    ) -> Rc<RefCell<Self>> {
        let resizable = Rc::new(RefCell::new(Self {
            element_id: element_id.to_string(),
            node: NodeHandle::new(node),
            scene,
            handles: Vec::new(),
            readout: None,
            gesture: None,
            edit_mode_active: false,
            subscription: None,
        }));
        let weak: Weak<RefCell<dyn EditModeListener>> = Rc::downgrade(&resizable) as _;
        let id = edit_mode.subscribe(weak);
        {
            let mut r = resizable.borrow_mut();
            r.subscription = Some(id);
            if edit_mode.is_active() {
                r.on_edit_mode_changed(true);
            }
        }
        resizable
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn is_resizing(&self) -> bool {
        self.gesture.is_some()
    }

    /// Handle node for `corner`, once created.
    pub fn handle(&self, corner: ResizeCorner) -> Option<&NodeRef> {
        self.handles
            .iter()
            .find(|(c, _)| *c == corner)
            .map(|(_, node)| node)
    }

    /// Current readout text, if the readout node exists.
    pub fn readout_text(&self) -> Option<String> {
        let readout = self.readout.as_ref()?;
        if !readout.borrow().is_visible() {
            return None;
        }
        self.gesture.map(|g| format_readout(g.size, g.start_size))
    }

    fn ensure_handles(&mut self, node: &NodeRef) {
        if !self.handles.is_empty() {
            return;
        }
        for corner in ResizeCorner::ALL {
            let name = format!("{}.Resize{}", self.element_id, corner.as_str());
            let handle = self.scene.borrow_mut().create_node(&name, Some(node));
            {
                let mut h = handle.borrow_mut();
                apply_anchor(&mut *h, corner.anchor(), Vec2::ZERO);
                h.set_size(Vec2::new(HANDLE_SIZE, HANDLE_SIZE));
            }
            LayerManager::apply_category(&handle, LayerCategory::EditModeHandles);
            self.handles.push((corner, handle));
        }
    }

    fn ensure_readout(&mut self, node: &NodeRef) -> NodeRef {
        if let Some(readout) = &self.readout {
            return readout.clone();
        }
        let name = format!("{}.ResizeReadout", self.element_id);
        let readout = self.scene.borrow_mut().create_node(&name, Some(node));
        apply_anchor(&mut *readout.borrow_mut(), AnchorPoint::Center, Vec2::ZERO);
        LayerManager::apply_category(&readout, LayerCategory::EditModeUi);
        self.readout = Some(readout.clone());
        readout
    }

    /// Start dragging `corner`. Ignored outside edit mode or mid-gesture.
    pub fn begin(&mut self, corner: ResizeCorner, event: &PointerEvent) -> bool {
        if !self.edit_mode_active {
            tracing::debug!("'{}': resize begin outside edit mode ignored", self.element_id);
            return false;
        }
        if self.gesture.is_some() {
            tracing::debug!("'{}': resize already active; begin ignored", self.element_id);
            return false;
        }
        let Some(node) = self.node.upgrade() else {
            tracing::debug!("'{}': node gone; resize ignored", self.element_id);
            return false;
        };
        let (start_size, start_offset) = {
            let n = node.borrow();
            (n.size(), n.position())
        };
        self.gesture = Some(ResizeGesture {
            corner,
            pointer_id: event.pointer_id,
            start_pointer: event.position,
            start_size,
            start_offset,
            size: start_size,
            offset: start_offset,
        });

        let readout = self.ensure_readout(&node);
        let mut r = readout.borrow_mut();
        r.set_text(&format_readout(start_size, start_size));
        r.set_visible(true);
        true
    }

    /// Resize for the current pointer position. Returns the new size.
    pub fn update(&mut self, event: &PointerEvent, config: &LayoutConfig) -> Option<Vec2> {
        let mut gesture = match self.gesture {
            Some(g) if g.pointer_id == event.pointer_id => g,
            Some(_) => {
                tracing::debug!("'{}': event from another pointer ignored", self.element_id);
                return None;
            }
            None => {
                tracing::debug!("'{}': resize event without begin ignored", self.element_id);
                return None;
            }
        };
        let node = self.node.upgrade()?;
        let pivot = node.borrow().pivot();

        let size = resized(&gesture, event.position, config);
        let offset = compensated_offset(&gesture, pivot, size);
        gesture.size = size;
        gesture.offset = offset;
        self.gesture = Some(gesture);

        {
            let mut n = node.borrow_mut();
            n.set_size(size);
            n.set_position(offset);
        }
        if let Some(readout) = &self.readout {
            readout
                .borrow_mut()
                .set_text(&format_readout(size, gesture.start_size));
        }
        Some(size)
    }

    /// Finish the gesture and commit size (and offset, if it moved).
    pub fn end(
        &mut self,
        event: &PointerEvent,
        config: &LayoutConfig,
        registry: &mut AnchorRegistry,
    ) -> Option<Vec2> {
        let size = self.update(event, config)?;
        let gesture = self.gesture.take()?;
        if let Some(readout) = &self.readout {
            readout.borrow_mut().set_visible(false);
        }
        let node = self.node.upgrade()?;

        let rebuilt: usize = node.borrow().children().iter().map(relayout_subtree).sum();
        if rebuilt > 0 {
            tracing::debug!("'{}': rebuilt {} nested layout groups", self.element_id, rebuilt);
        }

        let Some(anchor) = registry.get(&self.element_id).map(|e| e.anchor) else {
            tracing::debug!("'{}' is not registered; resize not committed", self.element_id);
            return Some(size);
        };
        if gesture.offset != gesture.start_offset {
            registry.update_position(&self.element_id, anchor, gesture.offset, size);
        } else {
            registry.update_size(&self.element_id, size);
        }

        // A rejected size leaves the registry's value authoritative.
        if let Some(entry) = registry.get(&self.element_id)
            && entry.size != size
            && !entry.size.is_zero()
        {
            let restored = entry.size;
            let mut n = node.borrow_mut();
            n.set_size(restored);
            if gesture.offset != gesture.start_offset {
                n.set_position(gesture.start_offset);
                registry.update_position(&self.element_id, anchor, gesture.start_offset, Vec2::ZERO);
            }
            return Some(restored);
        }
        tracing::debug!("'{}' resized to {}x{}", self.element_id, size.x, size.y);
        Some(size)
    }

    /// Permanent teardown: unsubscribe and destroy handle and readout nodes.
    pub fn teardown(&mut self, edit_mode: &mut EditMode) {
        if let Some(id) = self.subscription.take() {
            edit_mode.unsubscribe(id);
        }
        let mut scene = self.scene.borrow_mut();
        for (_, handle) in self.handles.drain(..) {
            scene.destroy_node(&handle);
        }
        if let Some(readout) = self.readout.take() {
            scene.destroy_node(&readout);
        }
        self.gesture = None;
        self.edit_mode_active = false;
    }
}

impl EditModeListener for Resizable {
    fn on_edit_mode_changed(&mut self, active: bool) {
        self.edit_mode_active = active;
        if active && let Some(node) = self.node.upgrade() {
            self.ensure_handles(&node);
        }
        for (_, handle) in &self.handles {
            handle.borrow_mut().set_visible(active);
        }
        if !active && let Some(readout) = &self.readout {
            readout.borrow_mut().set_visible(false);
        }
    }
}

impl std::fmt::Debug for Resizable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resizable")
            .field("element_id", &self.element_id)
            .field("resizing", &self.gesture.map(|g| g.corner))
            .field("edit_mode_active", &self.edit_mode_active)
            .finish()
    }
}

/// Candidate size: corner signs, then snap, then aspect lock, then clamp.
fn resized(gesture: &ResizeGesture, pointer: Vec2, config: &LayoutConfig) -> Vec2 {
    let start = gesture.start_size;
    let delta = (pointer - gesture.start_pointer) / config.effective_display_scale();
    let signs = gesture.corner.signs();
    let pitch = config.snap_pitch();

    let mut w = snap(start.x + signs.x * delta.x, pitch);
    let mut h = snap(start.y + signs.y * delta.y, pitch);

    if config.aspect_lock && start.x > 0.0 && start.y > 0.0 {
        let aspect = start.x / start.y;
        let rel_w = ((w - start.x) / start.x).abs();
        let rel_h = ((h - start.y) / start.y).abs();
        if rel_w >= rel_h {
            h = snap(w / aspect, pitch);
        } else {
            w = snap(h * aspect, pitch);
        }
    }

    let min = config.resize_min;
    let max = Vec2::new(config.resize_max.x.max(min.x), config.resize_max.y.max(min.y));
    Vec2::new(w.clamp(min.x, max.x), h.clamp(min.y, max.y))
}

/// Offset that keeps the edges opposite the dragged corner fixed.
fn compensated_offset(gesture: &ResizeGesture, pivot: Vec2, size: Vec2) -> Vec2 {
    let dw = size.x - gesture.start_size.x;
    let dh = size.y - gesture.start_size.y;
    let dx = if gesture.corner.is_left() {
        -(1.0 - pivot.x) * dw
    } else {
        pivot.x * dw
    };
    let dy = if gesture.corner.is_top() {
        pivot.y * dh
    } else {
        -(1.0 - pivot.y) * dh
    };
    gesture.start_offset + Vec2::new(dx, dy)
}

fn format_readout(size: Vec2, start: Vec2) -> String {
    let percent = |now: f32, then: f32| if then > 0.0 { now / then * 100.0 } else { 100.0 };
    format!(
        "{:.0} x {:.0} ({:.0}% x {:.0}%)",
        size.x,
        size.y,
        percent(size.x, start.x),
        percent(size.y, start.y)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{Frame, FrameTree, Scene};

    struct Fixture {
        tree: Rc<RefCell<FrameTree>>,
        node: NodeRef,
        registry: AnchorRegistry,
        edit_mode: EditMode,
        config: LayoutConfig,
    }

    fn fixture(anchor: AnchorPoint) -> Fixture {
        let tree = FrameTree::shared();
        let node = tree.borrow_mut().create_node("Minimap", None);
        let mut registry = AnchorRegistry::new(20.0);
        registry.register("minimap", anchor, Vec2::new(100.0, 100.0), Vec2::new(200.0, 100.0));
        registry.bind_node("minimap", &node);
        let config = LayoutConfig {
            grid_size: 0.0,
            resize_min: Vec2::new(50.0, 50.0),
            resize_max: Vec2::new(1000.0, 1000.0),
            ..LayoutConfig::default()
        };
        Fixture { tree, node, registry, edit_mode: EditMode::new(), config }
    }

    fn resizable(f: &mut Fixture) -> Rc<RefCell<Resizable>> {
        let scene: SceneRef = f.tree.clone();
        let r = Resizable::new("minimap", &f.node, scene, &mut f.edit_mode);
        f.edit_mode.set_active(true);
        r
    }

    #[test]
    fn handles_follow_edit_mode() {
        let mut f = fixture(AnchorPoint::Center);
        let r = resizable(&mut f);
        for corner in ResizeCorner::ALL {
            let handle = r.borrow().handle(corner).cloned().unwrap();
            assert!(handle.borrow().is_visible());
            assert_eq!(
                handle.borrow().stacking_order(),
                Some(LayerCategory::EditModeHandles.base_order())
            );
        }
        f.edit_mode.set_active(false);
        let handle = r.borrow().handle(ResizeCorner::TopLeft).cloned().unwrap();
        assert!(!handle.borrow().is_visible());
        assert!(!r.borrow_mut().begin(ResizeCorner::TopLeft, &PointerEvent::began(1, Vec2::ZERO)));
    }

    #[test]
    fn bottom_right_grows_and_keeps_top_left_fixed() {
        let mut f = fixture(AnchorPoint::TopLeft);
        let r = resizable(&mut f);
        let mut r = r.borrow_mut();

        r.begin(ResizeCorner::BottomRight, &PointerEvent::began(1, Vec2::new(300.0, 0.0)));
        let size = r.end(&PointerEvent::ended(1, Vec2::new(340.0, -30.0)), &f.config, &mut f.registry);
        assert_eq!(size, Some(Vec2::new(240.0, 130.0)));

        let entry = f.registry.get("minimap").unwrap();
        assert_eq!(entry.size, Vec2::new(240.0, 130.0));
        // Pivot is the top-left corner, so nothing moves.
        assert_eq!(entry.offset, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn left_corner_moves_offset_to_hold_right_edge() {
        let mut f = fixture(AnchorPoint::TopLeft);
        let r = resizable(&mut f);
        let mut r = r.borrow_mut();

        r.begin(ResizeCorner::TopLeft, &PointerEvent::began(1, Vec2::ZERO));
        r.end(&PointerEvent::ended(1, Vec2::new(-50.0, 20.0)), &f.config, &mut f.registry);

        let entry = f.registry.get("minimap").unwrap();
        assert_eq!(entry.size, Vec2::new(250.0, 120.0));
        // Width grew 50 to the left; pivot x = 0 so the offset follows.
        // Height grew 20 upwards; pivot y = 1 so the offset follows too.
        assert_eq!(entry.offset, Vec2::new(50.0, 120.0));
    }

    #[test]
    fn centered_pivot_splits_compensation() {
        let mut f = fixture(AnchorPoint::Center);
        let r = resizable(&mut f);
        let mut r = r.borrow_mut();

        r.begin(ResizeCorner::BottomRight, &PointerEvent::began(1, Vec2::ZERO));
        r.update(&PointerEvent::moved(1, Vec2::new(40.0, -20.0)), &f.config);
        assert_eq!(f.node.borrow().size(), Vec2::new(240.0, 120.0));
        assert_eq!(f.node.borrow().position(), Vec2::new(120.0, 90.0));
    }

    #[test]
    fn clamps_and_snaps() {
        let mut f = fixture(AnchorPoint::TopLeft);
        f.config.grid_size = 10.0;
        let r = resizable(&mut f);
        let mut r = r.borrow_mut();

        r.begin(ResizeCorner::BottomRight, &PointerEvent::began(1, Vec2::ZERO));
        let size = r.update(&PointerEvent::moved(1, Vec2::new(-500.0, 13.0)), &f.config);
        assert_eq!(size, Some(Vec2::new(50.0, 90.0)));
        let size = r.update(&PointerEvent::moved(1, Vec2::new(5000.0, -7.0)), &f.config);
        assert_eq!(size, Some(Vec2::new(1000.0, 110.0)));
    }

    #[test]
    fn aspect_lock_follows_dominant_axis() {
        let mut f = fixture(AnchorPoint::TopLeft);
        f.config.aspect_lock = true;
        let r = resizable(&mut f);
        let mut r = r.borrow_mut();

        r.begin(ResizeCorner::BottomRight, &PointerEvent::began(1, Vec2::ZERO));
        // Width +50% dominates height +10%.
        let size = r.update(&PointerEvent::moved(1, Vec2::new(100.0, -10.0)), &f.config);
        assert_eq!(size, Some(Vec2::new(300.0, 150.0)));
        // Height +100% dominates width +5%.
        let size = r.update(&PointerEvent::moved(1, Vec2::new(10.0, -100.0)), &f.config);
        assert_eq!(size, Some(Vec2::new(400.0, 200.0)));
    }

    #[test]
    fn readout_shows_size_and_percent_while_resizing() {
        let mut f = fixture(AnchorPoint::TopLeft);
        let r = resizable(&mut f);
        let mut r = r.borrow_mut();

        assert!(r.readout_text().is_none());
        r.begin(ResizeCorner::BottomRight, &PointerEvent::began(1, Vec2::ZERO));
        r.update(&PointerEvent::moved(1, Vec2::new(100.0, 0.0)), &f.config);
        assert_eq!(r.readout_text().as_deref(), Some("300 x 100 (150% x 100%)"));
        r.end(&PointerEvent::ended(1, Vec2::new(100.0, 0.0)), &f.config, &mut f.registry);
        assert!(r.readout_text().is_none());
    }

    #[test]
    fn release_rebuilds_nested_layout_groups() {
        let mut f = fixture(AnchorPoint::TopLeft);
        let group = f
            .tree
            .borrow_mut()
            .insert(Frame::new(Some("Row".into()), None).with_layout_group(true), Some(&f.node));
        let r = resizable(&mut f);
        let mut r = r.borrow_mut();

        r.begin(ResizeCorner::BottomRight, &PointerEvent::began(1, Vec2::ZERO));
        r.end(&PointerEvent::ended(1, Vec2::new(20.0, 0.0)), &f.config, &mut f.registry);
        assert_eq!(group.borrow().layout_passes, 1);
    }

    #[test]
    fn rejected_size_restores_registry_value() {
        let mut f = fixture(AnchorPoint::TopLeft);
        f.registry = AnchorRegistry::new(120.0);
        f.registry.register("minimap", AnchorPoint::TopLeft, Vec2::new(100.0, 100.0), Vec2::new(200.0, 150.0));
        f.registry.bind_node("minimap", &f.node);
        let r = resizable(&mut f);
        let mut r = r.borrow_mut();

        r.begin(ResizeCorner::BottomRight, &PointerEvent::began(1, Vec2::ZERO));
        let size = r.end(&PointerEvent::ended(1, Vec2::new(0.0, 80.0)), &f.config, &mut f.registry);
        assert_eq!(size, Some(Vec2::new(200.0, 150.0)));
        assert_eq!(f.node.borrow().size(), Vec2::new(200.0, 150.0));
    }

    #[test]
    fn teardown_destroys_nodes() {
        let mut f = fixture(AnchorPoint::Center);
        let r = resizable(&mut f);
        r.borrow_mut().begin(ResizeCorner::TopRight, &PointerEvent::began(1, Vec2::ZERO));
        assert_eq!(f.tree.borrow().len(), 6);
        r.borrow_mut().teardown(&mut f.edit_mode);
        assert_eq!(f.tree.borrow().len(), 1);
        assert!(f.edit_mode.is_empty());
    }
}
