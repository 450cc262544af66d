//! One layout session: the context object that owns every layout component.

use crate::config::LayoutConfig;
use crate::edit_mode::{
    DragMode, Draggable, EditMode, PointerEvent, PointerPhase, Resizable, ResizeCorner,
};
use crate::geometry::{ScreenSize, Vec2};
use crate::layout::{AnchorRegistry, LayerCategory, LayerManager, LayoutStore};
use crate::widget::{AnchorPoint, NodeRef, SceneRef, apply_anchor};
use crate::window::WindowRegistry;
use std::cell::RefCell;
use std::rc::Rc;

/// Owns config, registries, edit mode and persistence for one session.
///
/// Startup loads the document; leaving edit mode and [`end`](Self::end)
/// write it back when anything changed.
pub struct LayoutSession {
    pub config: LayoutConfig,
    pub anchors: AnchorRegistry,
    pub layers: LayerManager,
    pub windows: WindowRegistry,
    pub edit_mode: EditMode,
    pub store: LayoutStore,
    scene: SceneRef,
    screen: ScreenSize,
    grid_overlay: Option<NodeRef>,
    frame: u64,
}

impl LayoutSession {
    /// Build the session and load the persisted layout for `screen`.
    pub fn start(config: LayoutConfig, scene: SceneRef, screen: ScreenSize) -> Self {
        let mut anchors = AnchorRegistry::new(config.min_element_size);
        let mut store = LayoutStore::new(config.layout_path());
        store.load(&mut anchors, screen);
        tracing::info!("Layout session started at {}x{}", screen.width, screen.height);
        Self {
            config,
            anchors,
            layers: LayerManager::new(),
            windows: WindowRegistry::new(),
            edit_mode: EditMode::new(),
            store,
            scene,
            screen,
            grid_overlay: None,
            frame: 0,
        }
    }

    pub fn scene(&self) -> &SceneRef {
        &self.scene
    }

    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn grid_overlay(&self) -> Option<&NodeRef> {
        self.grid_overlay.as_ref()
    }

    /// Register an element and bind its live node in one step.
    pub fn register_element(
        &mut self,
        id: &str,
        node: &NodeRef,
        anchor: AnchorPoint,
        offset: Vec2,
        size: Vec2,
    ) {
        self.anchors.register(id, anchor, offset, size);
        self.anchors.bind_node(id, node);
    }

    pub fn draggable(&mut self, id: &str, node: &NodeRef, mode: DragMode) -> Rc<RefCell<Draggable>> {
        Draggable::new(id, node, self.scene.clone(), &mut self.edit_mode, mode)
    }

    pub fn resizable(&mut self, id: &str, node: &NodeRef) -> Rc<RefCell<Resizable>> {
        Resizable::new(id, node, self.scene.clone(), &mut self.edit_mode)
    }

    /// Route a pointer callback to a drag controller.
    pub fn drag_pointer(&mut self, drag: &Rc<RefCell<Draggable>>, event: &PointerEvent) {
        drag.borrow_mut()
            .handle_pointer(event, &self.config, &mut self.anchors);
    }

    /// Route a pointer callback to a resize controller.
    pub fn resize_pointer(
        &mut self,
        resize: &Rc<RefCell<Resizable>>,
        corner: ResizeCorner,
        event: &PointerEvent,
    ) {
        let mut r = resize.borrow_mut();
        match event.phase {
            PointerPhase::Began => {
                r.begin(corner, event);
            }
            PointerPhase::Moved => {
                r.update(event, &self.config);
            }
            PointerPhase::Ended => {
                r.end(event, &self.config, &mut self.anchors);
            }
        }
    }

    /// Enter or leave edit mode. Leaving saves the layout if it changed.
    pub fn set_edit_mode(&mut self, active: bool) -> bool {
        if !self.edit_mode.set_active(active) {
            return false;
        }
        self.update_grid(active);
        if !active {
            // Elements shown only for editing are hidden again by now.
            let reconciled = self.windows.sync_visibility(&mut self.layers);
            if reconciled > 0 {
                tracing::debug!("{} windows hidden on edit mode exit", reconciled);
            }
            if self.store.is_dirty(&self.anchors) {
                self.save_layout();
            }
        }
        true
    }

    pub fn toggle_edit_mode(&mut self) -> bool {
        let active = !self.edit_mode.is_active();
        self.set_edit_mode(active);
        active
    }

    fn update_grid(&mut self, active: bool) {
        if active && self.config.show_grid {
            let grid = match self.grid_overlay.clone() {
                Some(grid) => grid,
                None => {
                    let grid = self.scene.borrow_mut().create_node("EditModeGrid", None);
                    LayerManager::apply_category(&grid, LayerCategory::EditModeBackground);
                    self.grid_overlay = Some(grid.clone());
                    grid
                }
            };
            let mut g = grid.borrow_mut();
            apply_anchor(&mut *g, AnchorPoint::Center, Vec2::ZERO);
            g.set_size(self.screen.as_vec2());
            g.set_visible(true);
        } else if let Some(grid) = &self.grid_overlay {
            grid.borrow_mut().set_visible(false);
        }
    }

    /// Re-express every offset for `new_screen` and push it onto live nodes.
    pub fn on_display_resized(&mut self, new_screen: ScreenSize) -> usize {
        self.screen = new_screen;
        if let Some(grid) = &self.grid_overlay {
            grid.borrow_mut().set_size(new_screen.as_vec2());
        }
        self.store.reapply_positions(&mut self.anchors, new_screen)
    }

    /// Per-frame update. Returns the number of windows purged this tick.
    pub fn tick(&mut self) -> usize {
        self.frame += 1;
        let interval = u64::from(self.config.cleanup_interval_frames);
        if interval == 0 || self.frame % interval != 0 {
            return 0;
        }
        self.windows.cleanup(&mut self.layers)
    }

    /// Write the layout document. Failures are logged, never retried.
    pub fn save_layout(&mut self) -> bool {
        match self.store.save(&self.anchors) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to save layout to {}: {}", self.store.path().display(), e);
                false
            }
        }
    }

    /// Leave edit mode, persist, and wipe per-session state.
    pub fn end(&mut self) {
        self.set_edit_mode(false);
        if self.store.is_dirty(&self.anchors) {
            self.save_layout();
        }
        if let Some(grid) = self.grid_overlay.take() {
            self.scene.borrow_mut().destroy_node(&grid);
        }
        self.anchors.clear();
        self.windows.clear(&mut self.layers);
        tracing::info!("Layout session ended after {} frames", self.frame);
    }
}

impl std::fmt::Debug for LayoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutSession")
            .field("screen", &self.screen)
            .field("anchors", &self.anchors.len())
            .field("windows", &self.windows.len())
            .field("edit_mode", &self.edit_mode.is_active())
            .field("frame", &self.frame)
            .finish()
    }
}
