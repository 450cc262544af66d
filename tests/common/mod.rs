//! Shared test helpers.

use hud_layout::LayoutConfig;
use hud_layout::LayoutSession;
use hud_layout::geometry::{ScreenSize, Vec2};
use hud_layout::widget::{AnchorPoint, FrameTree, NodeRef, Scene};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// A session over a fresh frame tree, persisting into a temp directory.
pub struct Harness {
    pub dir: TempDir,
    pub tree: Rc<RefCell<FrameTree>>,
    pub session: LayoutSession,
}

/// Config writing the layout into `dir`, with snapping off.
#[allow(dead_code)]
pub fn config_in(dir: &Path) -> LayoutConfig {
    LayoutConfig {
        layout_path: Some(dir.join("layout.json")),
        grid_size: 0.0,
        ..LayoutConfig::default()
    }
}

#[allow(dead_code)]
pub fn harness(screen: ScreenSize) -> Harness {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = config_in(dir.path());
    harness_with(dir, config, screen)
}

/// Start a session on an existing directory (for save-then-reload tests).
#[allow(dead_code)]
pub fn harness_with(dir: TempDir, config: LayoutConfig, screen: ScreenSize) -> Harness {
    let tree = FrameTree::shared();
    let session = LayoutSession::start(config, tree.clone(), screen);
    Harness { dir, tree, session }
}

impl Harness {
    #[allow(dead_code)]
    pub fn layout_path(&self) -> PathBuf {
        self.dir.path().join("layout.json")
    }

    /// Create a node named after `id`, register it and bind it.
    #[allow(dead_code)]
    pub fn element(&mut self, id: &str, anchor: AnchorPoint, offset: Vec2, size: Vec2) -> NodeRef {
        let node = self.tree.borrow_mut().create_node(id, None);
        self.session.register_element(id, &node, anchor, offset, size);
        node
    }

    /// End the session and start a new one at `screen` over the same directory.
    #[allow(dead_code)]
    pub fn restart(mut self, screen: ScreenSize) -> Harness {
        self.session.end();
        let config = self.session.config.clone();
        harness_with(self.dir, config, screen)
    }
}
