//! Scene construction: create, parent and destroy visual nodes.

use super::Frame;
use super::node::{NodeHandle, NodeRef};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Scene-construction collaborator.
///
/// The layout engine only asks for "create node under parent" and "destroy
/// node"; everything else about drawing belongs to the implementor.
pub trait Scene {
    fn create_node(&mut self, name: &str, parent: Option<&NodeRef>) -> NodeRef;
    fn destroy_node(&mut self, node: &NodeRef);
}

pub type SceneRef = Rc<RefCell<dyn Scene>>;

/// Owning tree of every [`Frame`] in the scene.
///
/// This is the only holder of strong references, so destroying a frame here
/// is what makes outstanding [`NodeHandle`]s go stale.
#[derive(Debug, Default)]
pub struct FrameTree {
    /// Frames by ID.
    frames: HashMap<u64, Rc<RefCell<Frame>>>,
    /// Frame IDs by name.
    names: HashMap<String, u64>,
    /// Child IDs by parent ID.
    children: HashMap<u64, Vec<u64>>,
}

impl FrameTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for callers that share the tree as a scene.
    pub fn shared() -> Rc<RefCell<FrameTree>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Insert a pre-built frame under `parent`.
    pub fn insert(&mut self, mut frame: Frame, parent: Option<&NodeRef>) -> Rc<RefCell<Frame>> {
        let id = frame.id;
        let parent_id = parent.map(|p| p.borrow().node_id());
        frame.parent_id = parent_id;
        if let Some(ref name) = frame.name {
            self.names.insert(name.clone(), id);
        }
        let rc = Rc::new(RefCell::new(frame));
        self.frames.insert(id, rc.clone());
        if let Some(parent) = parent {
            let as_node: NodeRef = rc.clone();
            parent.borrow_mut().add_child(NodeHandle::new(&as_node));
            if let Some(pid) = parent_id {
                self.children.entry(pid).or_default().push(id);
            }
        }
        rc
    }

    /// Get a frame by ID.
    pub fn get(&self, id: u64) -> Option<Rc<RefCell<Frame>>> {
        self.frames.get(&id).cloned()
    }

    /// Get a frame by name.
    pub fn get_by_name(&self, name: &str) -> Option<Rc<RefCell<Frame>>> {
        self.names.get(name).and_then(|id| self.get(*id))
    }

    pub fn contains(&self, id: u64) -> bool {
        self.frames.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Remove a frame and its whole subtree.
    pub fn destroy(&mut self, id: u64) {
        let Some(frame) = self.frames.remove(&id) else {
            tracing::debug!("destroy of unknown frame {}", id);
            return;
        };
        if let Some(name) = frame.borrow().name.as_ref()
            && self.names.get(name) == Some(&id)
        {
            self.names.remove(name);
        }
        if let Some(parent_id) = frame.borrow().parent_id
            && let Some(siblings) = self.children.get_mut(&parent_id)
        {
            siblings.retain(|c| *c != id);
        }
        for child in self.children.remove(&id).unwrap_or_default() {
            self.destroy(child);
        }
    }
}

impl Scene for FrameTree {
    fn create_node(&mut self, name: &str, parent: Option<&NodeRef>) -> NodeRef {
        self.insert(Frame::new(Some(name.to_string()), None), parent)
    }

    fn destroy_node(&mut self, node: &NodeRef) {
        let id = node.borrow().node_id();
        self.destroy(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::LayoutNode;

    #[test]
    fn destroy_removes_subtree_and_stales_handles() {
        let mut tree = FrameTree::new();
        let root = tree.create_node("Root", None);
        let child = tree.create_node("Child", Some(&root));
        let grandchild = tree.create_node("Grandchild", Some(&child));
        let handle = NodeHandle::new(&grandchild);
        let grandchild_id = grandchild.borrow().node_id();
        drop(grandchild);

        assert_eq!(root.borrow().children().len(), 1);
        assert!(handle.is_alive());

        tree.destroy_node(&child);
        drop(child);

        assert!(!tree.contains(grandchild_id));
        assert!(!handle.is_alive());
        assert!(tree.get_by_name("Child").is_none());
        assert!(root.borrow().children().is_empty());
        assert_eq!(tree.len(), 1);
    }
}
