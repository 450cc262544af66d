//! In-memory map from element id to its anchor, offset and size.
//!
//! The registry is the single source of truth for element layout. Live nodes
//! are only ever reached through a liveness-checked [`NodeHandle`]; entries
//! outlive their nodes so a re-created element gets its last position back.

use crate::geometry::Vec2;
use crate::widget::{AnchorPoint, NodeHandle, NodeRef, apply_anchor};
use std::collections::HashMap;

/// Layout of one registered element.
#[derive(Debug, Clone)]
pub struct ElementLayout {
    pub id: String,
    pub anchor: AnchorPoint,
    pub offset: Vec2,
    /// Zero means "unset".
    pub size: Vec2,
    pub default_anchor: AnchorPoint,
    pub default_offset: Vec2,
    pub default_size: Vec2,
    /// Back-reference to the live node, for resolution re-apply.
    pub node: Option<NodeHandle>,
}

impl ElementLayout {
    fn push_to_node(&self, node: &NodeRef) {
        let mut n = node.borrow_mut();
        apply_anchor(&mut *n, self.anchor, self.offset);
        if !self.size.is_zero() {
            n.set_size(self.size);
        }
    }
}

/// Values received for an id before it registered.
///
/// Fields merge independently: a size-only update keeps an earlier anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PendingLayout {
    pub anchor: Option<AnchorPoint>,
    pub offset: Option<Vec2>,
    pub size: Option<Vec2>,
}

/// Registry of every positionable element's layout.
#[derive(Debug)]
pub struct AnchorRegistry {
    entries: HashMap<String, ElementLayout>,
    pending: HashMap<String, PendingLayout>,
    min_size: f32,
    revision: u64,
}

impl Default for AnchorRegistry {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl AnchorRegistry {
    /// Create a registry rejecting sizes below `min_size` on either axis.
    pub fn new(min_size: f32) -> Self {
        Self {
            entries: HashMap::new(),
            pending: HashMap::new(),
            min_size,
            revision: 0,
        }
    }

    pub fn min_size(&self) -> f32 {
        self.min_size
    }

    /// Monotonic mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn size_is_valid(&self, size: Vec2) -> bool {
        size.x >= self.min_size && size.y >= self.min_size
    }

    /// Create the entry for `id` if absent.
    ///
    /// A pending position received earlier wins over the given defaults and is
    /// consumed. Registering an existing id only refreshes its defaults.
    pub fn register(
        &mut self,
        id: &str,
        default_anchor: AnchorPoint,
        default_offset: Vec2,
        default_size: Vec2,
    ) -> &ElementLayout {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.default_anchor = default_anchor;
            entry.default_offset = default_offset;
            entry.default_size = default_size;
        } else {
            self.insert_entry(id, default_anchor, default_offset, default_size);
        }
        &self.entries[id]
    }

    fn insert_entry(
        &mut self,
        id: &str,
        default_anchor: AnchorPoint,
        default_offset: Vec2,
        default_size: Vec2,
    ) {
        let pending = self.pending.remove(id).unwrap_or_default();
        if pending != PendingLayout::default() {
            tracing::debug!("Applying pending layout for '{}'", id);
        }
        let size = match pending.size {
            Some(size) if self.size_is_valid(size) => size,
            Some(size) => {
                tracing::warn!(
                    "Pending size {}x{} for '{}' is below minimum {}; using default",
                    size.x, size.y, id, self.min_size
                );
                default_size
            }
            None => default_size,
        };
        let entry = ElementLayout {
            id: id.to_string(),
            anchor: pending.anchor.unwrap_or(default_anchor),
            offset: pending.offset.unwrap_or(default_offset),
            size,
            default_anchor,
            default_offset,
            default_size,
            node: None,
        };
        self.entries.insert(id.to_string(), entry);
        self.touch();
    }

    /// Attach the live node for `id` and push the current layout onto it.
    pub fn bind_node(&mut self, id: &str, node: &NodeRef) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            tracing::debug!("bind_node: '{}' is not registered", id);
            return false;
        };
        entry.node = Some(NodeHandle::new(node));
        entry.push_to_node(node);
        true
    }

    /// Set anchor, offset and size of `id`.
    ///
    /// Returns `false` when `id` is not registered yet; the values are then kept
    /// as pending for the next [`register`](Self::register) of that id. A zero
    /// size leaves the size untouched; a size below the minimum is rejected
    /// while anchor and offset still apply.
    pub fn update_position(
        &mut self,
        id: &str,
        anchor: AnchorPoint,
        offset: Vec2,
        size: Vec2,
    ) -> bool {
        let min_size = self.min_size;
        let size_ok = self.size_is_valid(size);
        let Some(entry) = self.entries.get_mut(id) else {
            let pending = self.pending.entry(id.to_string()).or_default();
            pending.anchor = Some(anchor);
            pending.offset = Some(offset);
            if !size.is_zero() {
                pending.size = Some(size);
            }
            tracing::debug!("'{}' not registered yet; stored as pending", id);
            self.touch();
            return false;
        };
        entry.anchor = anchor;
        entry.offset = offset;
        if !size.is_zero() {
            if size_ok {
                entry.size = size;
            } else {
                tracing::warn!(
                    "Rejected size {}x{} for '{}' (minimum {})",
                    size.x, size.y, id, min_size
                );
            }
        }
        self.touch();
        true
    }

    /// Set only the size of `id`, enforcing the minimum size.
    ///
    /// Returns `true` when the size was applied to a registered entry.
    pub fn update_size(&mut self, id: &str, size: Vec2) -> bool {
        if !self.size_is_valid(size) {
            tracing::warn!(
                "Rejected size {}x{} for '{}' (minimum {})",
                size.x, size.y, id, self.min_size
            );
            return false;
        }
        let Some(entry) = self.entries.get_mut(id) else {
            self.pending.entry(id.to_string()).or_default().size = Some(size);
            tracing::debug!("'{}' not registered yet; stored pending size", id);
            self.touch();
            return false;
        };
        entry.size = size;
        self.touch();
        true
    }

    /// Restore the default anchor and offset of `id`. Size is kept.
    pub fn reset_to_default(&mut self, id: &str) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            tracing::debug!("reset_to_default: '{}' is not registered", id);
            return false;
        };
        entry.anchor = entry.default_anchor;
        entry.offset = entry.default_offset;
        if let Some(node) = entry.node.as_ref().and_then(NodeHandle::upgrade) {
            apply_anchor(&mut *node.borrow_mut(), entry.anchor, entry.offset);
        }
        self.touch();
        true
    }

    /// Restore default anchor and offset of every entry.
    pub fn reset_all_to_default(&mut self) {
        let ids: Vec<String> = self.entries.keys().cloned().collect();
        for id in ids {
            self.reset_to_default(&id);
        }
    }

    /// Re-apply anchor and size to every entry whose node is still alive.
    ///
    /// Stale node references are cleared. Returns the number of nodes updated.
    pub fn reapply_all(&mut self) -> usize {
        let mut applied = 0;
        for entry in self.entries.values_mut() {
            let Some(handle) = entry.node.as_ref() else {
                continue;
            };
            match handle.upgrade() {
                Some(node) => {
                    entry.push_to_node(&node);
                    applied += 1;
                }
                None => {
                    tracing::debug!("Clearing stale node reference for '{}'", entry.id);
                    entry.node = None;
                }
            }
        }
        applied
    }

    pub fn get(&self, id: &str) -> Option<&ElementLayout> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn pending(&self, id: &str) -> Option<&PendingLayout> {
        self.pending.get(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn entries(&self) -> impl Iterator<Item = &ElementLayout> {
        self.entries.values()
    }

    pub fn pending_entries(&self) -> impl Iterator<Item = (&String, &PendingLayout)> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and pending record. Session boundary only.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending.clear();
        self.touch();
    }
}
