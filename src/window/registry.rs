//! Tracks window-like elements and owns the single-focus rule.

use super::{WindowHandle, WindowId, WindowRef};
use crate::event::{Observers, WindowEvent};
use crate::layout::{LayerCategory, LayerManager};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Per-window state derived from registration, visibility and focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Unregistered,
    Hidden,
    VisibleUnfocused,
    VisibleFocused,
}

struct Entry {
    id: WindowId,
    kind: String,
    element_id: Option<String>,
    handle: Weak<RefCell<dyn WindowHandle>>,
}

impl Entry {
    /// Live handle, unless the element was dropped or destroyed.
    fn live(&self) -> Option<WindowRef> {
        self.handle
            .upgrade()
            .filter(|handle| handle.borrow().is_alive())
    }
}

/// Registry of window-like elements.
///
/// Stores only weak handles; [`cleanup`](Self::cleanup) purges elements that
/// were destroyed without unregistering.
#[derive(Default)]
pub struct WindowRegistry {
    next_id: u64,
    /// Flat list in registration order, for bulk operations.
    windows: Vec<Entry>,
    by_kind: HashMap<String, WindowId>,
    by_element: HashMap<String, WindowId>,
    /// Most recently focused last.
    focus_stack: Vec<WindowId>,
    focused: Option<WindowId>,
    observers: Observers<WindowEvent>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: WindowId) -> Option<&Entry> {
        self.windows.iter().find(|e| e.id == id)
    }

    fn handle(&self, id: WindowId) -> Option<WindowRef> {
        self.entry(id).and_then(Entry::live)
    }

    /// Track `window`. Registering the same instance twice returns its id.
    ///
    /// The kind index keeps an earlier instance while it is still alive.
    pub fn register(&mut self, window: &WindowRef) -> WindowId {
        if let Some(entry) = self
            .windows
            .iter()
            .find(|e| e.handle.upgrade().is_some_and(|h| Rc::ptr_eq(&h, window)))
        {
            return entry.id;
        }

        self.next_id += 1;
        let id = WindowId::new(self.next_id);
        let (kind, element_id) = {
            let w = window.borrow();
            (w.kind().to_string(), w.element_id().map(str::to_string))
        };

        let kind_taken = self
            .by_kind
            .get(&kind)
            .and_then(|existing| self.handle(*existing))
            .is_some();
        if kind_taken {
            tracing::debug!("Kind '{}' already has a live window; index kept", kind);
        } else {
            self.by_kind.insert(kind.clone(), id);
        }
        if let Some(element_id) = &element_id {
            self.by_element.insert(element_id.clone(), id);
        }

        self.windows.push(Entry {
            id,
            kind,
            element_id,
            handle: Rc::downgrade(window),
        });
        self.observers.notify(&WindowEvent::Registered(id));
        id
    }

    /// Stop tracking `id`, handing focus on if it held it.
    pub fn unregister(&mut self, id: WindowId, layers: &mut LayerManager) -> bool {
        let Some(pos) = self.windows.iter().position(|e| e.id == id) else {
            tracing::debug!("unregister: {} is not registered", id);
            return false;
        };
        let was_focused = self.focused == Some(id);
        if was_focused {
            self.blur(id);
        }
        let entry = self.windows.remove(pos);
        self.forget(&entry);
        self.observers.notify(&WindowEvent::Unregistered(id));
        if was_focused {
            self.hand_off(layers);
        }
        true
    }

    fn forget(&mut self, entry: &Entry) {
        if self.by_kind.get(&entry.kind) == Some(&entry.id) {
            self.by_kind.remove(&entry.kind);
        }
        if let Some(element_id) = &entry.element_id
            && self.by_element.get(element_id) == Some(&entry.id)
        {
            self.by_element.remove(element_id);
        }
        self.focus_stack.retain(|f| *f != entry.id);
        if self.focused == Some(entry.id) {
            self.focused = None;
        }
    }

    /// Show `id` through the element itself, then react.
    pub fn show(&mut self, id: WindowId, layers: &mut LayerManager) -> bool {
        let Some(handle) = self.handle(id) else {
            tracing::debug!("show: {} is not registered", id);
            return false;
        };
        if handle.borrow().is_visible() {
            return false;
        }
        handle.borrow_mut().show();
        self.notify_shown(id, layers);
        true
    }

    /// Hide `id` through the element itself, then react.
    pub fn hide(&mut self, id: WindowId, layers: &mut LayerManager) -> bool {
        let was_focused = self.focused == Some(id);
        if !self.hide_quietly(id) {
            return false;
        }
        if was_focused {
            self.hand_off(layers);
        }
        true
    }

    /// Hide without handing focus on. Used by bulk operations.
    fn hide_quietly(&mut self, id: WindowId) -> bool {
        let Some(handle) = self.handle(id) else {
            tracing::debug!("hide: {} is not registered", id);
            return false;
        };
        if !handle.borrow().is_visible() {
            return false;
        }
        handle.borrow_mut().hide();
        self.hidden(id);
        true
    }

    pub fn toggle(&mut self, id: WindowId, layers: &mut LayerManager) -> bool {
        let visible = self.handle(id).is_some_and(|h| h.borrow().is_visible());
        if visible {
            self.hide(id, layers)
        } else {
            self.show(id, layers)
        }
    }

    pub fn show_kind(&mut self, kind: &str, layers: &mut LayerManager) -> bool {
        self.kind_id(kind).is_some_and(|id| self.show(id, layers))
    }

    pub fn hide_kind(&mut self, kind: &str, layers: &mut LayerManager) -> bool {
        self.kind_id(kind).is_some_and(|id| self.hide(id, layers))
    }

    pub fn toggle_kind(&mut self, kind: &str, layers: &mut LayerManager) -> bool {
        self.kind_id(kind).is_some_and(|id| self.toggle(id, layers))
    }

    pub fn show_id(&mut self, element_id: &str, layers: &mut LayerManager) -> bool {
        self.element_window_id(element_id)
            .is_some_and(|id| self.show(id, layers))
    }

    pub fn hide_id(&mut self, element_id: &str, layers: &mut LayerManager) -> bool {
        self.element_window_id(element_id)
            .is_some_and(|id| self.hide(id, layers))
    }

    pub fn toggle_id(&mut self, element_id: &str, layers: &mut LayerManager) -> bool {
        self.element_window_id(element_id)
            .is_some_and(|id| self.toggle(id, layers))
    }

    fn kind_id(&self, kind: &str) -> Option<WindowId> {
        let id = self.by_kind.get(kind).copied();
        if id.is_none() {
            tracing::debug!("No window of kind '{}'", kind);
        }
        id
    }

    fn element_window_id(&self, element_id: &str) -> Option<WindowId> {
        let id = self.by_element.get(element_id).copied();
        if id.is_none() {
            tracing::debug!("No window with id '{}'", element_id);
        }
        id
    }

    /// React to `id` becoming visible, focusing it when its layer auto-focuses.
    pub fn notify_shown(&mut self, id: WindowId, layers: &mut LayerManager) {
        let Some(handle) = self.handle(id) else {
            return;
        };
        self.observers.notify(&WindowEvent::Shown(id));
        let layer = handle.borrow().layer();
        if layer.auto_focuses() {
            self.focus(id, layers);
        }
    }

    /// React to `id` becoming hidden, handing focus on if it held it.
    pub fn notify_hidden(&mut self, id: WindowId, layers: &mut LayerManager) {
        if self.entry(id).is_none() {
            return;
        }
        let was_focused = self.focused == Some(id);
        self.hidden(id);
        if was_focused {
            self.hand_off(layers);
        }
    }

    /// Catch up with windows hidden behind the registry's back.
    ///
    /// Any window still on the focus stack that is no longer visible is
    /// treated as hidden, so focus never rests on a hidden window. Returns
    /// the number of windows reconciled.
    pub fn sync_visibility(&mut self, layers: &mut LayerManager) -> usize {
        let stale: Vec<WindowId> = self
            .focus_stack
            .iter()
            .copied()
            .filter(|id| !self.handle(*id).is_some_and(|h| h.borrow().is_visible()))
            .collect();
        for id in &stale {
            self.notify_hidden(*id, layers);
        }
        stale.len()
    }

    fn hidden(&mut self, id: WindowId) {
        self.observers.notify(&WindowEvent::Hidden(id));
        if self.focused == Some(id) {
            self.blur(id);
        }
        self.focus_stack.retain(|f| *f != id);
    }

    /// Give `id` focus. No-op when it already has it or is not visible.
    pub fn focus(&mut self, id: WindowId, layers: &mut LayerManager) -> bool {
        if self.focused == Some(id) {
            return false;
        }
        let Some(handle) = self.handle(id) else {
            tracing::debug!("focus: {} is not registered", id);
            return false;
        };
        if !handle.borrow().is_visible() {
            tracing::debug!("focus: {} is hidden", id);
            return false;
        }
        if let Some(previous) = self.focused {
            self.blur(previous);
        }

        self.focus_stack.retain(|f| *f != id);
        self.focus_stack.push(id);
        self.focused = Some(id);
        {
            let mut h = handle.borrow_mut();
            h.bring_to_front(layers);
            h.on_focus();
        }
        self.observers.notify(&WindowEvent::Focused(id));
        true
    }

    fn blur(&mut self, id: WindowId) {
        if let Some(handle) = self.handle(id) {
            handle.borrow_mut().on_blur();
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
        self.observers.notify(&WindowEvent::Blurred(id));
    }

    /// Focus the most recently focused window that is still visible.
    fn hand_off(&mut self, layers: &mut LayerManager) {
        while let Some(candidate) = self.focus_stack.pop() {
            let visible = self
                .handle(candidate)
                .is_some_and(|h| h.borrow().is_visible());
            if visible {
                self.focus(candidate, layers);
                return;
            }
        }
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.focused
    }

    pub fn is_focused(&self, id: WindowId) -> bool {
        self.focused == Some(id)
    }

    pub fn focus_stack(&self) -> &[WindowId] {
        &self.focus_stack
    }

    pub fn state(&self, id: WindowId) -> WindowState {
        match self.handle(id) {
            None => WindowState::Unregistered,
            Some(h) if !h.borrow().is_visible() => WindowState::Hidden,
            Some(_) if self.focused == Some(id) => WindowState::VisibleFocused,
            Some(_) => WindowState::VisibleUnfocused,
        }
    }

    fn bulk_hide(&mut self, layers: &mut LayerManager, keep: impl Fn(&str, LayerCategory) -> bool) -> usize {
        let targets: Vec<WindowId> = self
            .windows
            .iter()
            .filter_map(|e| {
                let handle = e.live()?;
                let h = handle.borrow();
                (h.is_visible() && !keep(e.kind.as_str(), h.layer())).then_some(e.id)
            })
            .collect();
        let had_focus = self.focused.is_some();
        let hidden = targets
            .into_iter()
            .filter(|id| self.hide_quietly(*id))
            .count();
        if had_focus && self.focused.is_none() {
            self.hand_off(layers);
        }
        hidden
    }

    /// Hide every visible window. Returns how many were hidden.
    pub fn close_all(&mut self, layers: &mut LayerManager) -> usize {
        self.bulk_hide(layers, |_, _| false)
    }

    /// Hide every visible window whose kind is not in `kinds`.
    pub fn close_all_except(&mut self, kinds: &[&str], layers: &mut LayerManager) -> usize {
        self.bulk_hide(layers, |kind, _| kinds.contains(&kind))
    }

    /// Hide every visible window outside the HUD tiers.
    pub fn close_all_non_hud(&mut self, layers: &mut LayerManager) -> usize {
        self.bulk_hide(layers, |_, layer| layer.is_hud())
    }

    /// Purge windows whose element was destroyed. Returns the number purged.
    pub fn cleanup(&mut self, layers: &mut LayerManager) -> usize {
        let (dead, live): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut self.windows)
            .into_iter()
            .partition(|e| e.live().is_none());
        self.windows = live;

        let lost_focus = self.focused.is_some_and(|f| dead.iter().any(|e| e.id == f));
        for entry in &dead {
            if self.focused == Some(entry.id) {
                self.observers.notify(&WindowEvent::Blurred(entry.id));
            }
            self.forget(entry);
            self.observers.notify(&WindowEvent::Unregistered(entry.id));
        }
        if lost_focus {
            self.hand_off(layers);
        }
        if !dead.is_empty() {
            tracing::debug!("Purged {} destroyed windows", dead.len());
        }
        dead.len()
    }

    /// Wipe all registry state and reset the per-session layer counters.
    pub fn clear(&mut self, layers: &mut LayerManager) {
        self.windows.clear();
        self.by_kind.clear();
        self.by_element.clear();
        self.focus_stack.clear();
        self.focused = None;
        layers.reset_counters();
    }

    pub fn observers_mut(&mut self) -> &mut Observers<WindowEvent> {
        &mut self.observers
    }

    pub fn get(&self, id: WindowId) -> Option<WindowRef> {
        self.handle(id)
    }

    pub fn by_kind(&self, kind: &str) -> Option<WindowRef> {
        self.by_kind.get(kind).and_then(|id| self.handle(*id))
    }

    pub fn by_id(&self, element_id: &str) -> Option<WindowRef> {
        self.by_element.get(element_id).and_then(|id| self.handle(*id))
    }

    pub fn ids(&self) -> Vec<WindowId> {
        self.windows.iter().map(|e| e.id).collect()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl std::fmt::Debug for WindowRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowRegistry")
            .field("windows", &self.windows.len())
            .field("focused", &self.focused)
            .field("focus_stack", &self.focus_stack)
            .finish()
    }
}
