//! Edit mode: the global flag plus the drag and resize affordances it drives.

mod drag;
mod pointer;
mod resize;

pub use drag::{DragMode, Draggable};
pub use pointer::{PointerEvent, PointerPhase};
pub use resize::{Resizable, ResizeCorner};

use std::cell::RefCell;
use std::rc::Weak;

/// Receives edit-mode changes.
pub trait EditModeListener {
    fn on_edit_mode_changed(&mut self, active: bool);
}

/// Handle returned by [`EditMode::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Process-wide edit-mode flag.
///
/// Every drag/resize instance subscribes once at construction and stays in
/// this list until teardown, whether or not it is currently visible.
/// Changing the flag notifies every live subscriber before returning.
#[derive(Default)]
pub struct EditMode {
    active: bool,
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Weak<RefCell<dyn EditModeListener>>)>,
}

impl EditMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn subscribe(&mut self, listener: Weak<RefCell<dyn EditModeListener>>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Set the flag and broadcast. Returns false when nothing changed.
    pub fn set_active(&mut self, active: bool) -> bool {
        if self.active == active {
            return false;
        }
        self.active = active;
        tracing::info!("Edit mode {}", if active { "entered" } else { "exited" });

        self.subscribers.retain(|(_, weak)| weak.strong_count() > 0);
        for (id, weak) in &self.subscribers {
            let Some(listener) = weak.upgrade() else { continue };
            match listener.try_borrow_mut() {
                Ok(mut listener) => listener.on_edit_mode_changed(active),
                Err(_) => tracing::warn!("Edit mode subscriber {:?} busy; skipped", id),
            }
        }
        true
    }

    pub fn toggle(&mut self) -> bool {
        let active = !self.active;
        self.set_active(active);
        active
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for EditMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditMode")
            .field("active", &self.active)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Round `value` to the nearest multiple of `pitch`. A pitch of 0 disables snapping.
pub fn snap(value: f32, pitch: f32) -> f32 {
    if pitch > 0.0 {
        (value / pitch).round() * pitch
    } else {
        value
    }
}
