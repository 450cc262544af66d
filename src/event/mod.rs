//! Synchronous, in-order notification lists.

use crate::window::WindowId;

/// Notifications fired by the window registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Registered(WindowId),
    Unregistered(WindowId),
    Shown(WindowId),
    Hidden(WindowId),
    Focused(WindowId),
    Blurred(WindowId),
}

impl WindowEvent {
    pub fn window(&self) -> WindowId {
        match *self {
            Self::Registered(id)
            | Self::Unregistered(id)
            | Self::Shown(id)
            | Self::Hidden(id)
            | Self::Focused(id)
            | Self::Blurred(id) => id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered(_) => "Registered",
            Self::Unregistered(_) => "Unregistered",
            Self::Shown(_) => "Shown",
            Self::Hidden(_) => "Hidden",
            Self::Focused(_) => "Focused",
            Self::Blurred(_) => "Blurred",
        }
    }
}

/// Handle returned by [`Observers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Observer list for one event category.
///
/// `notify` calls every observer in subscription order before returning.
pub struct Observers<E> {
    next_id: u64,
    observers: Vec<(ObserverId, Box<dyn FnMut(&E)>)>,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            next_id: 1,
            observers: Vec::new(),
        }
    }
}

impl<E> Observers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&E) + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    pub fn notify(&mut self, event: &E) {
        for (_, observer) in self.observers.iter_mut() {
            observer(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn clear(&mut self) {
        self.observers.clear();
    }
}

impl<E> std::fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.observers.len())
            .finish()
    }
}
