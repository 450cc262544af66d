//! Window-like elements: single focus, auto-focus and bulk show/hide.

mod handle;
mod registry;

pub use handle::{Window, WindowHandle, WindowRef};
pub use registry::{WindowRegistry, WindowState};

/// Registry-assigned window identifier, unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

impl WindowId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "window#{}", self.0)
    }
}
