//! HUD layout engine
//!
//! Anchors on-screen panels to screen positions, lets them be dragged and
//! resized in a live edit mode, persists them resolution-independently and
//! keeps window stacking and focus deterministic.

pub mod config;
pub mod edit_mode;
pub mod error;
pub mod event;
pub mod geometry;
pub mod layout;
pub mod session;
pub mod widget;
pub mod window;

pub use config::LayoutConfig;
pub use error::{Error, Result};
pub use session::LayoutSession;
