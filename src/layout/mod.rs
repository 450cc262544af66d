//! Element layout state: anchors, stacking tiers and persistence.

mod anchor_registry;
mod layers;
mod store;

pub use anchor_registry::{AnchorRegistry, ElementLayout, PendingLayout};
pub use layers::{LayerCategory, LayerManager};
pub use store::{
    CURRENT_FORMAT_VERSION, ElementRecord, LayoutDocument, LayoutStore,
    RESOLUTION_METADATA_VERSION, scale_offset,
};
