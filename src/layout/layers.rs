//! Stacking-order tiers and per-session focus counters.

use crate::widget::NodeRef;

/// Semantic stacking tier. Variants are listed in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LayerCategory {
    Background,
    #[default]
    Hud,
    HudOverlay,
    Window,
    WindowFocused,
    Popup,
    QuickBar,
    Modal,
    DragPreview,
    EditModeBackground,
    EditModeOverlay,
    EditModeHandles,
    EditModeUi,
    Tooltip,
    SystemOverlay,
}

impl LayerCategory {
    pub const ALL: [LayerCategory; 15] = [
        Self::Background,
        Self::Hud,
        Self::HudOverlay,
        Self::Window,
        Self::WindowFocused,
        Self::Popup,
        Self::QuickBar,
        Self::Modal,
        Self::DragPreview,
        Self::EditModeBackground,
        Self::EditModeOverlay,
        Self::EditModeHandles,
        Self::EditModeUi,
        Self::Tooltip,
        Self::SystemOverlay,
    ];

    /// Fixed base stacking value of this tier.
    pub const fn base_order(&self) -> i32 {
        match self {
            Self::Background => 0,
            Self::Hud => 100,
            Self::HudOverlay => 200,
            Self::Window => 1000,
            Self::WindowFocused => 2000,
            Self::Popup => 3000,
            Self::QuickBar => 4000,
            Self::Modal => 5000,
            Self::DragPreview => 6000,
            Self::EditModeBackground => 7000,
            Self::EditModeOverlay => 7100,
            Self::EditModeHandles => 7200,
            Self::EditModeUi => 7300,
            Self::Tooltip => 8000,
            Self::SystemOverlay => 9000,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().to_uppercase() == key)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Background => "Background",
            Self::Hud => "HUD",
            Self::HudOverlay => "HUDOverlay",
            Self::Window => "Window",
            Self::WindowFocused => "WindowFocused",
            Self::Popup => "Popup",
            Self::QuickBar => "QuickBar",
            Self::Modal => "Modal",
            Self::DragPreview => "DragPreview",
            Self::EditModeBackground => "EditModeBackground",
            Self::EditModeOverlay => "EditModeOverlay",
            Self::EditModeHandles => "EditModeHandles",
            Self::EditModeUi => "EditModeUI",
            Self::Tooltip => "Tooltip",
            Self::SystemOverlay => "SystemOverlay",
        }
    }

    /// HUD tiers are never auto-focused and survive "close all non-HUD".
    pub fn is_hud(&self) -> bool {
        matches!(self, Self::Hud | Self::HudOverlay)
    }

    /// Tiers whose elements take focus as soon as they are shown.
    pub fn auto_focuses(&self) -> bool {
        matches!(self, Self::Window | Self::Popup | Self::Modal)
    }
}

/// Hands out stacking orders.
///
/// Window and Popup orders come from per-session counters, so each newly
/// focused window or popup lands above every earlier one without renumbering.
#[derive(Debug, Default)]
pub struct LayerManager {
    window_counter: i32,
    popup_counter: i32,
}

impl LayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next stacking order for an element being brought to front in `category`.
    pub fn next_order(&mut self, category: LayerCategory) -> i32 {
        let counter = match category {
            LayerCategory::Window => &mut self.window_counter,
            LayerCategory::Popup => &mut self.popup_counter,
            other => return other.base_order(),
        };
        *counter = counter.saturating_add(1);
        category.base_order().saturating_add(*counter)
    }

    /// Ensure `node` has a stacking context with `order`. Idempotent.
    pub fn set_layer(node: &NodeRef, order: i32) {
        let mut n = node.borrow_mut();
        if n.stacking_order() != Some(order) {
            n.set_stacking_order(order);
        }
    }

    /// Re-apply the stacking context using `category`'s base order.
    pub fn apply_category(node: &NodeRef, category: LayerCategory) {
        Self::set_layer(node, category.base_order());
    }

    pub fn window_counter(&self) -> i32 {
        self.window_counter
    }

    pub fn popup_counter(&self) -> i32 {
        self.popup_counter
    }

    /// Reset both counters. Full session reset only.
    pub fn reset_counters(&mut self) {
        self.window_counter = 0;
        self.popup_counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{FrameTree, Scene};

    #[test]
    fn base_orders_strictly_increase() {
        for pair in LayerCategory::ALL.windows(2) {
            assert!(pair[0].base_order() < pair[1].base_order(), "{:?}", pair);
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn window_orders_are_monotonic() {
        let mut layers = LayerManager::new();
        let first = layers.next_order(LayerCategory::Window);
        let second = layers.next_order(LayerCategory::Window);
        let popup = layers.next_order(LayerCategory::Popup);
        assert!(second > first);
        assert!(first > LayerCategory::Window.base_order());
        assert!(popup > LayerCategory::Popup.base_order());
        assert_eq!(layers.next_order(LayerCategory::Modal), LayerCategory::Modal.base_order());

        layers.reset_counters();
        assert_eq!(layers.next_order(LayerCategory::Window), first);
    }

    #[test]
    fn set_layer_is_idempotent() {
        let mut tree = FrameTree::new();
        let node = tree.create_node("Panel", None);
        LayerManager::set_layer(&node, 1005);
        LayerManager::set_layer(&node, 1005);
        assert_eq!(node.borrow().stacking_order(), Some(1005));
        LayerManager::apply_category(&node, LayerCategory::Tooltip);
        assert_eq!(node.borrow().stacking_order(), Some(8000));
    }

    #[test]
    fn parses_category_names() {
        assert_eq!(LayerCategory::from_str("HUD"), Some(LayerCategory::Hud));
        assert_eq!(LayerCategory::from_str("edit_mode_ui"), Some(LayerCategory::EditModeUi));
        assert_eq!(LayerCategory::from_str("nope"), None);
    }
}
