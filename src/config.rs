//! Layout engine settings.
//!
//! Stores grid snapping, resize bounds and housekeeping intervals as JSON at
//! `~/.config/hud-layout/settings.json`. Loaded once on startup; the engine
//! only ever reads these values.

use crate::geometry::Vec2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding both the settings file and the layout document.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hud-layout")
}

/// Default config file path.
fn default_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Persisted layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Snap pitch in layout units; 0 disables snapping.
    #[serde(default = "default_grid_size")]
    pub grid_size: f32,
    #[serde(default = "default_true")]
    pub snap_to_grid: bool,
    /// Show a grid overlay while edit mode is active.
    #[serde(default)]
    pub show_grid: bool,
    /// Pointer pixels per layout unit.
    #[serde(default = "default_display_scale")]
    pub display_scale: f32,
    /// Sizes below this on either axis are rejected.
    #[serde(default = "default_min_element_size")]
    pub min_element_size: f32,
    #[serde(default = "default_resize_min")]
    pub resize_min: Vec2,
    #[serde(default = "default_resize_max")]
    pub resize_max: Vec2,
    /// Keep the gesture-start aspect ratio while resizing.
    #[serde(default)]
    pub aspect_lock: bool,
    /// Ticks between window registry cleanups.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_frames: u32,
    /// Override for the layout document location.
    #[serde(default)]
    pub layout_path: Option<PathBuf>,
    /// Path the config was loaded from (not serialized).
    #[serde(skip)]
    pub path: PathBuf,
}

fn default_grid_size() -> f32 { 10.0 }
fn default_true() -> bool { true }
fn default_display_scale() -> f32 { 1.0 }
fn default_min_element_size() -> f32 { 20.0 }
fn default_resize_min() -> Vec2 { Vec2::new(50.0, 50.0) }
fn default_resize_max() -> Vec2 { Vec2::new(2000.0, 2000.0) }
fn default_cleanup_interval() -> u32 { 300 }

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            snap_to_grid: true,
            show_grid: false,
            display_scale: default_display_scale(),
            min_element_size: default_min_element_size(),
            resize_min: default_resize_min(),
            resize_max: default_resize_max(),
            aspect_lock: false,
            cleanup_interval_frames: default_cleanup_interval(),
            layout_path: None,
            path: default_path(),
        }
    }
}

impl LayoutConfig {
    /// Load from the default location, falling back to defaults on any error.
    pub fn load() -> Self {
        Self::load_from(&default_path())
    }

    /// Load from `path`, falling back to defaults on any error.
    pub fn load_from(path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable settings {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        config.path = path.to_path_buf();
        config
    }

    /// Persist current config to disk.
    pub fn save(&self) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Effective snap pitch, 0 when snapping is off.
    pub fn snap_pitch(&self) -> f32 {
        if self.snap_to_grid && self.grid_size > 0.0 {
            self.grid_size
        } else {
            0.0
        }
    }

    /// Display scale guarded against zero and negative values.
    pub fn effective_display_scale(&self) -> f32 {
        if self.display_scale > 0.0 { self.display_scale } else { 1.0 }
    }

    /// Resolved location of the layout document.
    pub fn layout_path(&self) -> PathBuf {
        self.layout_path
            .clone()
            .unwrap_or_else(|| config_dir().join("layout.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "grid_size": 25.0, "show_grid": true }"#).unwrap();

        let config = LayoutConfig::load_from(&path);
        assert_eq!(config.grid_size, 25.0);
        assert!(config.show_grid);
        assert!(config.snap_to_grid);
        assert_eq!(config.min_element_size, 20.0);
        assert_eq!(config.resize_max, Vec2::new(2000.0, 2000.0));
    }

    #[test]
    fn garbage_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        let config = LayoutConfig::load_from(&path);
        assert_eq!(config.grid_size, 10.0);
    }

    #[test]
    fn save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut config = LayoutConfig::load_from(&path);
        config.aspect_lock = true;
        config.grid_size = 8.0;
        config.save().unwrap();

        let reloaded = LayoutConfig::load_from(&path);
        assert!(reloaded.aspect_lock);
        assert_eq!(reloaded.grid_size, 8.0);
    }

    #[test]
    fn snap_pitch_respects_toggle() {
        let mut config = LayoutConfig::default();
        assert_eq!(config.snap_pitch(), 10.0);
        config.snap_to_grid = false;
        assert_eq!(config.snap_pitch(), 0.0);
    }
}
