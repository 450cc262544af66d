//! Versioned, resolution-aware persistence of the anchor registry.
//!
//! The whole registry is written as one JSON document and read back once per
//! session. Offsets on center-anchored axes are stored in the resolution they
//! were captured at and rescaled on load; edge-anchored offsets are margins
//! and are never rescaled.

use super::AnchorRegistry;
use crate::geometry::{ScreenSize, Vec2};
use crate::widget::AnchorPoint;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Version that introduced `savedScreenWidth` / `savedScreenHeight`.
pub const RESOLUTION_METADATA_VERSION: u32 = 2;
pub const CURRENT_FORMAT_VERSION: u32 = 2;

/// How close an anchor fraction must be to 0.5 to count as centered.
const CENTER_TOLERANCE: f32 = 0.01;

/// One persisted element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    pub id: String,
    pub anchor: AnchorPoint,
    pub offset_x: f32,
    pub offset_y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    /// Only the size is known; anchor and offset are placeholders.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub size_only: bool,
}

impl ElementRecord {
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.offset_x, self.offset_y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// The single persisted unit, written and read wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    #[serde(default = "legacy_version")]
    pub format_version: u32,
    #[serde(default)]
    pub saved_screen_width: u32,
    #[serde(default)]
    pub saved_screen_height: u32,
    #[serde(default)]
    pub elements: Vec<ElementRecord>,
}

fn legacy_version() -> u32 {
    1
}

impl LayoutDocument {
    /// Fresh document tagged with `screen`.
    pub fn empty(screen: ScreenSize) -> Self {
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            saved_screen_width: screen.width,
            saved_screen_height: screen.height,
            elements: Vec::new(),
        }
    }

    pub fn saved_screen(&self) -> ScreenSize {
        ScreenSize::new(self.saved_screen_width, self.saved_screen_height)
    }

    /// Read a document from disk.
    pub fn read(path: &Path) -> crate::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Overwrite `path` with this document in one rename.
    pub fn write_atomic(&self, path: &Path) -> crate::Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path)?;
        Ok(())
    }

    /// Stamp a pre-resolution-metadata document with `screen`.
    ///
    /// Returns true when the document was migrated.
    pub fn migrate(&mut self, screen: ScreenSize) -> bool {
        if self.format_version >= RESOLUTION_METADATA_VERSION {
            return false;
        }
        tracing::info!(
            "Migrating layout document v{} -> v{} at {}x{}",
            self.format_version, CURRENT_FORMAT_VERSION, screen.width, screen.height
        );
        self.format_version = CURRENT_FORMAT_VERSION;
        self.saved_screen_width = screen.width;
        self.saved_screen_height = screen.height;
        true
    }

    /// Rescale every record from the saved resolution to `screen`.
    pub fn rescale(&mut self, screen: ScreenSize) {
        let from = self.saved_screen();
        for record in self.elements.iter_mut().filter(|r| !r.size_only) {
            let offset = scale_offset(record.anchor, record.offset(), from, screen);
            record.offset_x = offset.x;
            record.offset_y = offset.y;
        }
        self.saved_screen_width = screen.width;
        self.saved_screen_height = screen.height;
    }
}

/// Resolution-scaling rule.
///
/// Each axis is scaled by `to / from` only when the anchor sits at the middle
/// of that axis. Edge-anchored axes keep their offset, since it is a margin
/// from the screen edge. Sizes are never scaled here.
pub fn scale_offset(anchor: AnchorPoint, offset: Vec2, from: ScreenSize, to: ScreenSize) -> Vec2 {
    let fraction = anchor.normalized();
    let scale_axis = |value: f32, fraction: f32, from: u32, to: u32| -> f32 {
        if from == 0 || (fraction - 0.5).abs() > CENTER_TOLERANCE {
            value
        } else {
            value * (to as f32 / from as f32)
        }
    };
    Vec2::new(
        scale_axis(offset.x, fraction.x, from.width, to.width),
        scale_axis(offset.y, fraction.y, from.height, to.height),
    )
}

/// Loads and saves the anchor registry as a [`LayoutDocument`].
#[derive(Debug)]
pub struct LayoutStore {
    path: PathBuf,
    /// Resolution the registry's offsets are currently expressed in.
    screen: ScreenSize,
    /// Registry revision at the last load or save.
    clean_revision: Option<u64>,
    /// Set by migration or an explicit `mark_dirty`.
    forced_dirty: bool,
}

impl LayoutStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            screen: ScreenSize::default(),
            clean_revision: None,
            forced_dirty: false,
        }
    }

    /// Default document location in the per-user config directory.
    pub fn default_path() -> PathBuf {
        crate::config::config_dir().join("layout.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    /// Read the document and feed every record into `registry`.
    ///
    /// A missing or unreadable document yields an empty one tagged with
    /// `screen`. Records for ids not registered yet become pending entries.
    /// Returns the (migrated, not rescaled) document that was read.
    pub fn load(&mut self, registry: &mut AnchorRegistry, screen: ScreenSize) -> LayoutDocument {
        self.screen = screen;
        let mut document = match LayoutDocument::read(&self.path) {
            Ok(document) => document,
            Err(crate::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No layout at {}; starting empty", self.path.display());
                LayoutDocument::empty(screen)
            }
            Err(e) => {
                tracing::warn!(
                    "Unreadable layout {}: {}; starting empty",
                    self.path.display(),
                    e
                );
                LayoutDocument::empty(screen)
            }
        };

        let migrated = document.migrate(screen);
        let from = document.saved_screen();
        for record in &document.elements {
            if record.size_only {
                registry.update_size(&record.id, record.size());
                continue;
            }
            let offset = scale_offset(record.anchor, record.offset(), from, screen);
            registry.update_position(&record.id, record.anchor, offset, record.size());
        }
        tracing::info!(
            "Loaded {} layout records from {}",
            document.elements.len(),
            self.path.display()
        );

        self.clean_revision = Some(registry.revision());
        self.forced_dirty = migrated;
        document
    }

    /// Snapshot the registry (including pending records) into a document.
    pub fn snapshot(&self, registry: &AnchorRegistry, screen: ScreenSize) -> LayoutDocument {
        let mut document = LayoutDocument::empty(screen);
        for entry in registry.entries() {
            document.elements.push(ElementRecord {
                id: entry.id.clone(),
                anchor: entry.anchor,
                offset_x: entry.offset.x,
                offset_y: entry.offset.y,
                width: entry.size.x,
                height: entry.size.y,
                size_only: false,
            });
        }
        for (id, pending) in registry.pending_entries() {
            let size = pending.size.unwrap_or(Vec2::ZERO);
            // Anchor and offset are always set together.
            let position = pending.anchor.zip(pending.offset);
            if position.is_none() && size.is_zero() {
                continue;
            }
            let (anchor, offset) = position.unwrap_or_default();
            document.elements.push(ElementRecord {
                id: id.clone(),
                anchor,
                offset_x: offset.x,
                offset_y: offset.y,
                width: size.x,
                height: size.y,
                size_only: position.is_none(),
            });
        }
        document.elements.sort_by(|a, b| a.id.cmp(&b.id));
        document
    }

    /// Overwrite the document with the current registry contents.
    pub fn save(&mut self, registry: &AnchorRegistry) -> crate::Result<()> {
        let document = self.snapshot(registry, self.screen);
        document.write_atomic(&self.path)?;
        tracing::info!(
            "Saved {} layout records to {}",
            document.elements.len(),
            self.path.display()
        );
        self.clean_revision = Some(registry.revision());
        self.forced_dirty = false;
        Ok(())
    }

    /// Rescale every entry to `new_screen` and push results onto live nodes.
    ///
    /// Returns the number of live nodes updated.
    pub fn reapply_positions(&mut self, registry: &mut AnchorRegistry, new_screen: ScreenSize) -> usize {
        let from = self.screen;
        if from != new_screen {
            let mut moves: Vec<(String, AnchorPoint, Vec2)> = registry
                .entries()
                .map(|e| (e.id.clone(), e.anchor, e.offset))
                .collect();
            moves.extend(registry.pending_entries().filter_map(|(id, p)| {
                Some((id.clone(), p.anchor?, p.offset?))
            }));
            // Zero size leaves stored sizes untouched.
            for (id, anchor, offset) in moves {
                let offset = scale_offset(anchor, offset, from, new_screen);
                registry.update_position(&id, anchor, offset, Vec2::ZERO);
            }
            tracing::info!(
                "Display resized {}x{} -> {}x{}",
                from.width, from.height, new_screen.width, new_screen.height
            );
        }
        self.screen = new_screen;
        registry.reapply_all()
    }

    /// Whether the registry changed since the last load or save.
    pub fn is_dirty(&self, registry: &AnchorRegistry) -> bool {
        self.forced_dirty || self.clean_revision != Some(registry.revision())
    }

    pub fn mark_dirty(&mut self) {
        self.forced_dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HD: ScreenSize = ScreenSize::new(1920, 1080);
    const UHD: ScreenSize = ScreenSize::new(3840, 2160);

    #[test]
    fn centered_axes_scale_edge_axes_do_not() {
        let offset = Vec2::new(100.0, 40.0);
        assert_eq!(scale_offset(AnchorPoint::Center, offset, HD, UHD), Vec2::new(200.0, 80.0));
        assert_eq!(scale_offset(AnchorPoint::Left, offset, HD, UHD), Vec2::new(100.0, 80.0));
        assert_eq!(scale_offset(AnchorPoint::Top, offset, HD, UHD), Vec2::new(200.0, 40.0));
        assert_eq!(scale_offset(AnchorPoint::BottomRight, offset, HD, UHD), offset);
    }

    #[test]
    fn zero_saved_resolution_leaves_offsets_alone() {
        let offset = Vec2::new(100.0, 40.0);
        let unknown = ScreenSize::new(0, 0);
        assert_eq!(scale_offset(AnchorPoint::Center, offset, unknown, UHD), offset);
    }

    #[test]
    fn document_format() {
        let mut document = LayoutDocument::empty(HD);
        document.elements.push(ElementRecord {
            id: "minimap".to_string(),
            anchor: AnchorPoint::TopRight,
            offset_x: -10.0,
            offset_y: -10.0,
            width: 200.0,
            height: 200.0,
            size_only: false,
        });
        let json = serde_json::to_string_pretty(&document).unwrap();
        insta::assert_snapshot!(json, @r#"
        {
          "formatVersion": 2,
          "savedScreenWidth": 1920,
          "savedScreenHeight": 1080,
          "elements": [
            {
              "id": "minimap",
              "anchor": "TopRight",
              "offsetX": -10.0,
              "offsetY": -10.0,
              "width": 200.0,
              "height": 200.0
            }
          ]
        }
        "#);
    }

    #[test]
    fn legacy_document_is_migrated_and_dirty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.json");
        fs::write(
            &path,
            r#"{ "formatVersion": 1, "elements": [
                { "id": "bag", "anchor": "Center", "offsetX": 50.0, "offsetY": 0.0, "width": 0.0, "height": 0.0 }
            ] }"#,
        )
        .unwrap();

        let mut store = LayoutStore::new(&path);
        let mut registry = AnchorRegistry::default();
        let document = store.load(&mut registry, UHD);

        assert_eq!(document.format_version, CURRENT_FORMAT_VERSION);
        assert_eq!(document.saved_screen(), UHD);
        assert!(store.is_dirty(&registry));
        // Stamped with the current size, so nothing is rescaled.
        assert_eq!(registry.pending("bag").unwrap().offset, Some(Vec2::new(50.0, 0.0)));
    }

    #[test]
    fn corrupt_document_falls_back_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.json");
        fs::write(&path, "{ this is not json").unwrap();

        let mut store = LayoutStore::new(&path);
        let mut registry = AnchorRegistry::default();
        let document = store.load(&mut registry, HD);

        assert!(document.elements.is_empty());
        assert_eq!(document.saved_screen(), HD);
        assert!(!store.is_dirty(&registry));
    }

    #[test]
    fn save_includes_pending_records_sorted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join("layout.json");
        let mut store = LayoutStore::new(&path);
        let mut registry = AnchorRegistry::default();
        store.load(&mut registry, HD);

        registry.register("zeta", AnchorPoint::Top, Vec2::ZERO, Vec2::new(100.0, 30.0));
        registry.update_position("alpha", AnchorPoint::Left, Vec2::new(12.0, 0.0), Vec2::ZERO);
        assert!(store.is_dirty(&registry));
        store.save(&registry).unwrap();
        assert!(!store.is_dirty(&registry));

        let document = LayoutDocument::read(&path).unwrap();
        let ids: Vec<&str> = document.elements.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["alpha", "zeta"]);
        assert_eq!(document.elements[0].size(), Vec2::ZERO);
    }

    #[test]
    fn size_only_pending_record_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.json");
        let mut store = LayoutStore::new(&path);
        let mut registry = AnchorRegistry::default();
        store.load(&mut registry, HD);

        assert!(!registry.update_size("late", Vec2::new(300.0, 300.0)));
        store.save(&registry).unwrap();
        let document = LayoutDocument::read(&path).unwrap();
        assert!(document.elements[0].size_only);

        // Reloaded at another resolution: size only, nothing positional.
        let mut store = LayoutStore::new(&path);
        let mut registry = AnchorRegistry::default();
        store.load(&mut registry, UHD);
        let pending = registry.pending("late").copied().unwrap();
        assert_eq!(pending.size, Some(Vec2::new(300.0, 300.0)));
        assert_eq!(pending.anchor, None);

        let entry = registry.register("late", AnchorPoint::TopLeft, Vec2::new(5.0, -5.0), Vec2::new(80.0, 80.0));
        assert_eq!(entry.anchor, AnchorPoint::TopLeft);
        assert_eq!(entry.offset, Vec2::new(5.0, -5.0));
        assert_eq!(entry.size, Vec2::new(300.0, 300.0));
    }

    #[test]
    fn failed_write_is_reported() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes the final rename fail.
        let path = dir.path().join("layout.json");
        fs::create_dir_all(path.join("occupied")).unwrap();
        let mut store = LayoutStore::new(&path);
        let registry = AnchorRegistry::default();
        assert!(store.save(&registry).is_err());
    }
}
