//! Named crop regions applied to every gated document.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Rectangle with a top-left origin, as `(x1, y1)` to `(x2, y2)`.
///
/// Units are page points for rasterized crops and pixels of the
/// embedded bitmap for embedded crops; [`CropBox::to_pixels`] maps
/// either into pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct CropBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl CropBox {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Scale all four corners by `scale` and truncate to whole pixels.
    pub fn to_pixels(&self, scale: f32) -> PixelRect {
        let x = (self.x1 * scale) as u32;
        let y = (self.y1 * scale) as u32;
        let x2 = (self.x2 * scale) as u32;
        let y2 = (self.y2 * scale) as u32;
        PixelRect {
            x,
            y,
            width: x2.saturating_sub(x),
            height: y2.saturating_sub(y),
        }
    }
}

impl From<[f32; 4]> for CropBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<CropBox> for [f32; 4] {
    fn from(b: CropBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Crop rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One named crop taken from each document.
///
/// Specs are configuration data shared read-only across a run; adding a
/// category is a config change, not a code change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSpec {
    /// Category name, used for the output file suffix.
    pub category: String,
    /// Zero-based page the crop is taken from.
    pub page_index: usize,
    /// Crop rectangle, `[x1, y1, x2, y2]`.
    pub crop: CropBox,
    /// Directory the extracted image is written to.
    pub output_dir: PathBuf,
    /// Crop the page's embedded bitmap at native resolution instead of
    /// rasterizing. Falls back to rasterizing when no bitmap is found.
    #[serde(default)]
    pub prefer_embedded: bool,
}

impl RegionSpec {
    /// Output path for a document stem: `{output_dir}/{stem}_{category}.png`.
    pub fn output_path(&self, stem: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.png", stem, self.category))
    }
}
