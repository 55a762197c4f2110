//! Per-document extraction stages: gate, metadata fields, region crops.

pub mod gate;
pub mod metadata;
pub mod regions;

pub use gate::{validate, GateOutcome, GatedDocument};
pub use metadata::extract_metadata;
pub use regions::{extract_regions, ExtractionResult};

use crate::models::PixelRect;
use crate::pdf::PdfError;

/// Errors raised while extracting from one document.
///
/// Region extraction catches these per region and moves on; the gate and
/// the metadata stage let them propagate to the per-document error
/// boundary.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("crop {rect:?} outside image bounds {image_width}x{image_height}")]
    CropOutOfBounds {
        rect: PixelRect,
        image_width: u32,
        image_height: u32,
    },

    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
