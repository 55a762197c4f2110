//! Geometric region extraction.

use std::path::PathBuf;

use image::DynamicImage;

use super::gate::GatedDocument;
use super::ExtractError;
use crate::models::{PixelRect, RegionSpec};
use crate::pdf::PdfReader;

/// Outcome of one (document, spec) pair.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub category: String,
    /// Saved image path; `None` when this region failed and was logged.
    pub saved: Option<PathBuf>,
}

/// Crop every spec out of `doc`.
///
/// A failing spec is logged and yields `saved: None`; the remaining
/// specs still run. `scale` applies to rasterized crops only; embedded
/// crops use the bitmap's native coordinates.
pub fn extract_regions(
    reader: &dyn PdfReader,
    doc: &GatedDocument,
    specs: &[RegionSpec],
    scale: f32,
) -> Vec<ExtractionResult> {
    specs
        .iter()
        .map(|spec| {
            let saved = match extract_region(reader, doc, spec, scale) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(
                        "{}: region '{}' failed: {}",
                        doc.file.file_name(),
                        spec.category,
                        e
                    );
                    None
                }
            };
            ExtractionResult {
                category: spec.category.clone(),
                saved,
            }
        })
        .collect()
}

fn extract_region(
    reader: &dyn PdfReader,
    doc: &GatedDocument,
    spec: &RegionSpec,
    scale: f32,
) -> Result<PathBuf, ExtractError> {
    let (image, rect) = source_image(reader, doc, spec, scale)?;
    let cropped = crop(&image, rect)?;

    std::fs::create_dir_all(&spec.output_dir)?;
    let path = spec.output_path(&doc.file.stem());
    cropped.save(&path)?;
    Ok(path)
}

/// Pixel source for a spec: the page's embedded bitmap when preferred
/// and present, otherwise a rasterization of the page. The crop
/// rectangle comes back in the same coordinate space as the image.
fn source_image(
    reader: &dyn PdfReader,
    doc: &GatedDocument,
    spec: &RegionSpec,
    scale: f32,
) -> Result<(DynamicImage, PixelRect), ExtractError> {
    if spec.prefer_embedded {
        if let Some(embedded) = reader.embedded_image(&doc.bytes, spec.page_index)? {
            return Ok((embedded, spec.crop.to_pixels(1.0)));
        }
    }
    let rendered = reader.render_page(&doc.bytes, spec.page_index, scale)?;
    Ok((rendered, spec.crop.to_pixels(scale)))
}

fn crop(image: &DynamicImage, rect: PixelRect) -> Result<DynamicImage, ExtractError> {
    let (width, height) = (image.width(), image.height());
    let in_bounds = rect.width > 0
        && rect.height > 0
        && rect.x.checked_add(rect.width).is_some_and(|x2| x2 <= width)
        && rect.y.checked_add(rect.height).is_some_and(|y2| y2 <= height);

    if !in_bounds {
        return Err(ExtractError::CropOutOfBounds {
            rect,
            image_width: width,
            image_height: height,
        });
    }

    Ok(image.crop_imm(rect.x, rect.y, rect.width, rect.height))
}
