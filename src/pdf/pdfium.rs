//! [`PdfReader`] backed by the PDFium C library.

use image::DynamicImage;
use pdfium_render::prelude::*;

use super::{PdfError, PdfReader};

/// Largest bitmap edge we will ask PDFium to render. A two-page exam
/// at the default 3x scale stays well under this; anything above it is
/// a malformed page geometry.
const MAX_DIMENSION_PX: u32 = 4096;

/// Stateless PDFium-backed reader.
///
/// The library is bound per call because `Pdfium` is not `Send` and the
/// worker pool moves work across blocking threads. Binding is a dlopen
/// plus an init call, which is noise next to rasterizing a page.
pub struct PdfiumReader;

impl PdfiumReader {
    pub fn new() -> Self {
        Self
    }

    /// Try binding the library once, without touching a document.
    ///
    /// Lets a batch fail fast with one clear message when PDFium is
    /// missing, instead of filing every input into the error
    /// directory.
    pub fn probe() -> Result<(), PdfError> {
        load_pdfium().map(|_| ())
    }
}

impl Default for PdfiumReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Locate and bind the PDFium dynamic library.
///
/// Order: explicit `PDFIUM_DYNAMIC_LIB_PATH` directory, then next to
/// the current executable, then the system library path.
fn load_pdfium() -> Result<Pdfium, PdfError> {
    if let Ok(dir) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            .map_err(|e| PdfError::LibraryLoad(format!("{} (from PDFIUM_DYNAMIC_LIB_PATH): {}", dir, e)))?;
        return Ok(Pdfium::new(bindings));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            if let Ok(bindings) =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            {
                return Ok(Pdfium::new(bindings));
            }
        }
    }

    let bindings =
        Pdfium::bind_to_system_library().map_err(|e| PdfError::LibraryLoad(e.to_string()))?;
    Ok(Pdfium::new(bindings))
}

fn load_document<'a>(pdfium: &'a Pdfium, pdf: &'a [u8]) -> Result<PdfDocument<'a>, PdfError> {
    pdfium
        .load_pdf_from_byte_slice(pdf, None)
        .map_err(|e| PdfError::DocumentLoad(e.to_string()))
}

/// Validate a zero-based page index against the document's page count.
fn checked_index(page: usize, count: usize) -> Result<u16, PdfError> {
    u16::try_from(page)
        .ok()
        .filter(|_| page < count)
        .ok_or(PdfError::PageOutOfRange { page, count })
}

/// Pixel dimensions for rendering a page at `scale`, or `None` when the
/// result would exceed [`MAX_DIMENSION_PX`] on either edge.
fn render_dimensions(width_pts: f32, height_pts: f32, scale: f32) -> Option<(u32, u32)> {
    let width = (width_pts * scale).round() as u32;
    let height = (height_pts * scale).round() as u32;
    if width == 0 || height == 0 || width > MAX_DIMENSION_PX || height > MAX_DIMENSION_PX {
        return None;
    }
    Some((width, height))
}

impl PdfReader for PdfiumReader {
    fn page_count(&self, pdf: &[u8]) -> Result<usize, PdfError> {
        let pdfium = load_pdfium()?;
        let document = load_document(&pdfium, pdf)?;
        Ok(document.pages().len() as usize)
    }

    fn page_text(&self, pdf: &[u8], page_index: usize) -> Result<String, PdfError> {
        let pdfium = load_pdfium()?;
        let document = load_document(&pdfium, pdf)?;
        let count = document.pages().len() as usize;
        let index = checked_index(page_index, count)?;

        let page = document
            .pages()
            .get(index)
            .map_err(|_| PdfError::PageOutOfRange { page: page_index, count })?;
        let text = page.text().map_err(|e| PdfError::Text {
            page: page_index,
            reason: e.to_string(),
        })?;
        Ok(text.all())
    }

    fn render_page(
        &self,
        pdf: &[u8],
        page_index: usize,
        scale: f32,
    ) -> Result<DynamicImage, PdfError> {
        let pdfium = load_pdfium()?;
        let document = load_document(&pdfium, pdf)?;
        let count = document.pages().len() as usize;
        let index = checked_index(page_index, count)?;

        let page = document
            .pages()
            .get(index)
            .map_err(|_| PdfError::PageOutOfRange { page: page_index, count })?;

        let (width, height) = render_dimensions(page.width().value, page.height().value, scale)
            .ok_or(PdfError::RenderTooLarge {
                page: page_index,
                scale,
            })?;

        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_maximum_height(height as i32);

        let bitmap = page.render_with_config(&config).map_err(|e| PdfError::Render {
            page: page_index,
            reason: e.to_string(),
        })?;

        Ok(bitmap.as_image())
    }

    fn embedded_image(
        &self,
        pdf: &[u8],
        page_index: usize,
    ) -> Result<Option<DynamicImage>, PdfError> {
        let pdfium = load_pdfium()?;
        let document = load_document(&pdfium, pdf)?;
        let count = document.pages().len() as usize;
        let index = checked_index(page_index, count)?;

        let page = document
            .pages()
            .get(index)
            .map_err(|_| PdfError::PageOutOfRange { page: page_index, count })?;

        for object in page.objects().iter() {
            if let Some(image) = object.as_image_object() {
                let decoded = image.get_raw_image().map_err(|e| PdfError::EmbeddedImage {
                    page: page_index,
                    reason: e.to_string(),
                })?;
                return Ok(Some(decoded));
            }
        }

        Ok(None)
    }
}
