//! PDF access layer.
//!
//! Everything the extractors need from a PDF goes through the
//! [`PdfReader`] trait: page count, page text, page rasterization and
//! embedded bitmap access. The production implementation binds to the
//! PDFium C library; tests swap in [`mock::MockPdfReader`].

#[cfg(test)]
pub mod mock;
mod pdfium;

use image::DynamicImage;

pub use pdfium::PdfiumReader;

/// Errors from the PDF access layer.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("failed to load the PDFium library: {0}")]
    LibraryLoad(String),

    #[error("failed to open PDF: {0}")]
    DocumentLoad(String),

    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("failed to read text from page {page}: {reason}")]
    Text { page: usize, reason: String },

    #[error("failed to render page {page}: {reason}")]
    Render { page: usize, reason: String },

    #[error("rendering page {page} at {scale}x exceeds the bitmap size limit")]
    RenderTooLarge { page: usize, scale: f32 },

    #[error("failed to decode embedded image on page {page}: {reason}")]
    EmbeddedImage { page: usize, reason: String },
}

/// Read access to one PDF, passed as raw bytes per call.
///
/// Methods take the document bytes rather than holding an open handle:
/// PDFium bindings are not `Send`, so worker threads each open the
/// document for the calls they make and the trait object itself stays
/// freely shareable.
pub trait PdfReader: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self, pdf: &[u8]) -> Result<usize, PdfError>;

    /// Plain text of one page, zero-based index.
    fn page_text(&self, pdf: &[u8], page_index: usize) -> Result<String, PdfError>;

    /// Rasterize one page at `scale` times its size in points.
    fn render_page(&self, pdf: &[u8], page_index: usize, scale: f32)
        -> Result<DynamicImage, PdfError>;

    /// First embedded raster image on a page, at native resolution.
    /// `Ok(None)` when the page carries no image object.
    fn embedded_image(
        &self,
        pdf: &[u8],
        page_index: usize,
    ) -> Result<Option<DynamicImage>, PdfError>;
}
