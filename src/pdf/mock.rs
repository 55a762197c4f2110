//! In-memory [`PdfReader`] for tests.
//!
//! Documents are keyed by their raw bytes, so a test writes marker
//! bytes to disk and registers the same bytes here.

use std::collections::HashMap;

use image::{DynamicImage, Rgba, RgbaImage};

use super::{PdfError, PdfReader};

/// One fake page: text, geometry in points and an optional embedded image.
#[derive(Debug, Clone)]
pub struct MockPage {
    pub text: String,
    pub width_pts: f32,
    pub height_pts: f32,
    pub embedded: Option<DynamicImage>,
    pub fail_render: bool,
}

impl MockPage {
    /// A blank A4 portrait page.
    pub fn blank() -> Self {
        Self {
            text: String::new(),
            width_pts: 595.0,
            height_pts: 842.0,
            embedded: None,
            fail_render: false,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_embedded(mut self, image: DynamicImage) -> Self {
        self.embedded = Some(image);
        self
    }

    pub fn failing_render(mut self) -> Self {
        self.fail_render = true;
        self
    }
}

/// Reader serving registered in-memory documents.
#[derive(Debug, Default)]
pub struct MockPdfReader {
    docs: HashMap<Vec<u8>, Vec<MockPage>>,
}

impl MockPdfReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doc(mut self, bytes: &[u8], pages: Vec<MockPage>) -> Self {
        self.docs.insert(bytes.to_vec(), pages);
        self
    }

    fn doc(&self, pdf: &[u8]) -> Result<&Vec<MockPage>, PdfError> {
        self.docs
            .get(pdf)
            .ok_or_else(|| PdfError::DocumentLoad("unregistered document bytes".to_string()))
    }

    fn page(&self, pdf: &[u8], page_index: usize) -> Result<&MockPage, PdfError> {
        let pages = self.doc(pdf)?;
        pages.get(page_index).ok_or(PdfError::PageOutOfRange {
            page: page_index,
            count: pages.len(),
        })
    }
}

impl PdfReader for MockPdfReader {
    fn page_count(&self, pdf: &[u8]) -> Result<usize, PdfError> {
        Ok(self.doc(pdf)?.len())
    }

    fn page_text(&self, pdf: &[u8], page_index: usize) -> Result<String, PdfError> {
        Ok(self.page(pdf, page_index)?.text.clone())
    }

    fn render_page(
        &self,
        pdf: &[u8],
        page_index: usize,
        scale: f32,
    ) -> Result<DynamicImage, PdfError> {
        let page = self.page(pdf, page_index)?;
        if page.fail_render {
            return Err(PdfError::Render {
                page: page_index,
                reason: "mock render failure".to_string(),
            });
        }
        let width = (page.width_pts * scale).round() as u32;
        let height = (page.height_pts * scale).round() as u32;
        Ok(solid_image(width, height))
    }

    fn embedded_image(
        &self,
        pdf: &[u8],
        page_index: usize,
    ) -> Result<Option<DynamicImage>, PdfError> {
        Ok(self.page(pdf, page_index)?.embedded.clone())
    }
}

/// A solid light-gray RGBA image of the given size.
pub fn solid_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([200, 200, 200, 255]),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_serves_registered_doc() {
        let reader = MockPdfReader::new().with_doc(
            b"doc-a",
            vec![MockPage::blank().with_text("page zero"), MockPage::blank()],
        );

        assert_eq!(reader.page_count(b"doc-a").unwrap(), 2);
        assert_eq!(reader.page_text(b"doc-a", 0).unwrap(), "page zero");
    }

    #[test]
    fn test_mock_rejects_unknown_bytes() {
        let reader = MockPdfReader::new();
        assert!(matches!(
            reader.page_count(b"who"),
            Err(PdfError::DocumentLoad(_))
        ));
    }

    #[test]
    fn test_mock_render_scales_page_points() {
        let reader = MockPdfReader::new().with_doc(b"d", vec![MockPage::blank()]);
        let image = reader.render_page(b"d", 0, 3.0).unwrap();
        assert_eq!(image.width(), 1785);
        assert_eq!(image.height(), 2526);
    }

    #[test]
    fn test_mock_page_out_of_range() {
        let reader = MockPdfReader::new().with_doc(b"d", vec![MockPage::blank()]);
        assert!(matches!(
            reader.page_text(b"d", 1),
            Err(PdfError::PageOutOfRange { page: 1, count: 1 })
        ));
    }
}
