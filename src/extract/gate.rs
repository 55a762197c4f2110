//! Structural validation in front of the extractors.

use std::path::Path;

use super::ExtractError;
use crate::models::DocumentFile;
use crate::pdf::PdfReader;

/// A document that passed the page-count gate.
///
/// Extractors take this instead of a raw path so validation cannot be
/// skipped; they assume the page count holds.
pub struct GatedDocument {
    pub file: DocumentFile,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Result of gating one document.
pub enum GateOutcome {
    Passed(GatedDocument),
    /// Page count below the requirement. The file has already been
    /// moved into the quarantine directory.
    Quarantined { page_count: usize },
}

/// Check the page count of `file`, quarantining it on failure.
///
/// Runs exactly once per document, before any extraction. Errors
/// reading the document (unreadable path, corrupt file) propagate to
/// the caller's per-document error boundary; they are not quarantine
/// cases.
pub fn validate(
    reader: &dyn PdfReader,
    file: DocumentFile,
    required_pages: usize,
    quarantine_dir: &Path,
) -> Result<GateOutcome, ExtractError> {
    let bytes = std::fs::read(&file.path)?;
    let page_count = reader.page_count(&bytes)?;

    if page_count < required_pages {
        tracing::warn!(
            "{}: {} page(s), expected {}; quarantining",
            file.file_name(),
            page_count,
            required_pages
        );
        file.move_into(quarantine_dir)?;
        return Ok(GateOutcome::Quarantined { page_count });
    }

    Ok(GateOutcome::Passed(GatedDocument {
        file,
        bytes,
        page_count,
    }))
}
