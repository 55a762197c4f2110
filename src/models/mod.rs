//! Data models for the extraction pipeline.

mod document;
mod record;
mod region;

pub use document::{discover_pdfs, DocumentFile};
pub use record::{AnonymizationRecord, MetadataRecord};
pub use region::{CropBox, PixelRect, RegionSpec};
