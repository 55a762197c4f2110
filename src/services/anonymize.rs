//! Filename anonymization.
//!
//! Exam files arrive named after patients. Before anything leaves the
//! intake machine they are copied under pseudonymous names derived
//! from a digest of the original filename, and the original-to-alias
//! pairs are appended to a mapping table kept next to the workspace.

use std::path::Path;

use anyhow::Context;
use sha2::{Digest, Sha256};

use crate::models::{discover_pdfs, AnonymizationRecord};
use crate::tables;

/// Hex characters of the digest kept in an anonymized name.
const DIGEST_PREFIX_LEN: usize = 10;

/// Result of one anonymization batch.
#[derive(Debug)]
pub struct AnonymizeOutcome {
    pub copied: usize,
    pub skipped: usize,
    pub records: Vec<AnonymizationRecord>,
}

/// Derive the pseudonymous name for an original filename.
///
/// SHA-256 over the full original name, truncated to ten hex
/// characters, with a fixed `.pdf` extension. Deterministic across
/// runs and machines; the mapping table is the only way back.
pub fn anonymize_name(original: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(original.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}.pdf", &digest[..DIGEST_PREFIX_LEN])
}

/// Copy every PDF under `input_dir` into `output_dir` under its
/// anonymized name and append the pairs to the mapping table.
///
/// Originals are left in place. A file that cannot be copied is
/// logged and skipped; the rest of the batch continues.
pub fn anonymize_batch(
    input_dir: &Path,
    output_dir: &Path,
    mapping_path: &Path,
) -> anyhow::Result<AnonymizeOutcome> {
    let files = discover_pdfs(input_dir)
        .with_context(|| format!("reading input directory {}", input_dir.display()))?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for file in &files {
        let original = file.file_name();
        let anonymized = anonymize_name(&original);
        let dest = output_dir.join(&anonymized);

        if let Err(e) = std::fs::copy(&file.path, &dest) {
            tracing::warn!("skipping {}: {}", original, e);
            skipped += 1;
            continue;
        }

        records.push(AnonymizationRecord {
            original,
            anonymized,
        });
    }

    tables::append_mapping(mapping_path, &records).context("appending anonymization mapping")?;

    Ok(AnonymizeOutcome {
        copied: records.len(),
        skipped,
        records,
    })
}
