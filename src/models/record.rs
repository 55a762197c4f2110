//! Rows of the CSV output tables.

use serde::{Deserialize, Serialize};

/// One metadata ledger row, extracted from a PDF's first page.
///
/// Serde renames match the column headers of the downstream analysis
/// sheet, which is why they are Portuguese.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Document identity: input file name without extension.
    #[serde(rename = "File")]
    pub file: String,
    /// Exam date, `null` when the pattern does not match.
    #[serde(rename = "Data")]
    pub exam_date: Option<String>,
    /// Exam time.
    #[serde(rename = "Hora")]
    pub exam_time: Option<String>,
    /// Patient sex.
    #[serde(rename = "Sexo")]
    pub sex: Option<String>,
    /// Patient birth date.
    #[serde(rename = "Data de Nascimento")]
    pub birth_date: Option<String>,
    /// Free-text report section, trimmed.
    #[serde(rename = "Laudo")]
    pub report: Option<String>,
}

/// One anonymization mapping row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymizationRecord {
    #[serde(rename = "Original Filename")]
    pub original: String,
    #[serde(rename = "Anonymized Filename")]
    pub anonymized: String,
}
