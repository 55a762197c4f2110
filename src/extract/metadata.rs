//! Fixed-pattern field extraction from page-one text.

use std::sync::LazyLock;

use regex::Regex;

use super::gate::GatedDocument;
use crate::models::MetadataRecord;
use crate::pdf::{PdfError, PdfReader};

static EXAM_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Data:\s*(\d{2}/\d{2}/\d{4})").unwrap());
static EXAM_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Hora:\s*(\d{2}:\d{2})").unwrap());
static SEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Sexo:\s*(\w+)").unwrap());
static BIRTH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Data de Nascimento:\s*(\d{2}/\d{2}/\d{4})").unwrap());
// The report body runs from the "Laudo" heading to the fixed footer line.
static REPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Laudo(.*?)Eletrocardiográficos - 2022").unwrap());

/// Pull the metadata fields out of a gated document's first page.
///
/// Each field is matched independently; a pattern that does not match
/// leaves its field `None` without failing the record.
pub fn extract_metadata(
    reader: &dyn PdfReader,
    doc: &GatedDocument,
) -> Result<MetadataRecord, PdfError> {
    let text = reader.page_text(&doc.bytes, 0)?;
    Ok(parse_fields(&doc.file.stem(), &text))
}

fn parse_fields(stem: &str, text: &str) -> MetadataRecord {
    MetadataRecord {
        file: stem.to_string(),
        exam_date: capture(&EXAM_DATE, text),
        exam_time: capture(&EXAM_TIME, text),
        sex: capture(&SEX, text),
        birth_date: capture(&BIRTH_DATE, text),
        report: capture(&REPORT, text).map(|s| s.trim().to_string()),
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
