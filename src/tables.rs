//! CSV persistence for the metadata ledger, the anonymization mapping
//! and the per-field OCR tables.
//!
//! The ledger and the mapping are append-only: each batch appends its
//! rows to the existing file, writing the header row only when the
//! file is new or empty, so repeated runs accumulate into one table.

use std::fs::OpenOptions;
use std::path::Path;

use serde::Serialize;

use crate::models::{AnonymizationRecord, MetadataRecord};

/// Header row of the metadata ledger.
pub const LEDGER_HEADERS: [&str; 6] = [
    "File",
    "Data",
    "Hora",
    "Sexo",
    "Data de Nascimento",
    "Laudo",
];

/// Header row of the anonymization mapping.
pub const MAPPING_HEADERS: [&str; 2] = ["Original Filename", "Anonymized Filename"];

/// Key column every OCR table must carry to participate in a merge.
pub const MERGE_KEY: &str = "file_name";

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("{path}: no '{key}' column")]
    MissingKey { path: String, key: String },
}

/// Append metadata rows to the ledger at `path`.
pub fn append_ledger(path: &Path, rows: &[MetadataRecord]) -> Result<(), TableError> {
    append_rows(path, &LEDGER_HEADERS, rows)
}

/// Append mapping rows to the anonymization table at `path`.
pub fn append_mapping(path: &Path, rows: &[AnonymizationRecord]) -> Result<(), TableError> {
    append_rows(path, &MAPPING_HEADERS, rows)
}

fn append_rows<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> Result<(), TableError> {
    if rows.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let write_header = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if write_header {
        writer.write_record(headers)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// One per-field OCR table, read into memory.
#[derive(Debug, Clone)]
pub struct OcrTable {
    /// Table name used in logs, taken from the file stem.
    pub name: String,
    /// Header cells other than the key column, in file order.
    pub value_columns: Vec<String>,
    /// `(key, values)` rows in file order. Duplicate keys are kept
    /// as-is here; the merge decides what to do with them.
    pub rows: Vec<(String, Vec<String>)>,
}

/// Read an OCR table, locating the key column by header name.
pub fn read_ocr_table(path: &Path) -> Result<OcrTable, TableError> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let key_index = headers
        .iter()
        .position(|h| h == MERGE_KEY)
        .ok_or_else(|| TableError::MissingKey {
            path: path.display().to_string(),
            key: MERGE_KEY.to_string(),
        })?;

    let value_columns = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != key_index)
        .map(|(_, h)| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let key = record.get(key_index).unwrap_or("").to_string();
        let values = record
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != key_index)
            .map(|(_, v)| v.to_string())
            .collect();
        rows.push((key, values));
    }

    Ok(OcrTable {
        name,
        value_columns,
        rows,
    })
}

/// The wide table produced by merging OCR tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedTable {
    /// Header row: the key column first, then every value column in
    /// table consumption order.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Write a merged table, replacing any previous file at `path`.
pub fn write_merged(path: &Path, table: &MergedTable) -> Result<(), TableError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Count the data rows of a CSV file, excluding the header.
pub fn count_rows(path: &Path) -> Result<usize, TableError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut count = 0;
    for record in reader.records() {
        record?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(file: &str, sex: Option<&str>) -> MetadataRecord {
        MetadataRecord {
            file: file.to_string(),
            exam_date: Some("01/02/2022".to_string()),
            exam_time: Some("10:30".to_string()),
            sex: sex.map(str::to_string),
            birth_date: Some("03/04/1960".to_string()),
            report: Some("Ritmo sinusal.".to_string()),
        }
    }

    #[test]
    fn ledger_header_written_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extracted_data.csv");

        append_ledger(&path, &[record("a", Some("M"))]).unwrap();
        append_ledger(&path, &[record("b", Some("F")), record("c", Some("M"))]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let header_lines = content
            .lines()
            .filter(|l| l.starts_with("File,"))
            .count();
        assert_eq!(header_lines, 1);
        assert!(content.starts_with("File,Data,Hora,Sexo,Data de Nascimento,Laudo"));
        assert_eq!(count_rows(&path).unwrap(), 3);
    }

    #[test]
    fn missing_fields_serialize_as_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extracted_data.csv");

        append_ledger(&path, &[record("a", None)]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(row.get(0), Some("a"));
        assert_eq!(row.get(3), Some(""));
    }

    #[test]
    fn empty_batch_does_not_create_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extracted_data.csv");

        append_ledger(&path, &[]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn mapping_appends_under_its_own_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file_mapping.csv");

        let rows = vec![AnonymizationRecord {
            original: "exam.pdf".to_string(),
            anonymized: "099c37f7ce.pdf".to_string(),
        }];
        append_mapping(&path, &rows).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Original Filename,Anonymized Filename"));
        assert!(content.contains("exam.pdf,099c37f7ce.pdf"));
    }

    #[test]
    fn reads_ocr_table_with_key_and_value_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Speed_ocr.csv");
        std::fs::write(&path, "file_name,speed,confidence\na.pdf,25,0.99\nb.pdf,50,0.87\n")
            .unwrap();

        let table = read_ocr_table(&path).unwrap();
        assert_eq!(table.name, "Speed_ocr");
        assert_eq!(table.value_columns, vec!["speed", "confidence"]);
        assert_eq!(
            table.rows,
            vec![
                ("a.pdf".to_string(), vec!["25".to_string(), "0.99".to_string()]),
                ("b.pdf".to_string(), vec!["50".to_string(), "0.87".to_string()]),
            ]
        );
    }

    #[test]
    fn key_column_is_found_anywhere_in_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Gender_ocr.csv");
        std::fs::write(&path, "gender,file_name\nM,a.pdf\n").unwrap();

        let table = read_ocr_table(&path).unwrap();
        assert_eq!(table.value_columns, vec!["gender"]);
        assert_eq!(table.rows, vec![("a.pdf".to_string(), vec!["M".to_string()])]);
    }

    #[test]
    fn table_without_key_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, "name,speed\na.pdf,25\n").unwrap();

        let err = read_ocr_table(&path).unwrap_err();
        assert!(matches!(err, TableError::MissingKey { .. }));
    }

    #[test]
    fn merged_table_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged_ocr.csv");

        let table = MergedTable {
            columns: vec!["file_name".to_string(), "speed".to_string()],
            rows: vec![
                vec!["a.pdf".to_string(), "25".to_string()],
                vec!["b.pdf".to_string(), String::new()],
            ],
        };
        write_merged(&path, &table).unwrap();

        assert_eq!(count_rows(&path).unwrap(), 2);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("file_name,speed"));
        assert!(content.contains("b.pdf,"));
    }
}
