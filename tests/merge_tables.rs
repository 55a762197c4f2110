//! End-to-end merge over real CSV files on disk.

use std::path::Path;

use ecgslice::services::merge::merge_directory;
use ecgslice::tables;

fn write(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
}

#[test]
fn merges_field_tables_into_one_wide_csv() {
    let dir = tempfile::tempdir().unwrap();
    let ocr = dir.path().join("OCRs");
    std::fs::create_dir_all(&ocr).unwrap();

    write(
        &ocr.join("Amplitude_ocr.csv"),
        "file_name,amplitude\n099c.pdf,10\n2db9.pdf,20\n",
    );
    write(
        &ocr.join("Gender_ocr.csv"),
        "file_name,gender\n2db9.pdf,F\n9a3f.pdf,M\n",
    );
    // The duplicate key keeps its first row.
    write(
        &ocr.join("Speed_ocr.csv"),
        "file_name,speed\n099c.pdf,25\n099c.pdf,50\n",
    );

    let output = dir.path().join("merged_ocr.csv");
    let outcome = merge_directory(&ocr, &output).unwrap();

    assert_eq!(outcome.rows, 3);
    assert!(outcome.skipped.is_empty());
    assert_eq!(
        outcome.table_rows,
        vec![
            ("Amplitude_ocr".to_string(), 2),
            ("Gender_ocr".to_string(), 2),
            ("Speed_ocr".to_string(), 2),
        ]
    );

    let content = std::fs::read_to_string(&output).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("file_name,amplitude,gender,speed"));
    assert_eq!(lines.next(), Some("099c.pdf,10,,25"));
    assert_eq!(lines.next(), Some("2db9.pdf,20,F,"));
    assert_eq!(lines.next(), Some("9a3f.pdf,,M,"));
}

#[test]
fn remerging_overwrites_the_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let ocr = dir.path().join("OCRs");
    std::fs::create_dir_all(&ocr).unwrap();
    write(&ocr.join("Speed_ocr.csv"), "file_name,speed\na.pdf,25\n");

    let output = dir.path().join("merged_ocr.csv");
    merge_directory(&ocr, &output).unwrap();

    write(
        &ocr.join("Speed_ocr.csv"),
        "file_name,speed\na.pdf,25\nb.pdf,50\n",
    );
    let outcome = merge_directory(&ocr, &output).unwrap();

    assert_eq!(outcome.rows, 2);
    assert_eq!(tables::count_rows(&output).unwrap(), 2);
}
