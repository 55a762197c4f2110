//! Merge command.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::services::merge::merge_directory;

/// Merge per-field OCR tables into one wide CSV.
pub async fn cmd_merge(
    settings: &Settings,
    ocr_dir: Option<&Path>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let ocr_dir = ocr_dir.unwrap_or(&settings.ocr_tables_dir);
    let output = output.unwrap_or(&settings.merged_path);

    if !ocr_dir.is_dir() {
        anyhow::bail!("OCR table directory does not exist: {}", ocr_dir.display());
    }

    let outcome = merge_directory(ocr_dir, output)?;

    for (name, rows) in &outcome.table_rows {
        println!("  {} {}: {} row(s)", style("→").dim(), name, rows);
    }
    if !outcome.skipped.is_empty() {
        println!(
            "  {} {} table(s) skipped for lacking a file_name column",
            style("!").yellow(),
            outcome.skipped.len()
        );
    }

    println!(
        "{} Merged {} table(s) into {} ({} rows)",
        style("✓").green(),
        outcome.table_rows.len(),
        output.display(),
        outcome.rows
    );

    Ok(())
}
