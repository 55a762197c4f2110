//! Status command for showing workspace state.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::models::discover_pdfs;
use crate::tables;

/// Show an overview of the workspace.
pub async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    if !settings.input_dir.exists() {
        println!(
            "{} Workspace not initialized. Run 'ecgs init' first.",
            style("!").yellow()
        );
        return Ok(());
    }

    let separator = "─".repeat(70);

    println!();
    println!("{}", style("ecgslice status").bold());
    println!("{}", separator);
    println!("Workspace: {}", settings.workspace_dir.display());
    println!();

    println!("{}", style("EXAMS").cyan().bold());
    for (label, dir) in [
        ("Pending:", &settings.input_dir),
        ("Quarantined:", &settings.quarantine_dir),
        ("Errored:", &settings.errors_dir),
        ("Processed:", &settings.processed_dir),
        ("Anonymized:", &settings.anonymized_dir),
    ] {
        println!("  {:<20} {:>10}", label, format_number(count_pdfs(dir)));
    }
    println!();

    println!("{}", style("TABLES").cyan().bold());
    for (label, path) in [
        ("Ledger:", &settings.ledger_path),
        ("Mapping:", &settings.mapping_path),
        ("Merged:", &settings.merged_path),
    ] {
        let rows = if path.is_file() {
            format!(
                "{} rows",
                format_number(tables::count_rows(path).unwrap_or(0))
            )
        } else {
            "-".to_string()
        };
        println!("  {:<20} {:>10}", label, rows);
    }
    println!();

    println!("{}", style("REGION IMAGES").cyan().bold());
    for region in &settings.regions {
        println!(
            "  {:<20} {:>10}",
            format!("{}:", region.category),
            format_number(count_images(&region.output_dir))
        );
    }
    println!();

    Ok(())
}

fn count_pdfs(dir: &Path) -> usize {
    discover_pdfs(dir).map(|files| files.len()).unwrap_or(0)
}

fn count_images(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| {
                    entry
                        .path()
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
                })
                .count()
        })
        .unwrap_or(0)
}

/// Format a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();
    let chunks: Vec<_> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();
    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_groups_thousands() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_count_images_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_ecg.png"), b"x").unwrap();
        std::fs::write(dir.path().join("b_ecg.PNG"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        assert_eq!(count_images(dir.path()), 2);
        assert_eq!(count_images(&dir.path().join("missing")), 0);
    }
}
