//! OCR table consolidation.
//!
//! Downstream OCR tooling writes one CSV per extracted field into the
//! `OCRs/` directory, each keyed by `file_name`. This service folds
//! them into a single wide table with a full outer join: every key
//! from every table gets a row, and cells a table has no value for
//! stay empty.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::tables::{self, MergedTable, OcrTable, TableError, MERGE_KEY};

/// Result of one merge run.
#[derive(Debug)]
pub struct MergeOutcome {
    /// `(table name, row count)` in consumption order.
    pub table_rows: Vec<(String, usize)>,
    /// Tables skipped for lacking the key column.
    pub skipped: Vec<PathBuf>,
    /// Rows in the merged output.
    pub rows: usize,
}

/// Merge every `*.csv` under `ocr_dir` and write the result to
/// `output`. Tables are consumed in lexicographic filename order so
/// the output column order is reproducible.
pub fn merge_directory(ocr_dir: &Path, output: &Path) -> anyhow::Result<MergeOutcome> {
    let paths = list_csvs(ocr_dir)
        .with_context(|| format!("reading OCR table directory {}", ocr_dir.display()))?;
    if paths.is_empty() {
        anyhow::bail!("no OCR tables (*.csv) found in {}", ocr_dir.display());
    }

    let mut loaded = Vec::new();
    let mut skipped = Vec::new();
    for path in &paths {
        match tables::read_ocr_table(path) {
            Ok(table) => loaded.push(table),
            Err(TableError::MissingKey { .. }) => {
                tracing::warn!(
                    "{}: no '{}' column, table skipped",
                    path.display(),
                    MERGE_KEY
                );
                skipped.push(path.clone());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        }
    }

    let table_rows = loaded
        .iter()
        .map(|t| (t.name.clone(), t.rows.len()))
        .collect();

    let merged = outer_join(&loaded);
    tables::write_merged(output, &merged)
        .with_context(|| format!("writing {}", output.display()))?;

    Ok(MergeOutcome {
        table_rows,
        skipped,
        rows: merged.rows.len(),
    })
}

fn list_csvs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// Full outer join over the key column.
///
/// Row order follows first appearance of each key; column order is
/// the key column followed by each table's value columns in
/// consumption order. A key repeated within one table keeps its first
/// occurrence.
fn outer_join(tables: &[OcrTable]) -> MergedTable {
    let mut columns = vec![MERGE_KEY.to_string()];
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row_index: HashMap<String, usize> = HashMap::new();

    for table in tables {
        let offset = columns.len();
        columns.extend(table.value_columns.iter().cloned());
        for row in &mut rows {
            row.resize(columns.len(), String::new());
        }

        let mut seen = HashSet::new();
        for (key, values) in &table.rows {
            if !seen.insert(key.as_str()) {
                tracing::warn!(
                    "{}: duplicate key '{}', keeping the first occurrence",
                    table.name,
                    key
                );
                continue;
            }

            let index = *row_index.entry(key.clone()).or_insert_with(|| {
                let mut row = vec![key.clone()];
                row.resize(columns.len(), String::new());
                rows.push(row);
                rows.len() - 1
            });
            for (i, value) in values.iter().enumerate() {
                rows[index][offset + i] = value.clone();
            }
        }
    }

    MergedTable { columns, rows }
}
