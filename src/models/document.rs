//! Input document handles.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A PDF file sitting in the input directory, identified by its path.
///
/// The file name (without extension) is the document's identity: ledger
/// rows and extracted region images are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub path: PathBuf,
}

impl DocumentFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name including the extension.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without the extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Move this file into `dir`, keeping its name.
    ///
    /// Falls back to copy-and-remove when a plain rename fails, which
    /// happens when `dir` is on a different filesystem.
    pub fn move_into(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let dest = dir.join(self.file_name());
        if fs::rename(&self.path, &dest).is_err() {
            fs::copy(&self.path, &dest)?;
            fs::remove_file(&self.path)?;
        }
        Ok(dest)
    }
}

/// List PDF files directly under `dir`, sorted by path.
///
/// Extension matching is case-insensitive so scanner exports named
/// `.PDF` are picked up too. Subdirectories are not descended into.
pub fn discover_pdfs(dir: &Path) -> io::Result<Vec<DocumentFile>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf {
            files.push(DocumentFile::new(path));
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}
