//! Configuration management for the extraction workspace.
//!
//! `Settings` is the resolved runtime context every service receives.
//! `Config` is the optional on-disk file (TOML, YAML or JSON, picked
//! by extension) layered over the defaults: command line flags win
//! over the file, the file wins over the built-ins.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::models::{CropBox, RegionSpec};

/// Hard cap on pipeline workers. Rasterizing is memory-hungry; more
/// concurrent pages than this has no throughput left to win.
pub const MAX_WORKERS: usize = 8;

/// Pages a valid exam must have: metadata page plus waveform page.
const REQUIRED_PAGES: usize = 2;

/// Raster scale used when a region falls back to rendering.
const RENDER_SCALE: f32 = 3.0;

const INPUT_SUBDIR: &str = "Exams";
const QUARANTINE_SUBDIR: &str = "Problems";
const ERRORS_SUBDIR: &str = "Errors";
const PROCESSED_SUBDIR: &str = "Processed";
const ANONYMIZED_SUBDIR: &str = "Exams_anonymized";
const OCR_TABLES_SUBDIR: &str = "OCRs";
const LEDGER_FILENAME: &str = "extracted_data.csv";
const MAPPING_FILENAME: &str = "file_mapping.csv";
const MERGED_FILENAME: &str = "merged_ocr.csv";

/// What happens to an input file after successful extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessDisposition {
    /// Remove the source file. The default: extraction output plus
    /// the anonymized copy make the original redundant.
    Delete,
    /// Move the source into the processed directory.
    Move,
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Workspace root every other path hangs off by default.
    pub workspace_dir: PathBuf,
    /// Where incoming exam PDFs are picked up.
    pub input_dir: PathBuf,
    /// Where documents failing the page gate are moved.
    pub quarantine_dir: PathBuf,
    /// Where documents failing unexpectedly are moved.
    pub errors_dir: PathBuf,
    /// Where successfully processed sources go under the `move`
    /// disposition.
    pub processed_dir: PathBuf,
    /// Where anonymized copies are written.
    pub anonymized_dir: PathBuf,
    /// Where downstream OCR tooling drops its per-field tables.
    pub ocr_tables_dir: PathBuf,
    /// Metadata ledger CSV.
    pub ledger_path: PathBuf,
    /// Original-to-alias mapping CSV.
    pub mapping_path: PathBuf,
    /// Merged OCR output CSV.
    pub merged_path: PathBuf,
    /// Concurrent documents in flight.
    pub workers: usize,
    /// Page count a document must have to pass the gate.
    pub required_pages: usize,
    /// Raster scale for region crops that are not embedded images.
    pub render_scale: f32,
    /// Source file disposition after success.
    pub on_success: SuccessDisposition,
    /// Regions to crop out of each document.
    pub regions: Vec<RegionSpec>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_workspace_dir(".")
    }
}

impl Settings {
    /// Settings with the standard layout rooted at `workspace`.
    pub fn with_workspace_dir(workspace: impl Into<PathBuf>) -> Self {
        let workspace = workspace.into();
        Self {
            input_dir: workspace.join(INPUT_SUBDIR),
            quarantine_dir: workspace.join(QUARANTINE_SUBDIR),
            errors_dir: workspace.join(ERRORS_SUBDIR),
            processed_dir: workspace.join(PROCESSED_SUBDIR),
            anonymized_dir: workspace.join(ANONYMIZED_SUBDIR),
            ocr_tables_dir: workspace.join(OCR_TABLES_SUBDIR),
            ledger_path: workspace.join(LEDGER_FILENAME),
            mapping_path: workspace.join(MAPPING_FILENAME),
            merged_path: workspace.join(MERGED_FILENAME),
            workers: default_workers(),
            required_pages: REQUIRED_PAGES,
            render_scale: RENDER_SCALE,
            on_success: SuccessDisposition::Delete,
            regions: default_regions(&workspace),
            workspace_dir: workspace,
        }
    }

    /// Create the directories a processing run moves files into.
    ///
    /// The input directory is deliberately left out: a missing input
    /// directory is an operator mistake the run should report, not
    /// paper over. Region output directories are created lazily by
    /// the extractor, processed and anonymized directories by their
    /// commands.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [&self.quarantine_dir, &self.errors_dir, &self.ocr_tables_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("failed to create directory '{}': {}", dir.display(), e),
                )
            })?;
        }
        Ok(())
    }

    /// Every directory of the workspace layout, for `init`.
    pub fn all_directories(&self) -> Vec<PathBuf> {
        let mut dirs = vec![
            self.input_dir.clone(),
            self.quarantine_dir.clone(),
            self.errors_dir.clone(),
            self.processed_dir.clone(),
            self.anonymized_dir.clone(),
            self.ocr_tables_dir.clone(),
        ];
        dirs.extend(self.regions.iter().map(|r| r.output_dir.clone()));
        dirs
    }
}

/// Worker count default: available parallelism, capped.
fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(MAX_WORKERS)
}

/// Built-in region set for the two-page exam layout.
///
/// The waveform on page 1 is a scanned bitmap, so its crop box is in
/// the embedded image's own pixels. Every other box is in page
/// points and gets multiplied by the render scale.
pub fn default_regions(workspace: &Path) -> Vec<RegionSpec> {
    let spec = |category: &str, page_index, crop, subdir: &str, prefer_embedded| RegionSpec {
        category: category.to_string(),
        page_index,
        crop,
        output_dir: workspace.join(subdir),
        prefer_embedded,
    };

    vec![
        spec("ecg", 1, CropBox::new(230.0, 680.0, 6790.0, 4432.0), "ECG", true),
        spec("report", 0, CropBox::new(19.0, 350.0, 364.0, 600.0), "Report", false),
        spec("birthday", 0, CropBox::new(98.0, 196.0, 142.0, 204.0), "Birthday", false),
        spec("gender", 0, CropBox::new(323.0, 196.0, 364.0, 204.0), "Gender", false),
        spec("date", 0, CropBox::new(323.0, 243.0, 365.0, 251.0), "Date", false),
        spec("hour", 0, CropBox::new(323.0, 255.0, 346.0, 263.0), "Hour", false),
        spec("speed", 1, CropBox::new(170.0, 560.0, 180.0, 580.0), "Speed", false),
        spec("amplitude", 1, CropBox::new(260.0, 560.0, 276.0, 580.0), "Amplitude", false),
        spec("numbers", 1, CropBox::new(100.0, 40.0, 200.0, 60.0), "Number", false),
    ]
}

/// Configuration file structure. Every field is optional; unset
/// fields keep their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Workspace root. Relative paths resolve against the config
    /// file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "workspace")]
    pub workspace_dir: Option<String>,
    /// Input directory override, resolved against the workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarantine_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymized_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_tables_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_path: Option<String>,
    /// Concurrent documents, clamped to [1, 8].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_pages: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<SuccessDisposition>,
    /// Full replacement for the built-in region set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<RegionConfig>>,
    /// Path of the file this config was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// One region entry in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub category: String,
    pub page_index: usize,
    pub crop: CropBox,
    /// Output directory, resolved against the workspace.
    pub output_dir: String,
    #[serde(default)]
    pub prefer_embedded: bool,
}

impl Config {
    /// Load configuration from a specific file path. The format is
    /// chosen by extension; anything unrecognized is parsed as JSON.
    pub async fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config file {}", path.display()))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("parsing TOML config {}", path.display()))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("parsing YAML config {}", path.display()))?,
            _ => serde_json::from_str(&contents)
                .with_context(|| format!("parsing JSON config {}", path.display()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory for resolving relative paths: the config file's
    /// parent when known.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative or start with `~`.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply this config over `settings`. `base_dir` anchors a
    /// relative workspace; layout overrides resolve against the
    /// workspace itself.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref workspace) = self.workspace_dir {
            *settings = Settings::with_workspace_dir(self.resolve_path(workspace, base_dir));
        }
        let workspace = settings.workspace_dir.clone();

        if let Some(ref dir) = self.input_dir {
            settings.input_dir = self.resolve_path(dir, &workspace);
        }
        if let Some(ref dir) = self.quarantine_dir {
            settings.quarantine_dir = self.resolve_path(dir, &workspace);
        }
        if let Some(ref dir) = self.errors_dir {
            settings.errors_dir = self.resolve_path(dir, &workspace);
        }
        if let Some(ref dir) = self.processed_dir {
            settings.processed_dir = self.resolve_path(dir, &workspace);
        }
        if let Some(ref dir) = self.anonymized_dir {
            settings.anonymized_dir = self.resolve_path(dir, &workspace);
        }
        if let Some(ref dir) = self.ocr_tables_dir {
            settings.ocr_tables_dir = self.resolve_path(dir, &workspace);
        }
        if let Some(ref path) = self.ledger_path {
            settings.ledger_path = self.resolve_path(path, &workspace);
        }
        if let Some(ref path) = self.mapping_path {
            settings.mapping_path = self.resolve_path(path, &workspace);
        }
        if let Some(ref path) = self.merged_path {
            settings.merged_path = self.resolve_path(path, &workspace);
        }
        if let Some(workers) = self.workers {
            settings.workers = workers.clamp(1, MAX_WORKERS);
        }
        if let Some(pages) = self.required_pages {
            settings.required_pages = pages;
        }
        if let Some(scale) = self.render_scale {
            settings.render_scale = scale;
        }
        if let Some(disposition) = self.on_success {
            settings.on_success = disposition;
        }
        if let Some(ref regions) = self.regions {
            settings.regions = regions
                .iter()
                .map(|r| RegionSpec {
                    category: r.category.clone(),
                    page_index: r.page_index,
                    crop: r.crop,
                    output_dir: self.resolve_path(&r.output_dir, &workspace),
                    prefer_embedded: r.prefer_embedded,
                })
                .collect();
        }
    }
}

/// Starter config written by `init`, mirroring the built-in defaults.
pub const STARTER_CONFIG_TOML: &str = r#"# ecgslice workspace configuration.
# Relative paths resolve against this file's directory (workspace_dir)
# or against the workspace (everything else).

workspace_dir = "."

# workers = 8                # concurrent documents, capped at 8
# required_pages = 2         # exams with fewer pages are quarantined
# render_scale = 3.0         # raster factor for non-embedded regions
# on_success = "delete"      # or "move" to keep sources in Processed/

# Replace the built-in region set by listing regions here:
# [[regions]]
# category = "ecg"
# page_index = 1
# crop = [230.0, 680.0, 6790.0, 4432.0]
# output_dir = "ECG"
# prefer_embedded = true
"#;

/// Basenames tried when discovering a config file.
const CONFIG_BASENAMES: [&str; 2] = ["ecgslice", "config"];
const CONFIG_EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];

/// Look for a config file inside `dir`.
fn find_config_in(dir: &Path) -> Option<PathBuf> {
    for basename in CONFIG_BASENAMES {
        for ext in CONFIG_EXTENSIONS {
            let path = dir.join(format!("{}.{}", basename, ext));
            if path.is_file() {
                return Some(path);
            }
        }
    }
    None
}

/// Discover a config file: the workspace override first, then the
/// working directory, then the user config directory.
fn discover_config(workspace_override: Option<&Path>) -> Option<PathBuf> {
    if let Some(workspace) = workspace_override {
        if let Some(path) = find_config_in(workspace) {
            return Some(path);
        }
    }
    if let Some(path) = find_config_in(Path::new(".")) {
        return Some(path);
    }
    dirs::config_dir().and_then(|dir| find_config_in(&dir.join("ecgslice")))
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Workspace root override (`--workspace`), wins over the file.
    pub workspace_dir: Option<PathBuf>,
}

/// Load settings: defaults, then the config file, then CLI overrides.
///
/// An explicitly named config file that fails to load is an error; a
/// broken auto-discovered file is logged and ignored.
pub async fn load_settings(options: LoadOptions) -> anyhow::Result<Settings> {
    let mut settings = match &options.workspace_dir {
        Some(dir) => Settings::with_workspace_dir(dir.clone()),
        None => Settings::default(),
    };

    let config = match &options.config_path {
        Some(path) => Some(Config::load_from_path(path).await?),
        None => match discover_config(options.workspace_dir.as_deref()) {
            Some(path) => match Config::load_from_path(&path).await {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!("ignoring config {}: {:#}", path.display(), e);
                    None
                }
            },
            None => None,
        },
    };

    if let Some(mut config) = config {
        if options.workspace_dir.is_some() {
            // --workspace wins over the file's root.
            config.workspace_dir = None;
        }
        let base_dir = config
            .base_dir()
            .unwrap_or_else(|| PathBuf::from("."));
        config.apply_to_settings(&mut settings, &base_dir);
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_hangs_off_the_workspace() {
        let settings = Settings::with_workspace_dir("/ws");
        assert_eq!(settings.input_dir, Path::new("/ws/Exams"));
        assert_eq!(settings.quarantine_dir, Path::new("/ws/Problems"));
        assert_eq!(settings.errors_dir, Path::new("/ws/Errors"));
        assert_eq!(settings.anonymized_dir, Path::new("/ws/Exams_anonymized"));
        assert_eq!(settings.ocr_tables_dir, Path::new("/ws/OCRs"));
        assert_eq!(settings.ledger_path, Path::new("/ws/extracted_data.csv"));
        assert_eq!(settings.mapping_path, Path::new("/ws/file_mapping.csv"));
        assert_eq!(settings.merged_path, Path::new("/ws/merged_ocr.csv"));
        assert_eq!(settings.required_pages, 2);
        assert_eq!(settings.on_success, SuccessDisposition::Delete);
    }

    #[test]
    fn default_regions_cover_the_exam_layout() {
        let regions = default_regions(Path::new("/ws"));
        assert_eq!(regions.len(), 9);

        let ecg = regions.iter().find(|r| r.category == "ecg").unwrap();
        assert_eq!(ecg.page_index, 1);
        assert!(ecg.prefer_embedded);
        assert_eq!(ecg.output_dir, Path::new("/ws/ECG"));

        // Only the waveform bitmap is cropped from an embedded image.
        assert_eq!(regions.iter().filter(|r| r.prefer_embedded).count(), 1);
        assert_eq!(regions.iter().filter(|r| r.page_index == 0).count(), 5);
        assert_eq!(regions.iter().filter(|r| r.page_index == 1).count(), 4);
    }

    #[test]
    fn worker_default_stays_within_the_cap() {
        let workers = default_workers();
        assert!((1..=MAX_WORKERS).contains(&workers));
    }

    #[test]
    fn ensure_directories_creates_the_run_layout() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_workspace_dir(dir.path().join("ws"));

        settings.ensure_directories().unwrap();

        assert!(settings.quarantine_dir.is_dir());
        assert!(settings.errors_dir.is_dir());
        assert!(settings.ocr_tables_dir.is_dir());
        // A missing input directory stays missing so the run can
        // report it instead of silently processing nothing.
        assert!(!settings.input_dir.exists());
    }

    #[test]
    fn starter_config_parses() {
        let config: Config = toml::from_str(STARTER_CONFIG_TOML).unwrap();
        assert_eq!(config.workspace_dir.as_deref(), Some("."));
        assert!(config.regions.is_none());
    }

    #[tokio::test]
    async fn toml_config_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecgslice.toml");
        std::fs::write(
            &path,
            "workspace_dir = \"lab\"\nworkers = 99\nrequired_pages = 3\non_success = \"move\"\n",
        )
        .unwrap();

        let settings = load_settings(LoadOptions {
            config_path: Some(path),
            workspace_dir: None,
        })
        .await
        .unwrap();

        let workspace = dir.path().join("lab");
        assert_eq!(settings.workspace_dir, workspace);
        assert_eq!(settings.input_dir, workspace.join("Exams"));
        assert_eq!(settings.workers, MAX_WORKERS);
        assert_eq!(settings.required_pages, 3);
        assert_eq!(settings.on_success, SuccessDisposition::Move);
    }

    #[tokio::test]
    async fn cli_workspace_wins_over_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecgslice.toml");
        std::fs::write(&path, "workspace_dir = \"from-file\"\nworkers = 2\n").unwrap();

        let override_dir = dir.path().join("from-flag");
        let settings = load_settings(LoadOptions {
            config_path: Some(path),
            workspace_dir: Some(override_dir.clone()),
        })
        .await
        .unwrap();

        assert_eq!(settings.workspace_dir, override_dir);
        assert_eq!(settings.input_dir, override_dir.join("Exams"));
        // Scalar settings from the file still apply.
        assert_eq!(settings.workers, 2);
    }

    #[tokio::test]
    async fn yaml_and_json_configs_parse() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("ecgslice.yaml");
        std::fs::write(&yaml, "workers: 3\n").unwrap();
        let settings = load_settings(LoadOptions {
            config_path: Some(yaml),
            workspace_dir: None,
        })
        .await
        .unwrap();
        assert_eq!(settings.workers, 3);

        let json = dir.path().join("ecgslice.json");
        std::fs::write(&json, "{\"render_scale\": 2.0}").unwrap();
        let settings = load_settings(LoadOptions {
            config_path: Some(json),
            workspace_dir: None,
        })
        .await
        .unwrap();
        assert_eq!(settings.render_scale, 2.0);
    }

    #[tokio::test]
    async fn region_override_replaces_the_builtin_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecgslice.toml");
        std::fs::write(
            &path,
            "[[regions]]\n\
             category = \"waveform\"\n\
             page_index = 1\n\
             crop = [0.0, 0.0, 100.0, 50.0]\n\
             output_dir = \"Waves\"\n\
             prefer_embedded = true\n",
        )
        .unwrap();

        let workspace = dir.path().join("ws");
        let settings = load_settings(LoadOptions {
            config_path: Some(path),
            workspace_dir: Some(workspace.clone()),
        })
        .await
        .unwrap();

        assert_eq!(settings.regions.len(), 1);
        assert_eq!(settings.regions[0].category, "waveform");
        assert_eq!(settings.regions[0].output_dir, workspace.join("Waves"));
        assert!(settings.regions[0].prefer_embedded);
    }

    #[tokio::test]
    async fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_settings(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            workspace_dir: None,
        })
        .await;
        assert!(result.is_err());
    }
}
