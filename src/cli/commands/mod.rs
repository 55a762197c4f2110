//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to
//! command-specific modules.

mod anonymize;
mod init;
mod merge;
mod process;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, LoadOptions};

#[derive(Parser)]
#[command(name = "ecgs")]
#[command(about = "ECG exam PDF extraction and anonymization pipeline")]
#[command(version)]
pub struct Cli {
    /// Workspace root (defaults to the current directory)
    #[arg(long, global = true, env = "ECGSLICE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Create the workspace layout and a starter config file
    Init,

    /// Copy exams under pseudonymous names and record the mapping
    Anonymize {
        /// Directory of original exams (default: Exams/ in the workspace)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Directory for anonymized copies (default: Exams_anonymized/)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Gate, extract metadata and crop region images from pending exams
    Process {
        /// Directory of exams to process (default: Exams/ in the workspace)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Concurrent documents (default: from config, capped at 8)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Write the metadata ledger only, no region images
        #[arg(long, conflicts_with = "regions_only")]
        metadata_only: bool,
        /// Write region images only, no metadata ledger
        #[arg(long)]
        regions_only: bool,
        /// Move processed sources to Processed/ instead of deleting them
        #[arg(short, long)]
        keep: bool,
    },

    /// Merge per-field OCR tables into one wide CSV
    Merge {
        /// Directory of OCR tables (default: OCRs/ in the workspace)
        #[arg(long)]
        ocr_dir: Option<PathBuf>,
        /// Output file (default: merged_ocr.csv in the workspace)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show workspace status
    Status,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        workspace_dir: cli.workspace,
    };
    let settings = load_settings(options).await?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Anonymize { input, output } => {
            anonymize::cmd_anonymize(&settings, input.as_deref(), output.as_deref()).await
        }
        Commands::Process {
            input,
            workers,
            metadata_only,
            regions_only,
            keep,
        } => {
            process::cmd_process(
                &settings,
                input.as_deref(),
                workers,
                metadata_only,
                regions_only,
                keep,
            )
            .await
        }
        Commands::Merge { ocr_dir, output } => {
            merge::cmd_merge(&settings, ocr_dir.as_deref(), output.as_deref()).await
        }
        Commands::Status => status::cmd_status(&settings).await,
    }
}
