//! Process command: drive the extraction pipeline over pending exams.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::config::{Settings, SuccessDisposition, MAX_WORKERS};
use crate::models::discover_pdfs;
use crate::pdf::PdfiumReader;
use crate::services::process::{PipelineEvent, PipelineService, ProcessMode, ProcessOptions};

pub async fn cmd_process(
    settings: &Settings,
    input: Option<&Path>,
    workers: Option<usize>,
    metadata_only: bool,
    regions_only: bool,
    keep: bool,
) -> anyhow::Result<()> {
    let input_dir = input.unwrap_or(&settings.input_dir);
    if !input_dir.is_dir() {
        anyhow::bail!("input directory does not exist: {}", input_dir.display());
    }

    let files = discover_pdfs(input_dir)
        .with_context(|| format!("reading input directory {}", input_dir.display()))?;
    if files.is_empty() {
        println!(
            "{} No pending exams in {}",
            style("!").yellow(),
            input_dir.display()
        );
        return Ok(());
    }

    // Fail fast when the PDFium library is missing rather than filing
    // the whole batch into the error directory.
    PdfiumReader::probe().context(
        "PDFium library not found; install libpdfium or set PDFIUM_DYNAMIC_LIB_PATH",
    )?;

    settings.ensure_directories()?;

    let mode = if metadata_only {
        ProcessMode::MetadataOnly
    } else if regions_only {
        ProcessMode::RegionsOnly
    } else {
        ProcessMode::Full
    };
    let disposition = if keep {
        SuccessDisposition::Move
    } else {
        settings.on_success
    };
    let workers = workers.unwrap_or(settings.workers).clamp(1, MAX_WORKERS);

    println!(
        "{} Processing {} exam(s) with {} worker(s)",
        style("→").cyan(),
        files.len(),
        workers
    );

    // Create event channel for progress tracking
    let (event_tx, mut event_rx) = mpsc::channel::<PipelineEvent>(100);

    // State for progress bar
    let pb = Arc::new(tokio::sync::Mutex::new(None::<ProgressBar>));
    let pb_clone = pb.clone();

    // Spawn event handler for UI
    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                PipelineEvent::Started { total } => {
                    let progress = ProgressBar::new(total as u64);
                    progress.set_style(
                        ProgressStyle::default_bar()
                            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                            .unwrap()
                            .progress_chars("█▓░"),
                    );
                    progress.set_message("Processing exams...");
                    *pb_clone.lock().await = Some(progress);
                }
                PipelineEvent::DocumentStarted { file_name } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        progress.set_message(file_name);
                    }
                }
                PipelineEvent::DocumentProcessed { .. } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        progress.inc(1);
                    }
                }
                PipelineEvent::DocumentQuarantined {
                    file_name,
                    page_count,
                } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        progress.suspend(|| {
                            eprintln!(
                                "  {} {} has {} page(s), moved to quarantine",
                                style("!").yellow(),
                                file_name,
                                page_count
                            );
                        });
                        progress.inc(1);
                    } else {
                        eprintln!(
                            "  {} {} has {} page(s), moved to quarantine",
                            style("!").yellow(),
                            file_name,
                            page_count
                        );
                    }
                }
                PipelineEvent::DocumentErrored { file_name, error } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        progress.suspend(|| {
                            eprintln!("  {} {} failed: {}", style("✗").red(), file_name, error);
                        });
                        progress.inc(1);
                    } else {
                        eprintln!("  {} {} failed: {}", style("✗").red(), file_name, error);
                    }
                }
            }
        }

        if let Some(ref progress) = *pb_clone.lock().await {
            progress.finish_and_clear();
        }
    });

    let service = PipelineService::new(Arc::new(PdfiumReader::new()), settings.clone());
    let options = ProcessOptions {
        workers,
        mode,
        disposition,
    };
    let summary = service.run(files, options, event_tx).await?;

    // Wait for event handler to finish
    if let Err(e) = event_handler.await {
        tracing::warn!("Event handler task failed: {}", e);
    }

    println!(
        "{} Batch complete: {} processed, {} quarantined, {} errored",
        style("✓").green(),
        summary.processed,
        summary.quarantined,
        summary.errored
    );
    if summary.ledger_rows > 0 {
        println!(
            "  {} {} row(s) appended to {}",
            style("→").dim(),
            summary.ledger_rows,
            settings.ledger_path.display()
        );
    }
    if summary.quarantined > 0 {
        println!(
            "  {} Quarantined exams are in {}",
            style("!").yellow(),
            settings.quarantine_dir.display()
        );
    }
    if summary.errored > 0 {
        println!(
            "  {} Failed exams are in {}",
            style("✗").red(),
            settings.errors_dir.display()
        );
    }

    Ok(())
}
