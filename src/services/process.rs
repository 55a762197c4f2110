//! Batch pipeline orchestration.
//!
//! Fans documents out across a bounded blocking pool, one unit of
//! work per document: gate, metadata, regions, disposition. Emits
//! progress events for the CLI layer and appends the metadata ledger
//! once, after every worker has finished.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use tokio::sync::mpsc;

use crate::config::{Settings, SuccessDisposition};
use crate::extract::{self, ExtractError, GateOutcome};
use crate::models::{DocumentFile, MetadataRecord};
use crate::pdf::PdfReader;
use crate::tables;

/// Which extraction stages a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessMode {
    Full,
    MetadataOnly,
    RegionsOnly,
}

impl ProcessMode {
    fn metadata(self) -> bool {
        !matches!(self, ProcessMode::RegionsOnly)
    }

    fn regions(self) -> bool {
        !matches!(self, ProcessMode::MetadataOnly)
    }
}

/// Per-run knobs passed down from the CLI.
#[derive(Debug, Clone, Copy)]
pub struct ProcessOptions {
    pub workers: usize,
    pub mode: ProcessMode,
    pub disposition: SuccessDisposition,
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Started { total: usize },
    DocumentStarted { file_name: String },
    DocumentProcessed { file_name: String, regions_saved: usize },
    DocumentQuarantined { file_name: String, page_count: usize },
    DocumentErrored { file_name: String, error: String },
}

/// Final tallies of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSummary {
    pub processed: usize,
    pub quarantined: usize,
    pub errored: usize,
    pub ledger_rows: usize,
}

/// How one document settled. Every path through a worker produces
/// exactly one of these, so every input file ends up in exactly one
/// place.
enum DocumentOutcome {
    Processed {
        regions_saved: usize,
        record: Option<MetadataRecord>,
    },
    Quarantined {
        page_count: usize,
    },
    Errored {
        error: String,
    },
}

/// Drives a batch of documents through gate, extraction and
/// disposition on a bounded `spawn_blocking` pool.
pub struct PipelineService {
    reader: Arc<dyn PdfReader>,
    settings: Arc<Settings>,
}

impl PipelineService {
    pub fn new(reader: Arc<dyn PdfReader>, settings: Settings) -> Self {
        Self {
            reader,
            settings: Arc::new(settings),
        }
    }

    /// Process `files` to completion and return the tallies.
    ///
    /// Ledger rows are buffered in memory and appended in one write
    /// after the pool drains, so a crash mid-batch never leaves a
    /// half-written ledger row behind.
    pub async fn run(
        &self,
        files: Vec<DocumentFile>,
        options: ProcessOptions,
        event_tx: mpsc::Sender<PipelineEvent>,
    ) -> anyhow::Result<PipelineSummary> {
        let workers = options.workers.max(1);

        let _ = event_tx
            .send(PipelineEvent::Started { total: files.len() })
            .await;

        let processed = Arc::new(AtomicUsize::new(0));
        let quarantined = Arc::new(AtomicUsize::new(0));
        let errored = Arc::new(AtomicUsize::new(0));
        let rows = Arc::new(Mutex::new(Vec::<MetadataRecord>::new()));

        let mut handles = Vec::new();

        for file in files {
            let reader = self.reader.clone();
            let settings = self.settings.clone();
            let processed = processed.clone();
            let quarantined = quarantined.clone();
            let errored = errored.clone();
            let rows = rows.clone();
            let event_tx = event_tx.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let file_name = file.file_name();
                let _ = futures::executor::block_on(
                    event_tx.send(PipelineEvent::DocumentStarted {
                        file_name: file_name.clone(),
                    }),
                );

                let event = match process_document(reader.as_ref(), &settings, options, &file) {
                    DocumentOutcome::Processed {
                        regions_saved,
                        record,
                    } => {
                        processed.fetch_add(1, Ordering::Relaxed);
                        if let Some(record) = record {
                            rows.lock().unwrap_or_else(|p| p.into_inner()).push(record);
                        }
                        PipelineEvent::DocumentProcessed {
                            file_name,
                            regions_saved,
                        }
                    }
                    DocumentOutcome::Quarantined { page_count } => {
                        quarantined.fetch_add(1, Ordering::Relaxed);
                        PipelineEvent::DocumentQuarantined {
                            file_name,
                            page_count,
                        }
                    }
                    DocumentOutcome::Errored { error } => {
                        errored.fetch_add(1, Ordering::Relaxed);
                        PipelineEvent::DocumentErrored { file_name, error }
                    }
                };
                let _ = futures::executor::block_on(event_tx.send(event));
            });

            handles.push(handle);

            // Keep at most `workers` documents in flight.
            if handles.len() >= workers {
                for h in handles.drain(..) {
                    let _ = h.await;
                }
            }
        }

        for h in handles {
            let _ = h.await;
        }

        let buffered =
            std::mem::take(&mut *rows.lock().unwrap_or_else(|p| p.into_inner()));
        if !buffered.is_empty() {
            tables::append_ledger(&self.settings.ledger_path, &buffered)
                .context("appending metadata ledger")?;
        }

        Ok(PipelineSummary {
            processed: processed.load(Ordering::Relaxed),
            quarantined: quarantined.load(Ordering::Relaxed),
            errored: errored.load(Ordering::Relaxed),
            ledger_rows: buffered.len(),
        })
    }
}

/// One document, gate to disposition. Failures are converted into an
/// outcome here so a single bad file can never abort the batch.
fn process_document(
    reader: &dyn PdfReader,
    settings: &Settings,
    options: ProcessOptions,
    file: &DocumentFile,
) -> DocumentOutcome {
    match run_document(reader, settings, options, file) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!("{}: {}", file.file_name(), e);
            if let Err(move_err) = file.move_into(&settings.errors_dir) {
                tracing::warn!(
                    "{}: could not move to the error directory: {}",
                    file.file_name(),
                    move_err
                );
            }
            DocumentOutcome::Errored {
                error: e.to_string(),
            }
        }
    }
}

fn run_document(
    reader: &dyn PdfReader,
    settings: &Settings,
    options: ProcessOptions,
    file: &DocumentFile,
) -> Result<DocumentOutcome, ExtractError> {
    let doc = match extract::validate(
        reader,
        file.clone(),
        settings.required_pages,
        &settings.quarantine_dir,
    )? {
        GateOutcome::Passed(doc) => doc,
        GateOutcome::Quarantined { page_count } => {
            return Ok(DocumentOutcome::Quarantined { page_count });
        }
    };

    let record = if options.mode.metadata() {
        Some(extract::extract_metadata(reader, &doc)?)
    } else {
        None
    };

    let regions_saved = if options.mode.regions() {
        extract::extract_regions(reader, &doc, &settings.regions, settings.render_scale)
            .iter()
            .filter(|r| r.saved.is_some())
            .count()
    } else {
        0
    };

    // Disposition failures are logged, not fatal: the extraction
    // output already exists and a stale source file is recoverable.
    match options.disposition {
        SuccessDisposition::Delete => {
            if let Err(e) = std::fs::remove_file(&doc.file.path) {
                tracing::warn!("{}: could not remove source: {}", doc.file.file_name(), e);
            }
        }
        SuccessDisposition::Move => {
            if let Err(e) = doc.file.move_into(&settings.processed_dir) {
                tracing::warn!(
                    "{}: could not move to the processed directory: {}",
                    doc.file.file_name(),
                    e
                );
            }
        }
    }

    Ok(DocumentOutcome::Processed {
        regions_saved,
        record,
    })
}
