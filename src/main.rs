//! ecgslice - ECG exam PDF extraction and anonymization pipeline.
//!
//! A tool for anonymizing two-page ECG exam reports, extracting their
//! metadata into a ledger and cropping named regions out of each page
//! for downstream OCR.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ecgslice::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "ecgslice=info"
    } else {
        "ecgslice=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
