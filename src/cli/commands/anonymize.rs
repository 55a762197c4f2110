//! Anonymize command.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::services::anonymize::anonymize_batch;

/// Copy exams under pseudonymous names and record the mapping.
pub async fn cmd_anonymize(
    settings: &Settings,
    input: Option<&Path>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let input_dir = input.unwrap_or(&settings.input_dir);
    let output_dir = output.unwrap_or(&settings.anonymized_dir);

    if !input_dir.is_dir() {
        anyhow::bail!("input directory does not exist: {}", input_dir.display());
    }

    let outcome = anonymize_batch(input_dir, output_dir, &settings.mapping_path)?;

    if outcome.copied == 0 && outcome.skipped == 0 {
        println!(
            "{} No PDF files in {}",
            style("!").yellow(),
            input_dir.display()
        );
        return Ok(());
    }

    println!(
        "{} Anonymized {} exam(s) into {}",
        style("✓").green(),
        outcome.copied,
        output_dir.display()
    );
    if outcome.skipped > 0 {
        println!(
            "  {} {} file(s) could not be copied, see log",
            style("!").yellow(),
            outcome.skipped
        );
    }
    println!(
        "  {} Mapping: {}",
        style("→").dim(),
        settings.mapping_path.display()
    );

    Ok(())
}
