//! Initialize command.

use console::style;

use crate::config::{Settings, STARTER_CONFIG_TOML};

/// Create the workspace layout and a starter config file.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let mut created = 0;
    for dir in settings.all_directories() {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
            created += 1;
        }
    }

    let config_path = settings.workspace_dir.join("ecgslice.toml");
    if config_path.exists() {
        println!(
            "{} Config already exists: {}",
            style("!").yellow(),
            config_path.display()
        );
    } else {
        std::fs::write(&config_path, STARTER_CONFIG_TOML)?;
        println!(
            "  {} Wrote starter config: {}",
            style("✓").green(),
            config_path.display()
        );
    }

    println!(
        "{} Initialized workspace in {} ({} directories created)",
        style("✓").green(),
        settings.workspace_dir.display(),
        created
    );
    println!();
    println!(
        "Drop exam PDFs into {} and run:",
        settings.input_dir.display()
    );
    println!("  {} anonymize", style("ecgs").cyan());
    println!("  {} process", style("ecgs").cyan());

    Ok(())
}
