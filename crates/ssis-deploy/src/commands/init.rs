use crate::logger;
use crate::GlobalOpts;
use anyhow::{bail, Context, Result};
use colored::*;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

const DEFAULT_FILENAME: &str = "ssis-batch.yaml";

/// Skips the overwrite prompt when set
const INIT_YES_ENV: &str = "SSIS_DEPLOY_INIT_YES";

const BATCH_TEMPLATE: &str = r#"# ssis-deploy batch file
# Projects are compiled in the order listed. Relative paths resolve
# against the directory holding this file.

# Variables for substitution (use ${var} or $(var) syntax)
variables:
  source_root: "projects"
  deploy_root: "deploy"

projects:
  - project: ${source_root}/Warehouse/Warehouse.dtproj
    output: ${deploy_root}/Warehouse

  # Falls back to the configured allow-configuration-changes when omitted
  - project: ${source_root}/Staging/Staging.dtproj
    output: $(deploy_root)/Staging
    allow_configuration_changes: false
"#;

/// Write a batch file template
pub fn handle_init(filename: Option<String>, yes: bool, _opts: GlobalOpts) -> Result<()> {
    logger::debug("Handling init command");

    let target_filename = filename.unwrap_or_else(|| DEFAULT_FILENAME.to_string());
    let target_path = Path::new(&target_filename);

    logger::debug(&format!("Target file: {}", target_filename));

    if target_path.exists() {
        let should_skip = yes || std::env::var(INIT_YES_ENV).is_ok();

        if should_skip {
            logger::debug("Skipping overwrite confirmation");
        } else if !confirm_overwrite(&target_filename)? {
            logger::info("Operation cancelled by user");
            println!("Operation cancelled.");
            return Ok(());
        }
    }

    fs::write(target_path, BATCH_TEMPLATE)
        .with_context(|| format!("Failed to create batch file {}", target_filename))?;

    logger::success(&format!("Created batch file: {}", target_filename));
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit {} to list your .dtproj files",
        target_filename.bold()
    );
    println!(
        "  2. Preview the batch: ssis-deploy batch {} --dry-run",
        target_filename
    );
    println!("  3. Compile: ssis-deploy batch {}", target_filename);
    Ok(())
}

fn confirm_overwrite(target_filename: &str) -> Result<bool> {
    print!(
        "{} File '{}' already exists. Overwrite? {} ",
        "?".bold().cyan(),
        target_filename,
        "[y/n] ›".dimmed()
    );
    let _ = io::stdout().flush();

    let mut response = String::new();
    if io::stdin().read_line(&mut response).is_err() {
        bail!("Failed to read input");
    }
    let response = response.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}
