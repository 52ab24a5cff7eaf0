use crate::batch_config::{batch_base_dir, BatchFile};
use crate::commands::build::summary;
use crate::common::describe_batch_error;
use crate::config_manager::Config;
use crate::logger;
use crate::GlobalOpts;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use ssis_manifest::{run_batch_parallel, run_batch_with, BatchEvent};
use std::path::PathBuf;

/// Compile every project listed in a batch file
#[derive(Args, Debug, Clone)]
pub struct BatchCommand {
    /// Batch file (YAML)
    pub file: PathBuf,

    /// Compile projects concurrently (output directories must be distinct)
    #[arg(long)]
    pub parallel: bool,

    /// Print the resolved batch without compiling anything
    #[arg(long)]
    pub dry_run: bool,
}

pub fn handle_batch(cmd: BatchCommand, _opts: GlobalOpts) -> Result<()> {
    let config = Config::load().context("Failed to load config")?;
    let batch = BatchFile::load(&cmd.file)
        .with_context(|| format!("Failed to load batch file {}", cmd.file.display()))?;
    let base_dir = batch_base_dir(&cmd.file);
    let default_allow = config.allow_configuration_changes();
    logger::step(&format!("Batch base directory: {}", base_dir.display()));

    if cmd.dry_run {
        print!("{}", batch.describe(&base_dir, default_allow)?);
        return Ok(());
    }

    let specs = batch.resolve(&base_dir, default_allow)?;
    if specs.is_empty() {
        logger::warn(&format!("{} lists no projects", cmd.file.display()));
        return Ok(());
    }

    let compiler = config.compiler();
    let total = specs.len();
    let result = if cmd.parallel {
        logger::spinner_start(&format!("Compiling {} projects in parallel", total));
        let result = run_batch_parallel(&compiler, &specs);
        match &result {
            Ok(compiled) => {
                logger::spinner_success(&format!("Compiled {} projects in parallel", total));
                for manifest in compiled {
                    logger::success(&summary(manifest));
                }
            }
            Err(_) => logger::spinner_error("Parallel batch failed"),
        }
        result
    } else {
        run_batch_with(&compiler, &specs, |event| match event {
            BatchEvent::Started { index, spec } => logger::spinner_start(&format!(
                "[{}/{}] Compiling {}",
                index + 1,
                total,
                spec.project.display()
            )),
            BatchEvent::Completed { manifest, .. } => logger::spinner_success(&summary(manifest)),
            BatchEvent::Failed { spec, error, .. } => {
                logger::spinner_error(&format!("{}: {}", spec.project.display(), error.kind()));
            }
        })
    };

    match result {
        Ok(compiled) => {
            logger::success(&format!("Compiled {} project(s)", compiled.len()));
            for manifest in &compiled {
                println!("{}", manifest.path.display());
            }
            Ok(())
        }
        Err(err) => Err(anyhow!(describe_batch_error(&err))),
    }
}
