use crate::config_manager::{manifest_extension_value, Config};
use crate::logger;
use crate::GlobalOpts;
use anyhow::{Context, Result};
use clap::Args;
use ssis_manifest::{ArtifactKind, CompiledManifest, ProjectSpec};
use std::path::PathBuf;

/// Compile a single project descriptor
#[derive(Args, Debug, Clone)]
pub struct BuildCommand {
    /// Project descriptor (.dtproj)
    pub project: PathBuf,

    /// Directory receiving the artifacts and the manifest
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Value recorded as AllowConfigurationChanges (defaults to the config, then true)
    #[arg(long, value_name = "BOOL")]
    pub allow_configuration_changes: Option<bool>,

    /// Manifest file extension, overriding the config
    #[arg(long, value_name = "EXT")]
    pub manifest_extension: Option<String>,
}

pub fn handle_build(cmd: BuildCommand, _opts: GlobalOpts) -> Result<()> {
    let config = Config::load().context("Failed to load config")?;
    let mut compiler = config.compiler();
    if let Some(extension) = cmd.manifest_extension {
        compiler = compiler.with_manifest_extension(manifest_extension_value(&extension)?);
    }

    let spec = ProjectSpec {
        allow_configuration_changes: cmd
            .allow_configuration_changes
            .unwrap_or_else(|| config.allow_configuration_changes()),
        project: cmd.project,
        output: cmd.output,
    };
    logger::debug(&format!("Building {:?}", spec));

    logger::spinner_start(&format!("Compiling {}", spec.project.display()));
    match compiler.compile(&spec) {
        Ok(compiled) => {
            logger::spinner_success(&summary(&compiled));
            println!("{}", compiled.path.display());
            Ok(())
        }
        Err(err) => {
            logger::spinner_error(&spec.project.display().to_string());
            let kind = err.kind();
            Err(anyhow::Error::new(err).context(format!("Build failed [{}]", kind)))
        }
    }
}

/// Short description of a compiled manifest for user output
pub fn summary(compiled: &CompiledManifest) -> String {
    let document = &compiled.document;
    format!(
        "Wrote {} ({} packages, {} configuration files, {} miscellaneous files)",
        compiled.path.display(),
        document.count(ArtifactKind::Package),
        document.count(ArtifactKind::ConfigurationFile),
        document.count(ArtifactKind::MiscellaneousFile),
    )
}
