use crate::GlobalOpts;
use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use ssis_manifest::{read_from_path, ArtifactKind, ManifestDocument};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Print a written deployment manifest
#[derive(Args, Debug, Clone)]
pub struct InspectCommand {
    /// Manifest file to read
    pub manifest: PathBuf,

    /// Print the manifest as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_inspect(cmd: InspectCommand, _opts: GlobalOpts) -> Result<()> {
    let document = read_from_path(&cmd.manifest)
        .with_context(|| format!("Failed to read manifest {}", cmd.manifest.display()))?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        print!("{}", render(&document));
    }
    Ok(())
}

fn render(document: &ManifestDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", document.generated_from_project_name.bold().green());
    let _ = writeln!(out, "  {}: {}", "generated-by".cyan(), document.generated_by);
    let _ = writeln!(
        out,
        "  {}: {}",
        "generated-date".cyan(),
        document.generated_date.to_rfc3339()
    );
    let _ = writeln!(
        out,
        "  {}: {}",
        "allow-configuration-changes".cyan(),
        document.allow_configuration_changes
    );

    for kind in [
        ArtifactKind::Package,
        ArtifactKind::ConfigurationFile,
        ArtifactKind::MiscellaneousFile,
    ] {
        let names: Vec<&str> = document
            .entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.file_name.as_str())
            .collect();
        if names.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{} ({}):", kind, names.len());
        for name in names {
            let _ = writeln!(out, "  {}", name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ssis_manifest::ManifestEntry;

    #[test]
    fn test_render_groups_by_kind() {
        colored::control::set_override(false);
        let Some(date) = Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).single() else {
            return;
        };
        let document = ManifestDocument {
            allow_configuration_changes: false,
            generated_by: "CORP\\builder".to_string(),
            generated_from_project_name: "Warehouse".to_string(),
            generated_date: date,
            entries: vec![
                ManifestEntry {
                    kind: ArtifactKind::Package,
                    file_name: "Load.dtsx".to_string(),
                },
                ManifestEntry {
                    kind: ArtifactKind::MiscellaneousFile,
                    file_name: "readme.txt".to_string(),
                },
            ],
        };

        let text = render(&document);
        assert!(text.starts_with("Warehouse\n"));
        assert!(text.contains("allow-configuration-changes: false"));
        assert!(text.contains("\nPackage (1):\n  Load.dtsx\n"));
        assert!(text.contains("\nMiscellaneousFile (1):\n  readme.txt\n"));
        assert!(!text.contains("ConfigurationFile"));
    }
}
