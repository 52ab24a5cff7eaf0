//! Core data types for the deployment manifest compiler
//!
//! Artifacts flow from the extractors to the copier as [`ResolvedArtifact`]s and
//! end up in a [`ManifestDocument`] as [`ManifestEntry`]s holding only the
//! destination file name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Root element of a written deployment manifest
pub const MANIFEST_ROOT: &str = "DTSDeploymentManifest";

/// File extension used for manifests unless configured otherwise
pub const DEFAULT_MANIFEST_EXTENSION: &str = "SSISDeploymentManifest";

/// Kind of a deployment artifact, also the element name of its manifest entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    Package,
    ConfigurationFile,
    MiscellaneousFile,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Package => "Package",
            ArtifactKind::ConfigurationFile => "ConfigurationFile",
            ArtifactKind::MiscellaneousFile => "MiscellaneousFile",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Package" => Ok(ArtifactKind::Package),
            "ConfigurationFile" => Ok(ArtifactKind::ConfigurationFile),
            "MiscellaneousFile" => Ok(ArtifactKind::MiscellaneousFile),
            other => Err(format!("unknown artifact kind '{}'", other)),
        }
    }
}

/// A file referenced by a descriptor, not yet copied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub kind: ArtifactKind,
    pub source: PathBuf,
}

/// Artifacts discovered for one project, grouped by kind in discovery order
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    pub packages: Vec<PathBuf>,
    pub configurations: Vec<PathBuf>,
    pub miscellaneous: Vec<PathBuf>,
}

impl ArtifactSet {
    pub fn len(&self) -> usize {
        self.packages.len() + self.configurations.len() + self.miscellaneous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into copy order: packages, then configuration files, then miscellaneous files
    pub fn into_ordered(self) -> Vec<ResolvedArtifact> {
        let tag = |kind: ArtifactKind| move |source: PathBuf| ResolvedArtifact { kind, source };

        let mut ordered = Vec::with_capacity(self.len());
        ordered.extend(self.packages.into_iter().map(tag(ArtifactKind::Package)));
        ordered.extend(
            self.configurations
                .into_iter()
                .map(tag(ArtifactKind::ConfigurationFile)),
        );
        ordered.extend(
            self.miscellaneous
                .into_iter()
                .map(tag(ArtifactKind::MiscellaneousFile)),
        );
        ordered
    }
}

/// One artifact line of a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub kind: ArtifactKind,
    pub file_name: String,
}

/// The manifest written for one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDocument {
    pub allow_configuration_changes: bool,
    pub generated_by: String,
    pub generated_from_project_name: String,
    pub generated_date: DateTime<Utc>,
    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
}

impl ManifestDocument {
    /// Count entries of a given kind
    pub fn count(&self, kind: ArtifactKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }
}

/// One unit of batch input: a project descriptor and where its deployment goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub project: PathBuf,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_allow_configuration_changes")]
    pub allow_configuration_changes: bool,
}

fn default_allow_configuration_changes() -> bool {
    true
}

impl ProjectSpec {
    pub fn new(project: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        ProjectSpec {
            project: project.into(),
            output: Some(output.into()),
            allow_configuration_changes: true,
        }
    }

    pub fn with_allow_configuration_changes(mut self, allow: bool) -> Self {
        self.allow_configuration_changes = allow;
        self
    }

    /// The configured output directory; an empty path counts as missing
    pub fn output_dir(&self) -> Option<&Path> {
        self.output
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// Result of compiling one project
#[derive(Debug, Clone)]
pub struct CompiledManifest {
    pub path: PathBuf,
    pub document: ManifestDocument,
}

#[cfg(test)]
mod tests {
    use crate::types::*;

    #[test]
    fn test_artifact_set_orders_by_kind() {
        let set = ArtifactSet {
            packages: vec![PathBuf::from("b.dtsx"), PathBuf::from("a.dtsx")],
            configurations: vec![PathBuf::from("a.dtsConfig")],
            miscellaneous: vec![PathBuf::from("readme.txt")],
        };
        assert_eq!(set.len(), 4);

        let ordered = set.into_ordered();
        let kinds: Vec<ArtifactKind> = ordered.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ArtifactKind::Package,
                ArtifactKind::Package,
                ArtifactKind::ConfigurationFile,
                ArtifactKind::MiscellaneousFile,
            ]
        );
        // discovery order is kept within a kind
        assert_eq!(ordered[0].source, PathBuf::from("b.dtsx"));
        assert_eq!(ordered[1].source, PathBuf::from("a.dtsx"));
    }

    #[test]
    fn test_artifact_kind_parse() {
        assert_eq!(
            "ConfigurationFile".parse::<ArtifactKind>(),
            Ok(ArtifactKind::ConfigurationFile)
        );
        assert!("Readme".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn test_empty_output_counts_as_missing() {
        let spec = ProjectSpec::new("p.dtproj", "");
        assert!(spec.output_dir().is_none());

        let spec = ProjectSpec::new("p.dtproj", "out");
        assert_eq!(spec.output_dir(), Some(Path::new("out")));
        assert!(spec.allow_configuration_changes);
    }
}
