//! Manifest compilation for a single project
//!
//! [`ManifestCompiler::compile`] walks a project through these stages:
//!
//! 1. load the project descriptor and check the output directory,
//! 2. resolve package references,
//! 3. load every package and collect its file-based configurations,
//! 4. collect miscellaneous items,
//! 5. copy every artifact (packages, then configurations, then miscellaneous),
//! 6. write `<project>.<extension>` into the output directory.
//!
//! Any failure stops the project. Nothing is written to the manifest for an
//! artifact that was not copied, and no manifest is written at all when a copy
//! fails.

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::configuration::configuration_files;
use crate::copier::copy_artifact;
use crate::descriptor::Descriptor;
use crate::errors::ManifestError;
use crate::manifest_writer::write_to_path;
use crate::project::{miscellaneous_items, package_references};
use crate::provenance::{Clock, IdentityProvider, SystemClock, SystemIdentity};
use crate::types::{
    ArtifactSet, CompiledManifest, ManifestDocument, ManifestEntry, ProjectSpec,
    DEFAULT_MANIFEST_EXTENSION,
};

/// Progress of a project through compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    DescriptorLoaded,
    PackagesResolved,
    ConfigsResolved,
    MiscResolved,
    ArtifactsCopied,
    Written,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::DescriptorLoaded => "descriptor loaded",
            Stage::PackagesResolved => "packages resolved",
            Stage::ConfigsResolved => "configurations resolved",
            Stage::MiscResolved => "miscellaneous items resolved",
            Stage::ArtifactsCopied => "artifacts copied",
            Stage::Written => "written",
        };
        f.write_str(name)
    }
}

/// Compiles project descriptors into deployment folders with manifests
pub struct ManifestCompiler {
    identity: Box<dyn IdentityProvider>,
    clock: Box<dyn Clock>,
    manifest_extension: String,
}

impl Default for ManifestCompiler {
    fn default() -> Self {
        ManifestCompiler {
            identity: Box::new(SystemIdentity),
            clock: Box::new(SystemClock),
            manifest_extension: DEFAULT_MANIFEST_EXTENSION.to_string(),
        }
    }
}

impl fmt::Debug for ManifestCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestCompiler")
            .field("manifest_extension", &self.manifest_extension)
            .finish_non_exhaustive()
    }
}

impl ManifestCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, identity: impl IdentityProvider + 'static) -> Self {
        self.identity = Box::new(identity);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Extension of the manifest file name, without the leading dot
    pub fn with_manifest_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.manifest_extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn manifest_extension(&self) -> &str {
        &self.manifest_extension
    }

    /// Compile one project: copy its artifacts and write its manifest
    pub fn compile(&self, spec: &ProjectSpec) -> Result<CompiledManifest, ManifestError> {
        let mut stage = Stage::Start;
        let result = self.run(spec, &mut stage);
        if let Err(err) = &result {
            warn!(
                "Manifest compilation for {} failed after stage '{}': {}",
                spec.project.display(),
                stage,
                err
            );
        }
        result
    }

    fn run(&self, spec: &ProjectSpec, stage: &mut Stage) -> Result<CompiledManifest, ManifestError> {
        let project_source = Descriptor::load(&spec.project)?;
        let project = project_source.parse()?;
        let output_dir = spec
            .output_dir()
            .ok_or_else(|| ManifestError::MissingOutputDirectory(spec.project.clone()))?;
        advance(stage, Stage::DescriptorLoaded);

        fs::create_dir_all(output_dir).map_err(|e| ManifestError::io(output_dir, e))?;
        let generated_by = self.identity.current_identity()?;

        let project_base = project_source.base_dir();
        let packages = package_references(&project, project_base);
        advance(stage, Stage::PackagesResolved);

        let mut configurations = Vec::new();
        for package_path in &packages {
            let package_source = Descriptor::load(package_path)?;
            let package = package_source.parse()?;
            configurations.extend(configuration_files(&package, project_base));
        }
        advance(stage, Stage::ConfigsResolved);

        let miscellaneous = miscellaneous_items(&project, project_base);
        advance(stage, Stage::MiscResolved);

        let artifacts = ArtifactSet {
            packages,
            configurations,
            miscellaneous,
        };
        let entries = copy_all(artifacts, output_dir)?;
        advance(stage, Stage::ArtifactsCopied);

        let document = ManifestDocument {
            allow_configuration_changes: spec.allow_configuration_changes,
            generated_by,
            generated_from_project_name: project_source.stem(),
            generated_date: self.clock.now_utc(),
            entries,
        };
        let path = output_dir.join(format!(
            "{}.{}",
            document.generated_from_project_name, self.manifest_extension
        ));
        write_to_path(&document, &path)?;
        advance(stage, Stage::Written);

        Ok(CompiledManifest { path, document })
    }
}

fn copy_all(artifacts: ArtifactSet, output_dir: &Path) -> Result<Vec<ManifestEntry>, ManifestError> {
    let artifacts = artifacts.into_ordered();
    let mut entries = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        info!(
            "Copying {} {} to {}",
            artifact.kind,
            artifact.source.display(),
            output_dir.display()
        );
        let file_name = copy_artifact(&artifact.source, output_dir)?;
        entries.push(ManifestEntry {
            kind: artifact.kind,
            file_name,
        });
    }
    Ok(entries)
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!("Stage: {} -> {}", stage, next);
    *stage = next;
}

#[cfg(test)]
mod tests {
    use crate::assembler::*;
    use crate::errors::ErrorKind;
    use crate::manifest_writer::read_from_path;
    use crate::provenance::{FixedClock, FixedIdentity};
    use crate::types::ArtifactKind;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    const PROJECT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project>
  <DTSPackages>
    <DtsPackage>
      <Name>pkg1.dtsx</Name>
      <FullPath>pkg1.dtsx</FullPath>
    </DtsPackage>
  </DTSPackages>
  <Miscellaneous>
    <ProjectItem>
      <FullPath>readme.txt</FullPath>
    </ProjectItem>
  </Miscellaneous>
</Project>"#;

    const PACKAGE: &str = r#"<?xml version="1.0"?>
<DTS:Executable xmlns:DTS="www.microsoft.com/SqlServer/Dts">
  <DTS:Configuration>
    <DTS:Property DTS:Name="ConfigurationType">1</DTS:Property>
    <DTS:Property DTS:Name="ConfigurationString">pkg1.dtsConfig</DTS:Property>
  </DTS:Configuration>
</DTS:Executable>"#;

    fn compiler() -> ManifestCompiler {
        let instant = Utc
            .with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
            .single()
            .unwrap_or_default();
        ManifestCompiler::new()
            .with_identity(FixedIdentity("CORP\\builder".to_string()))
            .with_clock(FixedClock(instant))
    }

    /// Lay out a project directory with one package, its config and a readme
    fn fixture(root: &Path) -> std::io::Result<PathBuf> {
        let project_dir = root.join("Warehouse");
        fs::create_dir_all(&project_dir)?;
        fs::write(project_dir.join("Warehouse.dtproj"), PROJECT)?;
        fs::write(project_dir.join("pkg1.dtsx"), PACKAGE)?;
        fs::write(project_dir.join("pkg1.dtsConfig"), "<DTSConfiguration/>")?;
        fs::write(project_dir.join("readme.txt"), "deploy notes")?;
        Ok(project_dir.join("Warehouse.dtproj"))
    }

    #[test]
    fn test_end_to_end_manifest() -> TestResult {
        let temp_dir = TempDir::new()?;
        let project = fixture(temp_dir.path())?;
        let output = temp_dir.path().join("deploy");

        let compiled = compiler().compile(&ProjectSpec::new(&project, &output))?;

        for name in ["pkg1.dtsx", "pkg1.dtsConfig", "readme.txt"] {
            assert!(output.join(name).is_file(), "{} was not copied", name);
        }
        assert_eq!(
            compiled.path,
            output.join("Warehouse.SSISDeploymentManifest")
        );

        let written = read_from_path(&compiled.path)?;
        assert_eq!(written, compiled.document);
        assert_eq!(written.generated_by, "CORP\\builder");
        assert_eq!(written.generated_from_project_name, "Warehouse");
        assert!(written.allow_configuration_changes);

        let entries: Vec<(ArtifactKind, &str)> = written
            .entries
            .iter()
            .map(|e| (e.kind, e.file_name.as_str()))
            .collect();
        assert_eq!(
            entries,
            vec![
                (ArtifactKind::Package, "pkg1.dtsx"),
                (ArtifactKind::ConfigurationFile, "pkg1.dtsConfig"),
                (ArtifactKind::MiscellaneousFile, "readme.txt"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_recompile_is_deterministic() -> TestResult {
        let temp_dir = TempDir::new()?;
        let project = fixture(temp_dir.path())?;
        let output = temp_dir.path().join("deploy");
        let spec = ProjectSpec::new(&project, &output).with_allow_configuration_changes(false);

        let first = fs::read(compiler().compile(&spec)?.path)?;
        let second = fs::read(compiler().compile(&spec)?.path)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_project_without_packages() -> TestResult {
        let temp_dir = TempDir::new()?;
        let project = temp_dir.path().join("Empty.dtproj");
        fs::write(&project, "<Project><DTSPackages/></Project>")?;
        let output = temp_dir.path().join("out");

        let compiled = compiler()
            .with_manifest_extension(".manifest")
            .compile(&ProjectSpec::new(&project, &output))?;

        assert!(compiled.document.entries.is_empty());
        assert_eq!(compiled.path, output.join("Empty.manifest"));
        assert!(compiled.path.is_file());
        Ok(())
    }

    #[test]
    fn test_missing_project_creates_nothing() -> TestResult {
        let temp_dir = TempDir::new()?;
        let output = temp_dir.path().join("out");
        let spec = ProjectSpec::new(temp_dir.path().join("Missing.dtproj"), &output);

        let err = compiler().compile(&spec).err();

        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::NotFound));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn test_missing_output_directory() -> TestResult {
        let temp_dir = TempDir::new()?;
        let project = fixture(temp_dir.path())?;
        let spec = ProjectSpec {
            project,
            output: None,
            allow_configuration_changes: true,
        };

        let err = compiler().compile(&spec).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::MissingOutputDirectory));
        Ok(())
    }

    #[test]
    fn test_missing_package_descriptor_is_not_found() -> TestResult {
        let temp_dir = TempDir::new()?;
        let project = fixture(temp_dir.path())?;
        fs::remove_file(temp_dir.path().join("Warehouse").join("pkg1.dtsx"))?;
        let output = temp_dir.path().join("deploy");

        let err = compiler().compile(&ProjectSpec::new(&project, &output)).err();

        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::NotFound));
        assert!(!output.join("Warehouse.SSISDeploymentManifest").exists());
        Ok(())
    }

    #[test]
    fn test_copy_failure_writes_no_manifest() -> TestResult {
        let temp_dir = TempDir::new()?;
        let project = fixture(temp_dir.path())?;
        fs::remove_file(temp_dir.path().join("Warehouse").join("readme.txt"))?;
        let output = temp_dir.path().join("deploy");

        let err = compiler().compile(&ProjectSpec::new(&project, &output)).err();

        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::CopyFailed));
        assert!(output.join("pkg1.dtsx").is_file());
        assert!(!output.join("Warehouse.SSISDeploymentManifest").exists());
        Ok(())
    }

    #[test]
    fn test_identity_failure() -> TestResult {
        let temp_dir = TempDir::new()?;
        let project = fixture(temp_dir.path())?;
        let output = temp_dir.path().join("deploy");

        let err = compiler()
            .with_identity(FixedIdentity(String::new()))
            .compile(&ProjectSpec::new(&project, &output))
            .err();

        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::IdentityUnavailable));
        assert!(output.is_dir());
        assert!(!output.join("pkg1.dtsx").exists());
        Ok(())
    }

    #[test]
    fn test_output_into_project_directory_keeps_sources() -> TestResult {
        let temp_dir = TempDir::new()?;
        let project = temp_dir.path().join("P.dtproj");
        fs::write(
            &project,
            "<Project><Miscellaneous><ProjectItem><FullPath>readme.txt</FullPath></ProjectItem></Miscellaneous></Project>",
        )?;
        fs::write(temp_dir.path().join("readme.txt"), "important notes")?;

        let err = compiler()
            .compile(&ProjectSpec::new(&project, temp_dir.path()))
            .err();

        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::CopyFailed));
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("readme.txt"))?,
            "important notes"
        );
        assert!(!temp_dir.path().join("P.SSISDeploymentManifest").exists());
        Ok(())
    }

    #[test]
    fn test_configuration_resolves_against_project_directory() -> TestResult {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("Warehouse");
        fs::create_dir_all(project_dir.join("Packages"))?;
        let project = project_dir.join("Warehouse.dtproj");
        fs::write(
            &project,
            r"<Project><DTSPackages><DtsPackage><FullPath>Packages\Load.dtsx</FullPath></DtsPackage></DTSPackages></Project>",
        )?;
        fs::write(
            project_dir.join("Packages").join("Load.dtsx"),
            PACKAGE.replace("pkg1.dtsConfig", "Load.dtsConfig"),
        )?;
        // Only next to the project, not next to the package
        fs::write(project_dir.join("Load.dtsConfig"), "<DTSConfiguration/>")?;
        let output = temp_dir.path().join("deploy");

        let compiled = compiler().compile(&ProjectSpec::new(&project, &output))?;

        assert!(output.join("Load.dtsx").is_file());
        assert!(output.join("Load.dtsConfig").is_file());
        let entries: Vec<(ArtifactKind, &str)> = compiled
            .document
            .entries
            .iter()
            .map(|e| (e.kind, e.file_name.as_str()))
            .collect();
        assert_eq!(
            entries,
            vec![
                (ArtifactKind::Package, "Load.dtsx"),
                (ArtifactKind::ConfigurationFile, "Load.dtsConfig"),
            ]
        );
        Ok(())
    }
}
