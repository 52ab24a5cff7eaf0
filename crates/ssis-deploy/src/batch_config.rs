use crate::errors::BatchFileError;
use serde::{Deserialize, Serialize};
use ssis_manifest::ProjectSpec;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Batch of projects to compile, loaded from YAML
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct BatchFile {
    /// Variables for substitution (${var} and $(var) syntax)
    #[serde(default)]
    pub variables: HashMap<String, serde_yaml::Value>,

    /// Projects in the order they are compiled
    #[serde(default)]
    pub projects: Vec<BatchEntry>,
}

/// One project of a batch file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub project: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub allow_configuration_changes: Option<bool>,
}

impl BatchFile {
    /// Load a batch file from YAML
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BatchFileError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, BatchFileError> {
        let batch: BatchFile = serde_yaml::from_str(content)?;
        Ok(batch)
    }

    /// Substitute variables in a string (supports ${var} and $(var) syntax)
    pub fn substitute_string(&self, input: &str) -> Result<String, BatchFileError> {
        let mut result = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(start) = rest.find('$') {
            let close = match rest[start + 1..].chars().next() {
                Some('{') => '}',
                Some('(') => ')',
                _ => {
                    result.push_str(&rest[..=start]);
                    rest = &rest[start + 1..];
                    continue;
                }
            };
            let Some(len) = rest[start + 2..].find(close) else {
                return Err(BatchFileError::InvalidBatch(format!(
                    "Unclosed variable substitution in '{}'",
                    input
                )));
            };

            let name = &rest[start + 2..start + 2 + len];
            result.push_str(&rest[..start]);
            result.push_str(&self.get_variable_string(name.trim())?);
            rest = &rest[start + 2 + len + 1..];
        }
        result.push_str(rest);

        Ok(result)
    }

    /// Get a variable value as a string
    fn get_variable_string(&self, name: &str) -> Result<String, BatchFileError> {
        let value = self
            .variables
            .get(name)
            .ok_or_else(|| BatchFileError::VariableNotFound(name.to_string()))?;

        match value {
            serde_yaml::Value::String(s) => Ok(s.clone()),
            serde_yaml::Value::Number(n) => Ok(n.to_string()),
            serde_yaml::Value::Bool(b) => Ok(b.to_string()),
            _ => Err(BatchFileError::InvalidBatch(format!(
                "Variable '{}' has complex type that cannot be substituted as string",
                name
            ))),
        }
    }

    /// Resolve entries into project specs.
    ///
    /// Relative paths are taken relative to `base_dir` (the batch file's
    /// directory). Entries without `allow_configuration_changes` use
    /// `default_allow`.
    pub fn resolve(
        &self,
        base_dir: &Path,
        default_allow: bool,
    ) -> Result<Vec<ProjectSpec>, BatchFileError> {
        self.projects
            .iter()
            .map(|entry| {
                let project = base_dir.join(self.substitute_string(&entry.project)?);
                let output = entry
                    .output
                    .as_deref()
                    .map(|o| self.substitute_string(o))
                    .transpose()?
                    .filter(|o| !o.trim().is_empty())
                    .map(|o| base_dir.join(o));
                Ok(ProjectSpec {
                    project,
                    output,
                    allow_configuration_changes: entry
                        .allow_configuration_changes
                        .unwrap_or(default_allow),
                })
            })
            .collect()
    }

    /// Render the resolved batch for `--dry-run`
    pub fn describe(&self, base_dir: &Path, default_allow: bool) -> Result<String, BatchFileError> {
        let specs = self.resolve(base_dir, default_allow)?;

        let mut output = String::new();
        output.push_str(&format!("Projects: {}\n", specs.len()));
        if !self.variables.is_empty() {
            output.push_str("\nVariables:\n");
            let mut names: Vec<&String> = self.variables.keys().collect();
            names.sort();
            for name in names {
                output.push_str(&format!("  {}: {}\n", name, self.get_variable_string(name)?));
            }
        }
        for (index, spec) in specs.iter().enumerate() {
            output.push_str(&format!("\n#{} {}\n", index + 1, spec.project.display()));
            match spec.output_dir() {
                Some(dir) => output.push_str(&format!("  output: {}\n", dir.display())),
                None => output.push_str("  output: (missing)\n"),
            }
            output.push_str(&format!(
                "  allow_configuration_changes: {}\n",
                spec.allow_configuration_changes
            ));
        }
        Ok(output)
    }
}

/// Directory relative batch entries resolve against
pub fn batch_base_dir(batch_path: &Path) -> PathBuf {
    batch_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use crate::batch_config::*;

    const BATCH: &str = r#"
variables:
  root: builds
  release: 7
projects:
  - project: ${root}/Warehouse/Warehouse.dtproj
    output: $(root)/deploy/Warehouse-r${release}
  - project: Staging/Staging.dtproj
    output: deploy/Staging
    allow_configuration_changes: false
  - project: Orphan/Orphan.dtproj
"#;

    #[test]
    fn test_resolve_substitutes_and_orders() -> Result<(), BatchFileError> {
        let batch = BatchFile::parse(BATCH)?;
        let base = Path::new("ci");
        let specs = batch.resolve(base, true)?;

        assert_eq!(specs.len(), 3);
        assert_eq!(
            specs[0].project,
            base.join("builds/Warehouse/Warehouse.dtproj")
        );
        assert_eq!(
            specs[0].output.as_deref(),
            Some(base.join("builds/deploy/Warehouse-r7").as_path())
        );
        assert!(specs[0].allow_configuration_changes);
        assert!(!specs[1].allow_configuration_changes);
        assert!(specs[2].output_dir().is_none());
        Ok(())
    }

    #[test]
    fn test_unknown_variable() -> Result<(), BatchFileError> {
        let batch = BatchFile::parse("projects:\n  - project: ${missing}/a.dtproj\n")?;
        let err = batch.resolve(Path::new(""), true).err();
        assert!(matches!(err, Some(BatchFileError::VariableNotFound(ref v)) if v == "missing"));
        Ok(())
    }

    #[test]
    fn test_unclosed_substitution() {
        let batch = BatchFile::default();
        assert!(matches!(
            batch.substitute_string("${root/a.dtproj"),
            Err(BatchFileError::InvalidBatch(_))
        ));
    }

    #[test]
    fn test_plain_dollar_is_kept() -> Result<(), BatchFileError> {
        let batch = BatchFile::default();
        assert_eq!(batch.substitute_string(r"\\server\share$\deploy")?, r"\\server\share$\deploy");
        Ok(())
    }

    #[test]
    fn test_describe_marks_missing_output() -> Result<(), BatchFileError> {
        let batch = BatchFile::parse(BATCH)?;
        let description = batch.describe(Path::new(""), true)?;
        assert!(description.starts_with("Projects: 3"));
        assert!(description.contains("  root: builds"));
        assert!(description.contains("output: (missing)"));
        Ok(())
    }
}
