//! Error types for the ssis-deploy CLI
//!
//! Compilation errors come from `ssis_manifest`; this module covers what the
//! CLI adds on top: batch files and the configuration file.

use std::io;
use thiserror::Error;

/// Errors that can occur while loading a batch file
#[derive(Error, Debug)]
pub enum BatchFileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse batch YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Variable '{0}' not found in variables section")]
    VariableNotFound(String),

    #[error("Invalid batch file: {0}")]
    InvalidBatch(String),
}

/// Errors that can occur while reading or updating the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use crate::errors::*;

    #[test]
    fn test_batch_file_error_display() {
        let err = BatchFileError::VariableNotFound("root".to_string());
        assert_eq!(
            err.to_string(),
            "Variable 'root' not found in variables section"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "allow-configuration-changes".to_string(),
            value: "maybe".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 'maybe' for allow-configuration-changes"
        );
    }
}
