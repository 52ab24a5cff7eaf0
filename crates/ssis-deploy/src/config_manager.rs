//! User configuration stored as TOML
//!
//! The file lives at `~/.config/ssis-deploy/ssis-deploy.toml` unless
//! `SSIS_DEPLOY_CONFIG` points elsewhere. Every key is optional.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use ssis_manifest::{FixedIdentity, ManifestCompiler, DEFAULT_MANIFEST_EXTENSION};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "SSIS_DEPLOY_CONFIG";

/// Keys accepted by `config set`
pub const KEYS: &[&str] = &[
    "manifest-extension",
    "allow-configuration-changes",
    "generated-by",
];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_configuration_changes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<String>,
}

impl Config {
    pub fn path() -> Result<PathBuf, ConfigError> {
        // Honor explicit override for tests / isolated runs
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        ssis_logger::get_config_dir()
            .map(|dir| dir.join("ssis-deploy.toml"))
            .map_err(|_| ConfigError::NoConfigDir)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&Self::path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(&Self::path()?)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "manifest-extension" => self.manifest_extension.clone(),
            "allow-configuration-changes" => {
                self.allow_configuration_changes.map(|v| v.to_string())
            }
            "generated-by" => self.generated_by.clone(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        match key {
            "manifest-extension" => {
                self.manifest_extension = Some(manifest_extension_value(&value)?);
            }
            "allow-configuration-changes" => {
                let parsed = parse_bool(&value).ok_or_else(|| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                })?;
                self.allow_configuration_changes = Some(parsed);
            }
            "generated-by" => self.generated_by = Some(value),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.manifest_extension.is_none()
            && self.allow_configuration_changes.is_none()
            && self.generated_by.is_none()
    }

    pub fn values_iter(&self) -> Vec<(&str, String)> {
        KEYS.iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }

    pub fn manifest_extension(&self) -> &str {
        self.manifest_extension
            .as_deref()
            .unwrap_or(DEFAULT_MANIFEST_EXTENSION)
    }

    pub fn allow_configuration_changes(&self) -> bool {
        self.allow_configuration_changes.unwrap_or(true)
    }

    /// Build a compiler honoring the configured extension and identity
    pub fn compiler(&self) -> ManifestCompiler {
        let compiler = ManifestCompiler::new().with_manifest_extension(self.manifest_extension());
        match &self.generated_by {
            Some(identity) => compiler.with_identity(FixedIdentity(identity.clone())),
            None => compiler,
        }
    }
}

/// Validate a manifest extension, dropping surrounding whitespace and leading dots
pub fn manifest_extension_value(value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "manifest-extension".to_string(),
            value: value.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
