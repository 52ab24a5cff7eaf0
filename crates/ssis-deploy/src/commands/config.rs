use crate::config_manager::{Config, KEYS};
use crate::logger;
use crate::GlobalOpts;
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print every configured key
    Show,
    /// Set a key (manifest-extension, allow-configuration-changes, generated-by)
    Set { key: String, value: String },
    /// Print the path of the config file
    Path,
}

pub fn handle_config(action: ConfigAction, opts: GlobalOpts) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load().context("Failed to load config")?;
            println!("{}", "Configuration:".bold().green());
            if config.is_empty() {
                if opts.verbosity_level() > 0 {
                    println!("  {}", "(empty)".yellow());
                }
            } else {
                for (key, value) in config.values_iter() {
                    println!("  {}: {}", key.cyan(), value);
                }
            }
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load().context("Failed to load config")?;
            config.set(&key, value.clone()).with_context(|| {
                format!("Supported keys: {}", KEYS.join(", "))
            })?;
            config.save().context("Failed to save config")?;
            logger::success(&format!("Set {} = {}", key, value));
            Ok(())
        }
        ConfigAction::Path => {
            let config_path = Config::path()?;
            logger::debug(&format!("Reading config from: {}", config_path.display()));
            println!("{}", config_path.display());
            Ok(())
        }
    }
}
