//! ssis-deploy library - expose modules for testing
//!
//! The binary in `main.rs` is a thin clap front end over these modules.

pub mod batch_config;
pub mod commands;
pub mod common;
pub mod config_manager;
pub mod errors;

pub use common::GlobalOpts;
pub use ssis_logger as logger;
