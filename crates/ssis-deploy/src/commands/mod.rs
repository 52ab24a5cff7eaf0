//! Subcommand handlers

pub mod batch;
pub mod build;
pub mod config;
pub mod init;
pub mod inspect;
