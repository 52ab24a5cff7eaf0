//! Common types and utilities shared across modules

use clap::Parser;
use ssis_manifest::BatchError;

/// Global CLI options available to all commands
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    #[arg(short, long, global = true, help = "Decrease verbosity")]
    pub quiet: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase verbosity (-v for debug, -vv for trace)")]
    pub verbose: u8,

    #[arg(long, global = true, help = "Emit diagnostic traces as JSON")]
    pub log_json: bool,
}

impl GlobalOpts {
    /// Get the effective verbosity level
    /// - 0: quiet/warn only
    /// - 1: debug (-v)
    /// - 2: trace (-vv)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

/// One-line description of a batch failure naming the project and error kind
pub fn describe_batch_error(err: &BatchError) -> String {
    match err {
        BatchError::ProjectFailed {
            index,
            project,
            source,
        } => format!(
            "Project #{} ({}) failed [{}]: {}",
            index + 1,
            project.display(),
            source.kind(),
            source
        ),
        BatchError::SharedOutputDirectory { .. } => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::common::*;
    use ssis_manifest::ManifestError;
    use std::path::PathBuf;

    #[test]
    fn test_quiet_wins_over_verbose() {
        let opts = GlobalOpts {
            quiet: true,
            verbose: 2,
            log_json: false,
        };
        assert_eq!(opts.verbosity_level(), 0);
    }

    #[test]
    fn test_describe_batch_error_names_kind() {
        let err = BatchError::ProjectFailed {
            index: 0,
            project: PathBuf::from("Sales.dtproj"),
            source: ManifestError::NotFound(PathBuf::from("Sales.dtproj")),
        };
        assert_eq!(
            describe_batch_error(&err),
            "Project #1 (Sales.dtproj) failed [NotFound]: File not found: Sales.dtproj"
        );
    }
}
