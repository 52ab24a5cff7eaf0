use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while compiling a deployment manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse {}: {reason}", .path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("No output directory specified for {}", .0.display())]
    MissingOutputDirectory(PathBuf),

    #[error("Failed to get current identity: {0}")]
    IdentityUnavailable(String),

    #[error("Failed to copy {} to {}: {source}", .source_path.display(), .destination.display())]
    CopyFailed {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Coarse classification of a [`ManifestError`], used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    MalformedDocument,
    MissingOutputDirectory,
    IdentityUnavailable,
    CopyFailed,
    Io,
}

impl ManifestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ManifestError::NotFound(_) => ErrorKind::NotFound,
            ManifestError::MalformedDocument { .. } => ErrorKind::MalformedDocument,
            ManifestError::MissingOutputDirectory(_) => ErrorKind::MissingOutputDirectory,
            ManifestError::IdentityUnavailable(_) => ErrorKind::IdentityUnavailable,
            ManifestError::CopyFailed { .. } => ErrorKind::CopyFailed,
            ManifestError::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        ManifestError::MalformedDocument {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ManifestError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MalformedDocument => "MalformedDocument",
            ErrorKind::MissingOutputDirectory => "MissingOutputDirectory",
            ErrorKind::IdentityUnavailable => "IdentityUnavailable",
            ErrorKind::CopyFailed => "CopyFailed",
            ErrorKind::Io => "Io",
        };
        f.write_str(name)
    }
}

/// Errors that stop a batch run
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Project #{} ({}) failed: {source}", .index + 1, .project.display())]
    ProjectFailed {
        index: usize,
        project: PathBuf,
        #[source]
        source: ManifestError,
    },

    #[error(
        "Projects #{} and #{} share output directory {}",
        .first + 1,
        .second + 1,
        .output.display()
    )]
    SharedOutputDirectory {
        first: usize,
        second: usize,
        output: PathBuf,
    },
}

impl BatchError {
    /// The underlying project error, if the batch stopped on a project failure
    pub fn project_error(&self) -> Option<&ManifestError> {
        match self {
            BatchError::ProjectFailed { source, .. } => Some(source),
            BatchError::SharedOutputDirectory { .. } => None,
        }
    }
}
