//! Artifact copying
//!
//! Deployment folders are often checked into source control, which leaves
//! copied files read-only. A copy clears the read-only flag on an existing
//! destination, overwrites it, and puts the flag back afterwards.

use std::fs::{self, Permissions};
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::errors::ManifestError;

/// Copy `source` into `destination_dir`, returning the destination file name.
///
/// An existing destination is overwritten. If it was read-only it is read-only
/// again afterwards, also when the copy itself fails.
pub fn copy_artifact(source: &Path, destination_dir: &Path) -> Result<String, ManifestError> {
    let file_name = source.file_name().ok_or_else(|| ManifestError::CopyFailed {
        source_path: source.to_path_buf(),
        destination: destination_dir.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "source has no file name"),
    })?;
    let destination = destination_dir.join(file_name);
    let copy_failed = |err: io::Error| ManifestError::CopyFailed {
        source_path: source.to_path_buf(),
        destination: destination.clone(),
        source: err,
    };

    debug!("Copying {} to {}", source.display(), destination.display());

    if is_same_file(source, &destination) {
        return Err(copy_failed(io::Error::new(
            io::ErrorKind::InvalidInput,
            "source and destination are the same file",
        )));
    }

    let guard = ReadOnlyGuard::acquire(&destination).map_err(copy_failed)?;
    fs::copy(source, &destination).map_err(copy_failed)?;
    drop(guard);

    Ok(file_name.to_string_lossy().into_owned())
}

/// Whether both paths name one existing file; `fs::copy` would truncate it
fn is_same_file(source: &Path, destination: &Path) -> bool {
    match (fs::canonicalize(source), fs::canonicalize(destination)) {
        (Ok(source), Ok(destination)) => source == destination,
        _ => false,
    }
}

/// Holds a destination writable for the duration of a copy
struct ReadOnlyGuard<'a> {
    path: &'a Path,
    restore: bool,
}

impl<'a> ReadOnlyGuard<'a> {
    fn acquire(path: &'a Path) -> io::Result<Self> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(ReadOnlyGuard {
                    path,
                    restore: false,
                });
            }
            Err(err) => return Err(err),
        };

        let mut permissions = metadata.permissions();
        if !permissions.readonly() {
            return Ok(ReadOnlyGuard {
                path,
                restore: false,
            });
        }

        debug!("Clearing read-only flag on {}", path.display());
        make_writable(&mut permissions);
        fs::set_permissions(path, permissions)?;
        Ok(ReadOnlyGuard {
            path,
            restore: true,
        })
    }
}

impl Drop for ReadOnlyGuard<'_> {
    fn drop(&mut self) {
        if !self.restore {
            return;
        }
        let result = fs::metadata(self.path).and_then(|metadata| {
            let mut permissions = metadata.permissions();
            make_read_only(&mut permissions);
            fs::set_permissions(self.path, permissions)
        });
        if let Err(err) = result {
            warn!(
                "Failed to restore read-only flag on {}: {}",
                self.path.display(),
                err
            );
        }
    }
}

#[cfg(unix)]
fn make_writable(permissions: &mut Permissions) {
    use std::os::unix::fs::PermissionsExt;
    permissions.set_mode(permissions.mode() | 0o200);
}

#[cfg(not(unix))]
fn make_writable(permissions: &mut Permissions) {
    permissions.set_readonly(false);
}

#[cfg(unix)]
fn make_read_only(permissions: &mut Permissions) {
    use std::os::unix::fs::PermissionsExt;
    permissions.set_mode(permissions.mode() & !0o222);
}

#[cfg(not(unix))]
fn make_read_only(permissions: &mut Permissions) {
    permissions.set_readonly(true);
}

#[cfg(test)]
mod tests {
    use crate::copier::*;
    use crate::errors::ErrorKind;
    use tempfile::TempDir;

    fn is_read_only(path: &Path) -> io::Result<bool> {
        Ok(fs::metadata(path)?.permissions().readonly())
    }

    fn set_read_only(path: &Path) -> io::Result<()> {
        let mut permissions = fs::metadata(path)?.permissions();
        make_read_only(&mut permissions);
        fs::set_permissions(path, permissions)
    }

    #[test]
    fn test_copy_into_empty_directory() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let source = temp_dir.path().join("src").join("Load.dtsx");
        let output = temp_dir.path().join("out");
        fs::create_dir_all(source.parent().ok_or("no parent")?)?;
        fs::create_dir_all(&output)?;
        fs::write(&source, "<package/>")?;

        let name = copy_artifact(&source, &output)?;

        assert_eq!(name, "Load.dtsx");
        assert_eq!(fs::read_to_string(output.join("Load.dtsx"))?, "<package/>");
        assert!(!is_read_only(&output.join("Load.dtsx"))?);
        Ok(())
    }

    #[test]
    fn test_copy_over_read_only_destination() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let source_dir = temp_dir.path().join("src");
        let output = temp_dir.path().join("out");
        fs::create_dir_all(&source_dir)?;
        fs::create_dir_all(&output)?;

        let source = source_dir.join("Load.dtsConfig");
        let destination = output.join("Load.dtsConfig");
        fs::write(&source, "new")?;
        fs::write(&destination, "old")?;
        set_read_only(&destination)?;

        copy_artifact(&source, &output)?;

        assert_eq!(fs::read_to_string(&destination)?, "new");
        assert!(is_read_only(&destination)?);
        Ok(())
    }

    #[test]
    fn test_missing_source_fails_and_keeps_flag() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let output = temp_dir.path().join("out");
        fs::create_dir_all(&output)?;
        let destination = output.join("gone.txt");
        fs::write(&destination, "old")?;
        set_read_only(&destination)?;

        let err = copy_artifact(&temp_dir.path().join("gone.txt"), &output).err();

        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::CopyFailed));
        assert!(is_read_only(&destination)?);
        assert_eq!(fs::read_to_string(&destination)?, "old");
        Ok(())
    }

    #[test]
    fn test_copy_onto_itself_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let source = temp_dir.path().join("readme.txt");
        fs::write(&source, "important notes")?;

        let err = copy_artifact(&source, temp_dir.path()).err();

        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::CopyFailed));
        assert_eq!(fs::read_to_string(&source)?, "important notes");
        Ok(())
    }

    #[test]
    fn test_copy_onto_itself_through_relative_path() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let nested = temp_dir.path().join("etl");
        fs::create_dir_all(&nested)?;
        let source = nested.join("Load.dtsx");
        fs::write(&source, "<package/>")?;

        let err = copy_artifact(&source, &nested.join("..").join("etl")).err();

        assert!(matches!(err, Some(ManifestError::CopyFailed { ref source, .. })
            if source.kind() == io::ErrorKind::InvalidInput));
        assert_eq!(fs::read_to_string(&source)?, "<package/>");
        Ok(())
    }
}
