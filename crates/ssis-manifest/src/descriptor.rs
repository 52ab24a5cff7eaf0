//! Descriptor loading
//!
//! Project (`.dtproj`) and package (`.dtsx`) descriptors are both plain XML.
//! [`Descriptor::load`] reads the file and [`Descriptor::parse`] turns it into a
//! queryable tree. Nothing is cached: loading the same path twice reads it twice.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node, ParsingOptions};
use tracing::debug;

use crate::errors::ManifestError;

/// Raw text of a descriptor file together with the path it was read from
#[derive(Debug, Clone)]
pub struct Descriptor {
    path: PathBuf,
    text: String,
}

impl Descriptor {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        debug!("Reading file {}", path.display());

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ManifestError::NotFound(path.to_path_buf()));
            }
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                return Err(ManifestError::malformed(path, err));
            }
            Err(err) => return Err(ManifestError::io(path, err)),
        };

        Ok(Descriptor {
            path: path.to_path_buf(),
            text,
        })
    }

    /// Parse the descriptor text into an XML tree borrowing from `self`
    pub fn parse(&self) -> Result<Document<'_>, ManifestError> {
        let text = self.text.strip_prefix('\u{feff}').unwrap_or(&self.text);
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        Document::parse_with_options(text, options)
            .map_err(|err| ManifestError::malformed(&self.path, err))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory relative references in this descriptor resolve against
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// File name without extension, used as the project name in manifests
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Concatenated text of an element and all of its descendants
pub(crate) fn element_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

/// Whether `node` is an element with the given local name and no namespace
pub(crate) fn is_plain_element(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().namespace().is_none() && node.tag_name().name() == name
}

/// Resolve a path as written in a descriptor against `base`.
///
/// Descriptors are authored on Windows, so backslashes are treated as
/// separators on every platform. Absolute references replace `base`.
pub fn resolve_reference(base: &Path, raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    #[cfg(not(windows))]
    let reference = PathBuf::from(trimmed.replace('\\', "/"));
    #[cfg(windows)]
    let reference = PathBuf::from(trimmed);
    base.join(reference)
}
