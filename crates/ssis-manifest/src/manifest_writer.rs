//! Manifest serialization
//!
//! Manifests are XML documents shaped the way SSIS writes them:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <DTSDeploymentManifest AllowConfigurationChanges="true" GeneratedBy="CORP\builder"
//!     GeneratedFromProjectName="Warehouse" GeneratedDate="2024-05-01T09:30:00Z">
//!   <Package>Load.dtsx</Package>
//!   <ConfigurationFile>Load.dtsConfig</ConfigurationFile>
//!   <MiscellaneousFile>readme.txt</MiscellaneousFile>
//! </DTSDeploymentManifest>
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use roxmltree::Document;
use tracing::{debug, info};

use crate::errors::ManifestError;
use crate::types::{ArtifactKind, ManifestDocument, ManifestEntry, MANIFEST_ROOT};

const ALLOW_CONFIGURATION_CHANGES: &str = "AllowConfigurationChanges";
const GENERATED_BY: &str = "GeneratedBy";
const GENERATED_FROM_PROJECT_NAME: &str = "GeneratedFromProjectName";
const GENERATED_DATE: &str = "GeneratedDate";

/// Render a manifest as an indented XML string
pub fn to_xml_string(document: &ManifestDocument) -> io::Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(io::Error::other)?;

    let generated_date = document
        .generated_date
        .to_rfc3339_opts(SecondsFormat::AutoSi, true);
    let mut root = BytesStart::new(MANIFEST_ROOT);
    root.push_attribute((
        ALLOW_CONFIGURATION_CHANGES,
        if document.allow_configuration_changes {
            "true"
        } else {
            "false"
        },
    ));
    root.push_attribute((GENERATED_BY, document.generated_by.as_str()));
    root.push_attribute((
        GENERATED_FROM_PROJECT_NAME,
        document.generated_from_project_name.as_str(),
    ));
    root.push_attribute((GENERATED_DATE, generated_date.as_str()));

    if document.entries.is_empty() {
        writer
            .write_event(Event::Empty(root))
            .map_err(io::Error::other)?;
    } else {
        writer
            .write_event(Event::Start(root))
            .map_err(io::Error::other)?;
        for entry in &document.entries {
            writer
                .create_element(entry.kind.as_str())
                .write_text_content(BytesText::new(&entry.file_name))
                .map_err(io::Error::other)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(MANIFEST_ROOT)))
            .map_err(io::Error::other)?;
    }

    String::from_utf8(writer.into_inner()).map_err(io::Error::other)
}

/// Write a manifest to `output_path`, replacing any existing file
pub fn write_to_path(document: &ManifestDocument, output_path: &Path) -> Result<(), ManifestError> {
    debug!("Writing manifest to {}", output_path.display());

    let xml = to_xml_string(document).map_err(|e| ManifestError::io(output_path, e))?;

    // Write to a sibling temp file then rename over the target
    let file_name = output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = output_path.with_file_name(format!(".{}.tmp", file_name));
    let written = fs::File::create(&temp_path)
        .and_then(|file| {
            let mut writer = io::BufWriter::new(file);
            writer.write_all(xml.as_bytes())?;
            writer.flush()
        })
        .map_err(|e| ManifestError::io(&temp_path, e))
        .and_then(|()| {
            fs::rename(&temp_path, output_path).map_err(|e| ManifestError::io(output_path, e))
        });
    if let Err(err) = written {
        if temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }
        return Err(err);
    }

    info!("Manifest written to {}", output_path.display());
    info!("Total artifacts: {}", document.entries.len());
    Ok(())
}

/// Read a manifest previously written by [`write_to_path`]
pub fn read_from_path(manifest_path: &Path) -> Result<ManifestDocument, ManifestError> {
    debug!("Reading manifest from {}", manifest_path.display());

    let content = fs::read_to_string(manifest_path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ManifestError::NotFound(manifest_path.to_path_buf()),
        _ => ManifestError::io(manifest_path, e),
    })?;
    from_xml_str(&content, manifest_path)
}

/// Parse manifest XML; `origin` is only used in error messages
pub fn from_xml_str(xml: &str, origin: &Path) -> Result<ManifestDocument, ManifestError> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let document = Document::parse(xml).map_err(|e| ManifestError::malformed(origin, e))?;
    let root = document.root_element();
    if root.tag_name().name() != MANIFEST_ROOT {
        return Err(ManifestError::malformed(
            origin,
            format!(
                "expected root element {}, found {}",
                MANIFEST_ROOT,
                root.tag_name().name()
            ),
        ));
    }

    let attribute = |name: &str| {
        root.attribute(name).ok_or_else(|| {
            ManifestError::malformed(origin, format!("missing attribute {}", name))
        })
    };

    let allow_configuration_changes = match attribute(ALLOW_CONFIGURATION_CHANGES)?.trim() {
        "true" | "True" | "1" => true,
        "false" | "False" | "0" => false,
        other => {
            return Err(ManifestError::malformed(
                origin,
                format!("invalid {} value '{}'", ALLOW_CONFIGURATION_CHANGES, other),
            ));
        }
    };
    let generated_date = DateTime::parse_from_rfc3339(attribute(GENERATED_DATE)?.trim())
        .map_err(|e| ManifestError::malformed(origin, format!("invalid {}: {}", GENERATED_DATE, e)))?
        .with_timezone(&Utc);

    let entries = root
        .children()
        .filter(roxmltree::Node::is_element)
        .map(|node| {
            let kind: ArtifactKind = node
                .tag_name()
                .name()
                .parse()
                .map_err(|e: String| ManifestError::malformed(origin, e))?;
            Ok(ManifestEntry {
                kind,
                file_name: node.text().unwrap_or_default().trim().to_string(),
            })
        })
        .collect::<Result<Vec<_>, ManifestError>>()?;

    Ok(ManifestDocument {
        allow_configuration_changes,
        generated_by: attribute(GENERATED_BY)?.to_string(),
        generated_from_project_name: attribute(GENERATED_FROM_PROJECT_NAME)?.to_string(),
        generated_date,
        entries,
    })
}
