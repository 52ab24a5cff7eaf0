//! Configuration file references in package descriptors
//!
//! A package stores its configurations as `DTS:Configuration` blocks of
//! `DTS:Property` elements. Only file-based configurations (`ConfigurationType`
//! of `1`) point at a file that has to ship with the package.
//!
//! ```xml
//! <DTS:Configuration>
//!   <DTS:Property DTS:Name="ConfigurationType">1</DTS:Property>
//!   <DTS:Property DTS:Name="ConfigurationString">Load.dtsConfig</DTS:Property>
//! </DTS:Configuration>
//! ```
//!
//! The type check is an existence test over the whole block, not a pairing:
//! when any property in a block is `ConfigurationType = 1`, every
//! `ConfigurationString` in that block is selected, regardless of position.

use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use crate::descriptor::{element_text, resolve_reference};

/// XML namespace of package descriptors
pub const DTS_NAMESPACE: &str = "www.microsoft.com/SqlServer/Dts";

const PROPERTY: &str = "Property";
const CONFIGURATION: &str = "Configuration";
const NAME_ATTRIBUTE: &str = "Name";
const CONFIGURATION_STRING: &str = "ConfigurationString";
const CONFIGURATION_TYPE: &str = "ConfigurationType";
const FILE_BASED: &str = "1";

/// Configuration files a package depends on, in document order.
///
/// Paths are resolved against `project_base`, the directory of the project
/// that referenced the package.
pub fn configuration_files(package: &Document<'_>, project_base: &Path) -> Vec<PathBuf> {
    package
        .descendants()
        .filter(|node| is_dts_element(*node, PROPERTY))
        .filter(|node| property_name(*node) == Some(CONFIGURATION_STRING))
        .filter(|node| {
            node.parent_element().is_some_and(|parent| {
                is_dts_element(parent, CONFIGURATION) && declares_file_storage(parent)
            })
        })
        .map(|node| resolve_reference(project_base, &element_text(node)))
        .collect()
}

fn declares_file_storage(configuration: Node<'_, '_>) -> bool {
    // descendants() yields the block itself first
    configuration
        .descendants()
        .skip(1)
        .filter(Node::is_element)
        .any(|node| {
            property_name(node) == Some(CONFIGURATION_TYPE) && element_text(node) == FILE_BASED
        })
}

fn is_dts_element(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(DTS_NAMESPACE)
        && node.tag_name().name() == name
}

fn property_name<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.attribute((DTS_NAMESPACE, NAME_ATTRIBUTE))
}
