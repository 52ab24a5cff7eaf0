//! Reference extraction from project descriptors
//!
//! A project lists its files as `FullPath` elements. The parent element decides
//! what the path is: `DtsPackage` marks a package, `ProjectItem` nested in
//! `Miscellaneous` marks a miscellaneous item, anything else is ignored.

use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use crate::descriptor::{element_text, is_plain_element, resolve_reference};

const FULL_PATH: &str = "FullPath";
const PACKAGE_CONTAINER: &str = "DtsPackage";
const PROJECT_ITEM: &str = "ProjectItem";
const MISCELLANEOUS_CONTAINER: &str = "Miscellaneous";

/// Package descriptor paths declared by a project, in document order
pub fn package_references(project: &Document<'_>, base: &Path) -> Vec<PathBuf> {
    full_paths(project)
        .filter(|node| parent_is(*node, PACKAGE_CONTAINER))
        .map(|node| resolve_reference(base, &element_text(node)))
        .collect()
}

/// Miscellaneous item paths declared by a project, in document order
pub fn miscellaneous_items(project: &Document<'_>, base: &Path) -> Vec<PathBuf> {
    full_paths(project)
        .filter(|node| {
            node.parent_element().is_some_and(|parent| {
                is_plain_element(parent, PROJECT_ITEM) && parent_is(parent, MISCELLANEOUS_CONTAINER)
            })
        })
        .map(|node| resolve_reference(base, &element_text(node)))
        .collect()
}

fn full_paths<'a, 'input>(
    project: &'a Document<'input>,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    project
        .descendants()
        .filter(|node| is_plain_element(*node, FULL_PATH))
}

fn parent_is(node: Node<'_, '_>, name: &str) -> bool {
    node.parent_element()
        .is_some_and(|parent| is_plain_element(parent, name))
}
