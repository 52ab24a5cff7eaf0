//! Batch driver
//!
//! Projects are compiled in the order given and the batch stops at the first
//! failing project. Projects completed before the failure keep their output.

use std::path::{Component, Path, PathBuf};

use ahash::AHashMap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::assembler::ManifestCompiler;
use crate::errors::{BatchError, ManifestError};
use crate::types::{CompiledManifest, ProjectSpec};

/// Progress notifications emitted by [`run_batch_with`]
#[derive(Debug)]
pub enum BatchEvent<'a> {
    Started {
        index: usize,
        spec: &'a ProjectSpec,
    },
    Completed {
        index: usize,
        manifest: &'a CompiledManifest,
    },
    Failed {
        index: usize,
        spec: &'a ProjectSpec,
        error: &'a ManifestError,
    },
}

/// Compile every project in order, stopping at the first failure
pub fn run_batch(
    compiler: &ManifestCompiler,
    projects: &[ProjectSpec],
) -> Result<Vec<CompiledManifest>, BatchError> {
    run_batch_with(compiler, projects, |_| {})
}

/// Like [`run_batch`], reporting progress to `on_event`
pub fn run_batch_with<F>(
    compiler: &ManifestCompiler,
    projects: &[ProjectSpec],
    mut on_event: F,
) -> Result<Vec<CompiledManifest>, BatchError>
where
    F: FnMut(BatchEvent<'_>),
{
    info!("Compiling {} project(s)", projects.len());

    let mut compiled = Vec::with_capacity(projects.len());
    for (index, spec) in projects.iter().enumerate() {
        on_event(BatchEvent::Started { index, spec });
        match compiler.compile(spec) {
            Ok(manifest) => {
                on_event(BatchEvent::Completed {
                    index,
                    manifest: &manifest,
                });
                compiled.push(manifest);
            }
            Err(error) => {
                on_event(BatchEvent::Failed {
                    index,
                    spec,
                    error: &error,
                });
                return Err(BatchError::ProjectFailed {
                    index,
                    project: spec.project.clone(),
                    source: error,
                });
            }
        }
    }
    Ok(compiled)
}

/// Compile projects concurrently.
///
/// Every project needs its own output directory. All projects run; when some
/// fail, the error of the earliest one in batch order is returned.
pub fn run_batch_parallel(
    compiler: &ManifestCompiler,
    projects: &[ProjectSpec],
) -> Result<Vec<CompiledManifest>, BatchError> {
    ensure_distinct_outputs(projects)?;
    info!("Compiling {} project(s) in parallel", projects.len());

    let results: Vec<Result<CompiledManifest, ManifestError>> = projects
        .par_iter()
        .map(|spec| compiler.compile(spec))
        .collect();

    let mut compiled = Vec::with_capacity(results.len());
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(manifest) => compiled.push(manifest),
            Err(source) => {
                return Err(BatchError::ProjectFailed {
                    index,
                    project: projects[index].project.clone(),
                    source,
                });
            }
        }
    }
    Ok(compiled)
}

fn ensure_distinct_outputs(projects: &[ProjectSpec]) -> Result<(), BatchError> {
    let mut seen: AHashMap<PathBuf, usize> = AHashMap::with_capacity(projects.len());
    for (index, spec) in projects.iter().enumerate() {
        let Some(output) = spec.output_dir() else {
            continue;
        };
        let key = normalize(output);
        if let Some(&first) = seen.get(&key) {
            return Err(BatchError::SharedOutputDirectory {
                first,
                second: index,
                output: output.to_path_buf(),
            });
        }
        debug!("Project #{} writes to {}", index + 1, key.display());
        seen.insert(key, index);
    }
    Ok(())
}

/// Lexical normalization so `out/a`, `out/a/` and `out/./a` compare equal
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
