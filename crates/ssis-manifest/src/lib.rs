//! SSIS deployment manifest compiler
//!
//! Turns a project descriptor (`.dtproj`) into a deployment folder: the
//! packages it declares, the file-based configurations those packages use and
//! the project's miscellaneous items are copied into an output directory, and a
//! `DTSDeploymentManifest` XML document listing them is written next to them.
//!
//! ```no_run
//! use ssis_manifest::{ManifestCompiler, ProjectSpec};
//!
//! let compiler = ManifestCompiler::new();
//! let compiled = compiler.compile(&ProjectSpec::new("Warehouse/Warehouse.dtproj", "deploy"))?;
//! println!("wrote {}", compiled.path.display());
//! # Ok::<(), ssis_manifest::ManifestError>(())
//! ```

pub mod assembler;
pub mod batch;
pub mod configuration;
pub mod copier;
pub mod descriptor;
pub mod errors;
pub mod manifest_writer;
pub mod project;
pub mod provenance;
pub mod types;

pub use assembler::{ManifestCompiler, Stage};
pub use batch::{run_batch, run_batch_parallel, run_batch_with, BatchEvent};
pub use errors::{BatchError, ErrorKind, ManifestError};
pub use provenance::{Clock, FixedClock, FixedIdentity, IdentityProvider, SystemClock, SystemIdentity};
pub use types::{
    ArtifactKind, ArtifactSet, CompiledManifest, ManifestDocument, ManifestEntry, ProjectSpec,
    ResolvedArtifact, DEFAULT_MANIFEST_EXTENSION, MANIFEST_ROOT,
};

pub use manifest_writer::{read_from_path, write_to_path};
