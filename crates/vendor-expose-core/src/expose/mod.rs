//! Strategies for projecting a source directory into a target location.
//!
//! Every strategy implements [`ExposeMethod`]. Expected failures (missing
//! source, permission problems, filesystems without symlink support) are
//! returned as [`ExposureOutcome::Failed`] rather than panicking or
//! propagating, so a [`ChainedMethod`] can fall through to the next
//! candidate.

pub mod chained;
pub mod copy;
pub mod selector;
pub mod symlink;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ExposeError;
use crate::fs::{entry_exists, is_symlink, remove_path_if_exists, remove_symlink};

pub use chained::ChainedMethod;
pub use copy::CopyMethod;
pub use selector::{METHOD_ENV, MethodSelector};
pub use symlink::SymlinkMethod;

/// The concrete method that produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    None,
    Copy,
    Symlink,
}

impl MethodKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MethodKind::None => "none",
            MethodKind::Copy => "copy",
            MethodKind::Symlink => "symlink",
        }
    }

    /// Undo an artifact this method created at `path`.
    ///
    /// Symlinks are only unlinked, never followed; anything other than a
    /// symlink at a symlink-recorded path is an error. Copies are deleted
    /// recursively. `None` never touched disk. Returns whether anything was
    /// removed.
    pub fn remove_artifact(self, path: &Path) -> std::io::Result<bool> {
        match self {
            MethodKind::None => Ok(false),
            MethodKind::Copy => remove_path_if_exists(path),
            MethodKind::Symlink => {
                if is_symlink(path) {
                    remove_symlink(path)?;
                    Ok(true)
                } else if entry_exists(path) {
                    Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("expected a symlink at {}", path.display()),
                    ))
                } else {
                    Ok(false)
                }
            }
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exposure {
    pub method: MethodKind,
    /// False when the target already mirrored the source.
    pub changed: bool,
}

#[derive(Debug)]
pub enum ExposureOutcome {
    Succeeded(Exposure),
    Failed(ExposeError),
}

impl ExposureOutcome {
    pub(crate) fn succeeded(method: MethodKind, changed: bool) -> Self {
        ExposureOutcome::Succeeded(Exposure { method, changed })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExposureOutcome::Succeeded(_))
    }

    pub fn into_result(self) -> Result<Exposure, ExposeError> {
        match self {
            ExposureOutcome::Succeeded(exposure) => Ok(exposure),
            ExposureOutcome::Failed(err) => Err(err),
        }
    }
}

/// One folder of one module to mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposeRequest {
    pub module: String,
    pub folder: String,
    pub source: PathBuf,
    pub target: PathBuf,
}

/// A way of mirroring a directory into the web root.
pub trait ExposeMethod: fmt::Debug + Send + Sync {
    /// Human-readable name, used in progress output.
    fn name(&self) -> String;

    fn expose_directory(&self, source: &Path, target: &Path) -> ExposureOutcome;
}

/// Leaves the filesystem untouched. Selected when exposure is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMethod;

impl ExposeMethod for NullMethod {
    fn name(&self) -> String {
        MethodKind::None.as_str().to_string()
    }

    fn expose_directory(&self, _source: &Path, target: &Path) -> ExposureOutcome {
        tracing::debug!(dest = %target.display(), "exposure disabled, skipping");
        ExposureOutcome::succeeded(MethodKind::None, false)
    }
}
