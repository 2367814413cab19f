//! Error taxonomy for exposure runs.
//!
//! Errors are scoped: folder-level failures ([`ExposeError::ExposureFailed`],
//! [`ExposeError::AllCandidatesFailed`]) and module-level failures
//! ([`ExposeError::InvalidExposurePath`], [`ExposeError::InvalidModuleLocation`])
//! are reported and skipped by the orchestrator. Only
//! [`ExposeError::FilesystemFatal`] aborts a run.

use std::path::PathBuf;

use crate::expose::MethodKind;

#[derive(Debug, thiserror::Error)]
pub enum ExposeError {
    #[error("Invalid module folder '{path}' declared by {module}")]
    InvalidExposurePath { module: String, path: String },

    #[error("Cannot derive a resource path for {module} from {}", path.display())]
    InvalidModuleLocation { module: String, path: PathBuf },

    #[error("{method} exposure of {} failed: {reason}", target.display())]
    ExposureFailed {
        method: MethodKind,
        target: PathBuf,
        reason: String,
    },

    #[error("All exposure methods failed for {}{}", target.display(), summarize(failures))]
    AllCandidatesFailed {
        target: PathBuf,
        failures: Vec<ExposeError>,
    },

    #[error("Resource registry {} is unreadable: {reason}", path.display())]
    RegistryCorrupt { path: PathBuf, reason: String },

    #[error("Failed to write resource registry {}", path.display())]
    Registry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot prepare resources root {}", path.display())]
    FilesystemFatal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExposeError {
    pub(crate) fn exposure_failed(
        method: MethodKind,
        target: &std::path::Path,
        reason: impl std::fmt::Display,
    ) -> Self {
        ExposeError::ExposureFailed {
            method,
            target: target.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExposeError::FilesystemFatal { .. })
    }
}

fn summarize(failures: &[ExposeError]) -> String {
    if failures.is_empty() {
        return " (no methods configured)".to_string();
    }
    let reasons: Vec<String> = failures.iter().map(|f| f.to_string()).collect();
    format!(": {}", reasons.join("; "))
}
