//! What a run did, in a form the CLI can print or serialize.

use std::path::PathBuf;

use serde::Serialize;

use crate::expose::MethodKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExposedFolder {
    pub module: String,
    pub folder: String,
    pub target: PathBuf,
    pub method: MethodKind,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderFailure {
    pub module: String,
    pub folder: String,
    pub target: PathBuf,
    pub reason: String,
}

/// A second module asked for a target another module already claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub target: PathBuf,
    pub owner: String,
    pub module: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedModule {
    pub module: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Name of the active method
    pub method: String,
    pub seeded: Vec<PathBuf>,
    pub exposed: Vec<ExposedFolder>,
    pub skipped: Vec<SkippedModule>,
    pub conflicts: Vec<Conflict>,
    pub failures: Vec<FolderFailure>,
    /// Recorded targets removed because nothing claims them anymore
    pub pruned: Vec<PathBuf>,
    /// Unrecorded entries removed from the resources root
    pub swept: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl SyncReport {
    pub fn changed(&self) -> usize {
        self.exposed.iter().filter(|folder| folder.changed).count()
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RemovalReport {
    pub module: String,
    pub removed: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum RunReport {
    Sync(SyncReport),
    Removal { removals: Vec<RemovalReport> },
}

impl RunReport {
    pub fn warnings(&self) -> Vec<String> {
        match self {
            RunReport::Sync(report) => report.warnings.clone(),
            RunReport::Removal { removals } => removals
                .iter()
                .flat_map(|report| report.warnings.iter().cloned())
                .collect(),
        }
    }
}
