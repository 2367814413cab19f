//! Registry of exposures created under the managed resources root.
//!
//! The registry remembers which method produced each target so a later run
//! can remove it correctly once no module claims it. It is stored inside the
//! resources root itself (see [`MANIFEST_FILE`]). There is no locking: a run
//! interrupted half way leaves the registry behind the disk, and the next
//! full reconciliation repairs it.

pub mod manifest;

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::ExposeError;
use crate::expose::MethodKind;
use crate::fs::prune_empty_parents;

pub use manifest::{ExposureRecord, MANIFEST_FILE, MANIFEST_VERSION, RegistryManifest};

#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    root: PathBuf,
    manifest: RegistryManifest,
    dirty: bool,
}

/// Result of removing recorded artifacts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PruneReport {
    /// Targets dropped from the registry.
    pub removed: Vec<PathBuf>,
    /// Targets whose artifact could not be removed; their records are kept.
    pub failures: Vec<PruneFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PruneFailure {
    pub target: PathBuf,
    pub reason: String,
}

impl PruneReport {
    fn merge(&mut self, other: PruneReport) {
        self.removed.extend(other.removed);
        self.failures.extend(other.failures);
    }
}

impl ResourceRegistry {
    /// An empty registry that has never been written.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest: RegistryManifest::new(),
            dirty: true,
        }
    }

    /// Read the registry from `root`. A missing manifest is a first run and
    /// yields an empty registry; an unreadable or malformed one is
    /// [`ExposeError::RegistryCorrupt`].
    pub fn load(root: &Path) -> Result<Self, ExposeError> {
        let path = root.join(MANIFEST_FILE);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::empty(root)),
            Err(err) => {
                return Err(ExposeError::RegistryCorrupt {
                    path,
                    reason: err.to_string(),
                });
            }
        };

        let manifest: RegistryManifest =
            serde_json::from_slice(&bytes).map_err(|err| ExposeError::RegistryCorrupt {
                path: path.clone(),
                reason: err.to_string(),
            })?;
        manifest
            .validate()
            .map_err(|err| ExposeError::RegistryCorrupt {
                path: path.clone(),
                reason: err.to_string(),
            })?;

        Ok(Self {
            root: root.to_path_buf(),
            manifest,
            dirty: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn len(&self) -> usize {
        self.manifest.exposures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.exposures.is_empty()
    }

    /// Whether there are changes not yet written by [`save`](Self::save).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record that `module` exposed `target` using `method`. Returns the
    /// record it replaced, if any.
    pub fn record_exposure(
        &mut self,
        target: &Path,
        method: MethodKind,
        module: &str,
    ) -> Option<ExposureRecord> {
        let record = ExposureRecord {
            method,
            module: module.to_string(),
        };
        let previous = self
            .manifest
            .exposures
            .insert(self.key_for(target), record.clone());
        if previous.as_ref() != Some(&record) {
            self.dirty = true;
        }
        previous
    }

    pub fn get(&self, target: &Path) -> Option<&ExposureRecord> {
        self.manifest.exposures.get(&self.key_for(target))
    }

    pub fn owner_of(&self, target: &Path) -> Option<&str> {
        self.get(target).map(|record| record.module.as_str())
    }

    /// Drop a record without touching disk.
    pub fn forget(&mut self, target: &Path) -> Option<ExposureRecord> {
        let removed = self.manifest.exposures.remove(&self.key_for(target));
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// All records as absolute target paths, in stable order.
    pub fn records(&self) -> impl Iterator<Item = (PathBuf, &ExposureRecord)> + '_ {
        self.manifest
            .exposures
            .iter()
            .map(|(key, record)| (self.path_for(key), record))
    }

    pub fn targets(&self) -> BTreeSet<PathBuf> {
        self.records().map(|(path, _)| path).collect()
    }

    /// Remove every recorded target not in `current`, using the method it
    /// was created with, then prune directories left empty.
    pub fn prune_stale(&mut self, current: &BTreeSet<PathBuf>) -> PruneReport {
        let current_keys: BTreeSet<String> = current.iter().map(|p| self.key_for(p)).collect();
        let stale: Vec<String> = self
            .manifest
            .exposures
            .keys()
            .filter(|key| !current_keys.contains(*key))
            .cloned()
            .collect();
        self.remove_keys(stale)
    }

    /// Remove every target owned by `module`.
    pub fn remove_module(&mut self, module: &str) -> PruneReport {
        let owned: Vec<String> = self
            .manifest
            .exposures
            .iter()
            .filter(|(_, record)| record.module == module)
            .map(|(key, _)| key.clone())
            .collect();
        self.remove_keys(owned)
    }

    fn remove_keys(&mut self, keys: Vec<String>) -> PruneReport {
        let mut report = PruneReport::default();
        for key in keys {
            report.merge(self.remove_key(&key));
        }
        report
    }

    fn remove_key(&mut self, key: &str) -> PruneReport {
        let mut report = PruneReport::default();
        let Some(record) = self.manifest.exposures.get(key).cloned() else {
            return report;
        };
        let target = self.path_for(key);

        match record.method.remove_artifact(&target) {
            Ok(removed) => {
                tracing::debug!(
                    dest = %target.display(),
                    method = %record.method,
                    removed,
                    "dropped stale exposure"
                );
                if let Err(err) = prune_empty_parents(&target, &self.root) {
                    tracing::warn!(
                        dest = %target.display(),
                        error = %err,
                        "failed to prune empty parent directories"
                    );
                }
                self.manifest.exposures.remove(key);
                self.dirty = true;
                report.removed.push(target);
            }
            Err(err) => {
                report.failures.push(PruneFailure {
                    target,
                    reason: err.to_string(),
                });
            }
        }
        report
    }

    /// Write the registry atomically (tmp + rename). Does nothing when
    /// nothing changed since it was loaded.
    pub fn save(&mut self) -> Result<(), ExposeError> {
        if !self.dirty {
            return Ok(());
        }
        let path = self.manifest_path();
        let io_err = |source: io::Error| ExposeError::Registry {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.root).map_err(io_err)?;
        self.manifest.generated_at = chrono::Utc::now();
        let bytes = serde_json::to_vec_pretty(&self.manifest)
            .map_err(|err| io_err(io::Error::other(err)))?;

        let tmp_path = self
            .root
            .join(format!("{}.tmp.{}", MANIFEST_FILE, std::process::id()));
        fs::write(&tmp_path, bytes).map_err(io_err)?;
        // Replaces any existing manifest in one step.
        if let Err(err) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_err(err));
        }

        self.dirty = false;
        Ok(())
    }

    fn key_for(&self, target: &Path) -> String {
        match target.strip_prefix(&self.root) {
            Ok(relative) => relative
                .components()
                .filter_map(|c| match c {
                    Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => target.to_string_lossy().into_owned(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let as_path = Path::new(key);
        if as_path.is_absolute() {
            return as_path.to_path_buf();
        }
        let mut path = self.root.clone();
        for segment in key.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }
}
