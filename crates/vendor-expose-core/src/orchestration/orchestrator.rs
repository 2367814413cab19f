//! Drives full and targeted exposure runs.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ExposeConfig;
use crate::error::ExposeError;
use crate::expose::{ExposeMethod, ExposeRequest, ExposureOutcome, MethodKind};
use crate::fs::{
    is_symlink, prune_empty_parents, remove_path_if_exists, sweep_unclaimed, symlinked_ancestor,
};
use crate::module::{ModuleDescriptor, Package};
use crate::orchestration::changes::{ChangeSet, RunMode};
use crate::orchestration::notify::Notifier;
use crate::orchestration::report::{
    Conflict, ExposedFolder, FolderFailure, RemovalReport, RunReport, SkippedModule, SyncReport,
};
use crate::packages::PackageSet;
use crate::registry::{MANIFEST_FILE, PruneReport, ResourceRegistry};

pub struct ExposureOrchestrator {
    config: ExposeConfig,
    method: Box<dyn ExposeMethod>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for ExposureOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExposureOrchestrator")
            .field("config", &self.config)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl ExposureOrchestrator {
    /// Build an orchestrator using the method the config selects.
    pub fn new(config: ExposeConfig, notifier: Arc<dyn Notifier>) -> Self {
        let method = config.method().build();
        Self {
            config,
            method,
            notifier,
        }
    }

    /// Replace the configured method.
    pub fn with_method(mut self, method: Box<dyn ExposeMethod>) -> Self {
        self.method = method;
        self
    }

    pub fn config(&self) -> &ExposeConfig {
        &self.config
    }

    pub fn method(&self) -> &dyn ExposeMethod {
        self.method.as_ref()
    }

    /// Pick full reconciliation or targeted removal from `changes`.
    pub fn run(&self, packages: &PackageSet, changes: &ChangeSet) -> Result<RunReport, ExposeError> {
        match changes.mode() {
            RunMode::Full => self.sync(packages).map(RunReport::Sync),
            RunMode::Removal => {
                let removals = changes
                    .removed
                    .iter()
                    .map(|package| self.remove(package))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(RunReport::Removal { removals })
            }
        }
    }

    /// Expose every module in `packages` and reconcile the resources root
    /// so it holds exactly what they claim.
    ///
    /// Only failing to create the resources root is an error; everything
    /// else is reported in the returned [`SyncReport`].
    pub fn sync(&self, packages: &PackageSet) -> Result<SyncReport, ExposeError> {
        let root = self.config.resources_root();
        let mut report = SyncReport {
            method: self.method.name(),
            ..SyncReport::default()
        };

        self.prepare_root(&root, &mut report)?;
        let mut registry = self.load_registry(&root, &mut report.warnings);

        let plan = self.plan(packages, &mut report);
        let current: BTreeSet<PathBuf> = plan
            .iter()
            .flat_map(|(_, requests)| requests.iter().map(|r| r.target.clone()))
            .collect();

        // Stale and unrecorded entries go before anything is exposed; a new
        // exposure must never land under a leftover link.
        let pruned = registry.prune_stale(&current);
        self.report_prune_failures(&pruned, &mut report.warnings);
        report.pruned = pruned.removed;

        match sweep_unclaimed(&root, &current, &self.keep_names()) {
            Ok(swept) => {
                for path in &swept {
                    tracing::debug!(path = %path.display(), "swept unclaimed entry");
                }
                report.swept = swept;
            }
            Err(err) => self.warn(
                &mut report.warnings,
                format!("Failed to clean {}: {err}", root.display()),
            ),
        }

        for (module, requests) in &plan {
            self.notifier
                .progress(&format!("Exposing web directories for module {module}:"));
            for request in requests {
                self.notifier.progress(&format!("  - {}", request.folder));
                self.expose_one(request, &root, &mut registry, &mut report);
            }
        }

        if let Err(err) = registry.save() {
            self.warn(&mut report.warnings, err.to_string());
        }

        tracing::debug!(
            exposed = report.exposed.len(),
            changed = report.changed(),
            pruned = report.pruned.len(),
            swept = report.swept.len(),
            "sync finished"
        );
        Ok(report)
    }

    /// Tear down what `package` exposed without looking at other modules.
    pub fn remove(&self, package: &Package) -> Result<RemovalReport, ExposeError> {
        let root = self.config.resources_root();
        let mut report = RemovalReport {
            module: package.name.clone(),
            ..RemovalReport::default()
        };
        if !root.is_dir() {
            return Ok(report);
        }

        self.notifier.progress(&format!(
            "Removing web directories for module {}",
            package.name
        ));

        let mut registry = self.load_registry(&root, &mut report.warnings);
        let pruned = registry.remove_module(&package.name);
        self.report_prune_failures(&pruned, &mut report.warnings);
        report.removed = pruned.removed;

        let module = ModuleDescriptor::new(package, &self.config);
        match module.resource_path() {
            Ok(path) => {
                let shared = registry.records().any(|(target, _)| target.starts_with(&path));
                if shared {
                    tracing::debug!(
                        path = %path.display(),
                        "resource path still holds other modules' exposures"
                    );
                } else {
                    self.remove_resource_path(&path, &root, &mut report);
                }
            }
            Err(err) => tracing::debug!(error = %err, "no resource path to remove"),
        }

        if let Err(err) = registry.save() {
            self.warn(&mut report.warnings, err.to_string());
        }
        Ok(report)
    }

    /// Resolve every module's requests and settle which module owns each
    /// target. A target equal to, inside, or containing one already claimed
    /// is a conflict and is dropped.
    fn plan(
        &self,
        packages: &PackageSet,
        report: &mut SyncReport,
    ) -> Vec<(String, Vec<ExposeRequest>)> {
        let mut claimed: BTreeMap<PathBuf, String> = BTreeMap::new();
        let mut plan = Vec::new();

        for package in packages.iter() {
            let module = ModuleDescriptor::new(package, &self.config);
            let requests = match module.requests() {
                Ok(requests) => requests,
                Err(err) => {
                    self.warn(&mut report.warnings, format!("Skipping {}: {err}", module.name()));
                    report.skipped.push(SkippedModule {
                        module: module.name().to_string(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            if requests.is_empty() {
                continue;
            }

            let mut accepted = Vec::with_capacity(requests.len());
            for request in requests {
                if let Some(owner) = claimed.get(&request.target)
                    && *owner == request.module
                {
                    // Same folder declared twice.
                    continue;
                }
                let overlap = claimed.iter().find(|(target, _)| {
                    request.target.starts_with(target) || target.starts_with(&request.target)
                });
                if let Some((target, owner)) = overlap {
                    self.warn(
                        &mut report.warnings,
                        format!(
                            "Conflict: {} wants {} which overlaps {} exposed by {}; keeping {}",
                            request.module,
                            request.target.display(),
                            target.display(),
                            owner,
                            target.display()
                        ),
                    );
                    report.conflicts.push(Conflict {
                        target: request.target.clone(),
                        owner: owner.clone(),
                        module: request.module.clone(),
                    });
                    continue;
                }
                claimed.insert(request.target.clone(), request.module.clone());
                accepted.push(request);
            }
            plan.push((module.name().to_string(), accepted));
        }
        plan
    }

    fn expose_one(
        &self,
        request: &ExposeRequest,
        root: &Path,
        registry: &mut ResourceRegistry,
        report: &mut SyncReport,
    ) {
        if let Some(link) = symlinked_ancestor(&request.target, root) {
            let reason = format!("{} is a symlink", link.display());
            self.folder_failed(request, reason, report);
            return;
        }
        match self.method.expose_directory(&request.source, &request.target) {
            ExposureOutcome::Succeeded(exposure) => {
                if exposure.method == MethodKind::None {
                    self.drop_previous_artifact(request, registry, &mut report.warnings);
                }
                let previous =
                    registry.record_exposure(&request.target, exposure.method, &request.module);
                if let Some(previous) = previous
                    && previous.module != request.module
                {
                    tracing::debug!(
                        dest = %request.target.display(),
                        from = %previous.module,
                        to = %request.module,
                        "target changed owner"
                    );
                }
                report.exposed.push(ExposedFolder {
                    module: request.module.clone(),
                    folder: request.folder.clone(),
                    target: request.target.clone(),
                    method: exposure.method,
                    changed: exposure.changed,
                });
            }
            ExposureOutcome::Failed(err) => self.folder_failed(request, err.to_string(), report),
        }
    }

    fn folder_failed(&self, request: &ExposeRequest, reason: String, report: &mut SyncReport) {
        self.warn(
            &mut report.warnings,
            format!(
                "Could not expose {} of {}: {reason}",
                request.folder, request.module
            ),
        );
        report.failures.push(FolderFailure {
            module: request.module.clone(),
            folder: request.folder.clone(),
            target: request.target.clone(),
            reason,
        });
    }

    /// With exposure disabled, an artifact from an earlier run would
    /// otherwise outlive its record.
    fn drop_previous_artifact(
        &self,
        request: &ExposeRequest,
        registry: &ResourceRegistry,
        warnings: &mut Vec<String>,
    ) {
        let Some(previous) = registry.get(&request.target) else {
            return;
        };
        if let Err(err) = previous.method.remove_artifact(&request.target) {
            self.warn(
                warnings,
                format!(
                    "Failed to remove {} left by {} exposure: {err}",
                    request.target.display(),
                    previous.method
                ),
            );
        }
    }

    fn prepare_root(&self, root: &Path, report: &mut SyncReport) -> Result<(), ExposeError> {
        fs::create_dir_all(root).map_err(|source| ExposeError::FilesystemFatal {
            path: root.to_path_buf(),
            source,
        })?;

        for file in self.config.support_files() {
            let path = root.join(&file.name);
            if path.exists() {
                continue;
            }
            match fs::write(&path, &file.contents) {
                Ok(()) => report.seeded.push(path),
                Err(err) => self.warn(
                    &mut report.warnings,
                    format!("Failed to create {}: {err}", path.display()),
                ),
            }
        }
        Ok(())
    }

    fn load_registry(&self, root: &Path, warnings: &mut Vec<String>) -> ResourceRegistry {
        match ResourceRegistry::load(root) {
            Ok(registry) => registry,
            Err(err) => {
                self.warn(warnings, format!("{err}; starting with an empty registry"));
                ResourceRegistry::empty(root)
            }
        }
    }

    fn remove_resource_path(&self, path: &Path, root: &Path, report: &mut RemovalReport) {
        let removed = if is_symlink(path) {
            crate::fs::remove_symlink(path).map(|()| true)
        } else {
            remove_path_if_exists(path)
        };
        match removed {
            Ok(true) => report.removed.push(path.to_path_buf()),
            Ok(false) => {}
            Err(err) => {
                self.warn(
                    &mut report.warnings,
                    format!("Failed to remove {}: {err}", path.display()),
                );
                return;
            }
        }
        if let Err(err) = prune_empty_parents(path, root) {
            self.warn(
                &mut report.warnings,
                format!("Failed to prune parents of {}: {err}", path.display()),
            );
        }
    }

    fn report_prune_failures(&self, pruned: &PruneReport, warnings: &mut Vec<String>) {
        for failure in &pruned.failures {
            self.warn(
                warnings,
                format!(
                    "Failed to remove stale {}: {}",
                    failure.target.display(),
                    failure.reason
                ),
            );
        }
    }

    fn keep_names(&self) -> Vec<OsString> {
        self.config
            .support_files()
            .iter()
            .map(|file| OsString::from(&file.name))
            .chain(std::iter::once(OsString::from(MANIFEST_FILE)))
            .collect()
    }

    fn warn(&self, warnings: &mut Vec<String>, message: String) {
        self.notifier.warning(&message);
        warnings.push(message);
    }
}
