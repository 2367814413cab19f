#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use vendor_expose_core::config::{DEFAULT_MODULE_TYPE, ExposeConfig};
use vendor_expose_core::expose::{ExposeMethod, ExposureOutcome, MethodKind};
use vendor_expose_core::error::ExposeError;
use vendor_expose_core::module::Package;
use vendor_expose_core::orchestration::{ExposureOrchestrator, RecordingNotifier};

/// A scratch project with modules installed under `deps/`.
pub struct Project {
    tmp: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().expect("tempdir should succeed"),
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn resources(&self) -> PathBuf {
        self.root().join("resources")
    }

    pub fn config(&self) -> ExposeConfig {
        ExposeConfig::new(self.root())
    }

    /// Install `name` under `deps/<install>` with one file per folder.
    pub fn install_at(&self, name: &str, install: &str, folders: &[&str]) -> Package {
        let install_path = self.root().join("deps").join(install);
        for folder in folders {
            write_file(
                &install_path.join(folder).join("index.js"),
                &format!("// {name}/{folder}\n"),
            );
        }
        Package::new(name, DEFAULT_MODULE_TYPE)
            .with_install_path(install_path)
            .with_expose(folders.iter().copied())
    }

    pub fn install(&self, name: &str, folders: &[&str]) -> Package {
        self.install_at(name, name, folders)
    }

    pub fn orchestrator(
        &self,
        method: Box<dyn ExposeMethod>,
    ) -> (ExposureOrchestrator, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let orchestrator =
            ExposureOrchestrator::new(self.config(), notifier.clone()).with_method(method);
        (orchestrator, notifier)
    }
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create_dir_all should succeed in test temp dirs");
    }
    fs::write(path, content).expect("write should succeed in test temp dirs");
}

/// Stands in for a filesystem that refuses symlinks.
#[derive(Debug)]
pub struct FailingStub;

impl ExposeMethod for FailingStub {
    fn name(&self) -> String {
        "failing".to_string()
    }

    fn expose_directory(&self, _source: &Path, target: &Path) -> ExposureOutcome {
        ExposureOutcome::Failed(ExposeError::ExposureFailed {
            method: MethodKind::Symlink,
            target: target.to_path_buf(),
            reason: "symlinks are not supported here".to_string(),
        })
    }
}
