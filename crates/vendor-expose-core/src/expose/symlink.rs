//! Symbolic link exposure.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ExposeError;
use crate::fs::{
    create_dir_symlink, is_symlink, relative_link_target, replace_with, resolves_within,
    unique_temp_path,
};

use super::{ExposeMethod, ExposureOutcome, MethodKind};

/// Expose a directory by linking to it.
///
/// Links are relative when source and target share an ancestor below the
/// filesystem root, so a project tree can be moved without breaking them.
/// Anything already at the target is replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymlinkMethod;

impl SymlinkMethod {
    fn fail(target: &Path, reason: impl std::fmt::Display) -> ExposureOutcome {
        ExposureOutcome::Failed(ExposeError::exposure_failed(
            MethodKind::Symlink,
            target,
            reason,
        ))
    }

    fn link_text(source: &Path, link_dir: &Path) -> io::Result<PathBuf> {
        let source = fs::canonicalize(source)?;
        let link_dir = fs::canonicalize(link_dir)?;
        Ok(relative_link_target(&source, &link_dir).unwrap_or(source))
    }
}

impl ExposeMethod for SymlinkMethod {
    fn name(&self) -> String {
        MethodKind::Symlink.as_str().to_string()
    }

    fn expose_directory(&self, source: &Path, target: &Path) -> ExposureOutcome {
        match fs::metadata(source) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Self::fail(target, format!("{} is not a directory", source.display())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Self::fail(target, format!("source {} does not exist", source.display()));
            }
            Err(err) => return Self::fail(target, err),
        }

        match resolves_within(target, source) {
            Ok(false) => {}
            Ok(true) => {
                return Self::fail(
                    target,
                    format!("{} resolves inside source {}", target.display(), source.display()),
                );
            }
            Err(err) => return Self::fail(target, err),
        }

        let Some(parent) = target.parent() else {
            return Self::fail(target, "target has no parent directory");
        };
        if let Err(err) = fs::create_dir_all(parent) {
            return Self::fail(target, err);
        }

        let link_text = match Self::link_text(source, parent) {
            Ok(text) => text,
            Err(err) => return Self::fail(target, err),
        };

        if is_symlink(target)
            && let Ok(existing) = fs::read_link(target)
            && existing == link_text
        {
            tracing::debug!(dest = %target.display(), "symlink already in place");
            return ExposureOutcome::succeeded(MethodKind::Symlink, false);
        }

        let staged = match unique_temp_path(target) {
            Ok(path) => path,
            Err(err) => return Self::fail(target, format!("{err:#}")),
        };
        if let Err(err) = create_dir_symlink(&link_text, &staged) {
            let _ = fs::remove_file(&staged);
            return Self::fail(target, format!("cannot create symlink: {err}"));
        }
        if let Err(err) = replace_with(target, &staged) {
            let _ = crate::fs::remove_symlink(&staged);
            return Self::fail(target, format!("{err:#}"));
        }

        tracing::debug!(
            link = %target.display(),
            points_to = %link_text.display(),
            "created symlink"
        );
        ExposureOutcome::succeeded(MethodKind::Symlink, true)
    }
}
