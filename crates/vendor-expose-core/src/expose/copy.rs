//! Real directory copies.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::ExposeError;
use crate::fs::{
    copy_tree, is_symlink, replace_with, resolves_within, trees_match, unique_temp_path,
};

use super::{ExposeMethod, ExposureOutcome, MethodKind};

/// Mirror a directory by copying every file.
///
/// The copy is staged in a hidden sibling of the target and swapped in, so
/// the target ends up an exact mirror of the source and a failed copy leaves
/// the previous artifact intact. A target that already hashes identically
/// to the source is left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyMethod;

impl CopyMethod {
    fn fail(target: &Path, reason: impl std::fmt::Display) -> ExposureOutcome {
        ExposureOutcome::Failed(ExposeError::exposure_failed(
            MethodKind::Copy,
            target,
            reason,
        ))
    }
}

impl ExposeMethod for CopyMethod {
    fn name(&self) -> String {
        MethodKind::Copy.as_str().to_string()
    }

    fn expose_directory(&self, source: &Path, target: &Path) -> ExposureOutcome {
        match fs::metadata(source) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Self::fail(target, format!("{} is not a directory", source.display())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(source = %source.display(), "source folder absent, nothing to copy");
                return ExposureOutcome::succeeded(MethodKind::Copy, false);
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

        if !is_symlink(target) && target.is_dir() && trees_match(source, target) {
            tracing::debug!(dest = %target.display(), "copy already up to date");
            return ExposureOutcome::succeeded(MethodKind::Copy, false);
        }

        let Some(parent) = target.parent() else {
            return Self::fail(target, "target has no parent directory");
        };
        if let Err(err) = fs::create_dir_all(parent) {
            return Self::fail(target, err);
        }

        let staged = match unique_temp_path(target) {
            Ok(path) => path,
            Err(err) => return Self::fail(target, format!("{err:#}")),
        };
        let result = fs::create_dir_all(&staged)
            .map_err(anyhow::Error::from)
            .and_then(|()| copy_tree(source, &staged))
            .and_then(|()| replace_with(target, &staged));

        match result {
            Ok(()) => {
                tracing::debug!(
                    source = %source.display(),
                    dest = %target.display(),
                    "copied folder"
                );
                ExposureOutcome::succeeded(MethodKind::Copy, true)
            }
            Err(err) => {
                let _ = fs::remove_dir_all(&staged);
                Self::fail(target, format!("{err:#}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed(dir: &Path) {
        fs::create_dir_all(dir.join("css")).expect("create_dir_all should succeed");
        fs::write(dir.join("app.js"), "init()").expect("write should succeed");
        fs::write(dir.join("css/site.css"), "body{}").expect("write should succeed");
    }

    #[test]
    fn copies_into_missing_parents() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let src = tmp.path().join("deps/acme/widgets/client");
        seed(&src);
        let dst = tmp.path().join("resources/acme/widgets/client");

        let exposure = CopyMethod
            .expose_directory(&src, &dst)
            .into_result()
            .expect("copy should succeed");
        assert_eq!(exposure.method, MethodKind::Copy);
        assert!(exposure.changed);
        assert!(trees_match(&src, &dst));
    }

    #[test]
    fn missing_source_is_success_without_output() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let dst = tmp.path().join("resources/client");
        let outcome = CopyMethod.expose_directory(&tmp.path().join("absent"), &dst);
        let exposure = outcome.into_result().expect("absent source is not an error");
        assert!(!exposure.changed);
        assert!(!dst.exists());
    }

    #[test]
    fn unchanged_source_is_not_recopied() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let src = tmp.path().join("src");
        seed(&src);
        let dst = tmp.path().join("dst");

        assert!(CopyMethod.expose_directory(&src, &dst).is_success());
        let second = CopyMethod
            .expose_directory(&src, &dst)
            .into_result()
            .expect("second copy should succeed");
        assert!(!second.changed);
    }

    #[test]
    fn changed_source_overwrites_and_drops_removed_files() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let src = tmp.path().join("src");
        seed(&src);
        let dst = tmp.path().join("dst");
        assert!(CopyMethod.expose_directory(&src, &dst).is_success());

        fs::write(src.join("app.js"), "init(2)").expect("write should succeed");
        fs::remove_file(src.join("css/site.css")).expect("remove should succeed");

        let exposure = CopyMethod
            .expose_directory(&src, &dst)
            .into_result()
            .expect("recopy should succeed");
        assert!(exposure.changed);
        assert_eq!(
            fs::read_to_string(dst.join("app.js")).expect("read should succeed"),
            "init(2)"
        );
        assert!(!dst.join("css/site.css").exists());
    }

    #[test]
    fn source_that_is_a_file_fails() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let file = tmp.path().join("file.txt");
        fs::write(&file, "x").expect("write should succeed");
        let outcome = CopyMethod.expose_directory(&file, &tmp.path().join("dst"));
        assert!(matches!(
            outcome,
            ExposureOutcome::Failed(ExposeError::ExposureFailed {
                method: MethodKind::Copy,
                ..
            })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn replaces_existing_symlink_without_writing_through_it() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let src = tmp.path().join("src");
        seed(&src);
        let dst = tmp.path().join("dst");
        std::os::unix::fs::symlink(&src, &dst).expect("symlink should succeed");

        let exposure = CopyMethod
            .expose_directory(&src, &dst)
            .into_result()
            .expect("copy should succeed");
        assert!(exposure.changed);
        assert!(!is_symlink(&dst));
        assert!(trees_match(&src, &dst));
        assert!(src.join("app.js").exists());
    }

    #[cfg(unix)]
    #[test]
    fn refuses_target_reached_through_link_into_source() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let src = tmp.path().join("deps/acme/widgets/js");
        seed(&src.join("dist"));
        let web = tmp.path().join("resources/acme/widgets");
        fs::create_dir_all(&web).expect("create_dir_all should succeed");
        std::os::unix::fs::symlink(&src, web.join("js")).expect("symlink should succeed");

        let outcome = CopyMethod.expose_directory(&src.join("dist"), &web.join("js/dist"));
        assert!(matches!(
            outcome,
            ExposureOutcome::Failed(ExposeError::ExposureFailed {
                method: MethodKind::Copy,
                ..
            })
        ));
        assert!(src.join("dist/app.js").is_file());
        assert!(src.join("dist/css/site.css").is_file());
    }
}
