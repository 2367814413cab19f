//! Ordered fallback over several methods.

use std::path::Path;

use crate::error::ExposeError;

use super::{ExposeMethod, ExposureOutcome};

/// Try each candidate in turn; the first success wins.
///
/// The winning candidate's [`MethodKind`](super::MethodKind) is carried in
/// the outcome so the registry can later remove the artifact the right way.
#[derive(Debug)]
pub struct ChainedMethod {
    candidates: Vec<Box<dyn ExposeMethod>>,
}

impl ChainedMethod {
    pub fn new(candidates: Vec<Box<dyn ExposeMethod>>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[Box<dyn ExposeMethod>] {
        &self.candidates
    }
}

impl ExposeMethod for ChainedMethod {
    fn name(&self) -> String {
        self.candidates
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn expose_directory(&self, source: &Path, target: &Path) -> ExposureOutcome {
        let mut failures = Vec::new();

        for candidate in &self.candidates {
            match candidate.expose_directory(source, target) {
                ExposureOutcome::Succeeded(exposure) => {
                    if !failures.is_empty() {
                        tracing::debug!(
                            dest = %target.display(),
                            method = %exposure.method,
                            "fell back after {} failed attempt(s)",
                            failures.len()
                        );
                    }
                    return ExposureOutcome::Succeeded(exposure);
                }
                ExposureOutcome::Failed(err) => {
                    tracing::debug!(method = %candidate.name(), error = %err, "candidate failed");
                    failures.push(err);
                }
            }
        }

        ExposureOutcome::Failed(ExposeError::AllCandidatesFailed {
            target: target.to_path_buf(),
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expose::{CopyMethod, MethodKind, NullMethod};
    use crate::fs::trees_match;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct FailingStub;

    impl ExposeMethod for FailingStub {
        fn name(&self) -> String {
            "failing".to_string()
        }

        fn expose_directory(&self, _source: &Path, target: &Path) -> ExposureOutcome {
            ExposureOutcome::Failed(ExposeError::exposure_failed(
                MethodKind::Symlink,
                target,
                "symlinks are not permitted here",
            ))
        }
    }

    #[test]
    fn falls_back_to_copy() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).expect("create_dir_all should succeed");
        fs::write(src.join("a.css"), "a{}").expect("write should succeed");
        let dst = tmp.path().join("dst");

        let chain = ChainedMethod::new(vec![Box::new(FailingStub), Box::new(CopyMethod)]);
        let exposure = chain
            .expose_directory(&src, &dst)
            .into_result()
            .expect("chain should succeed via copy");
        assert_eq!(exposure.method, MethodKind::Copy);
        assert!(trees_match(&src, &dst));
    }

    #[test]
    fn first_success_short_circuits() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let dst = tmp.path().join("dst");
        let chain = ChainedMethod::new(vec![Box::new(NullMethod), Box::new(CopyMethod)]);
        let exposure = chain
            .expose_directory(&tmp.path().join("src"), &dst)
            .into_result()
            .expect("null method succeeds");
        assert_eq!(exposure.method, MethodKind::None);
        assert!(!dst.exists());
    }

    #[test]
    fn all_failures_are_collected() {
        let chain = ChainedMethod::new(vec![Box::new(FailingStub), Box::new(FailingStub)]);
        let outcome = chain.expose_directory(Path::new("/src"), Path::new("/dst"));
        match outcome {
            ExposureOutcome::Failed(ExposeError::AllCandidatesFailed { failures, .. }) => {
                assert_eq!(failures.len(), 2);
            }
            other => panic!("expected AllCandidatesFailed, got {other:?}"),
        }
    }

    #[test]
    fn empty_chain_fails() {
        let chain = ChainedMethod::new(Vec::new());
        assert!(!chain
            .expose_directory(Path::new("/src"), Path::new("/dst"))
            .is_success());
        assert_eq!(chain.name(), "");
    }
}
