use crate::module::Package;

/// What the dependency manager changed in this run.
///
/// Removed packages are carried whole since they no longer appear in the
/// installed list and their install location is needed to find their
/// resource path.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<Package>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Expose every module and reconcile the whole resources root.
    Full,
    /// Only tear down what the removed packages exposed.
    Removal,
}

impl ChangeSet {
    pub fn mode(&self) -> RunMode {
        if self.added.is_empty() && self.updated.is_empty() && !self.removed.is_empty() {
            RunMode::Removal
        } else {
            RunMode::Full
        }
    }
}
