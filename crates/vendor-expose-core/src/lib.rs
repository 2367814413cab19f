//! Vendor Expose Core Library
//!
//! Publishes folders of installed vendor modules under a project's web root,
//! by symlink or copy, and keeps the published tree in step with the set of
//! installed modules.

pub mod config;
pub mod error;
pub mod expose;
pub mod fs;
pub mod module;
pub mod orchestration;
pub mod packages;
pub mod registry;
pub mod validate;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigOverrides, ExposeConfig, SupportFile};

    // Errors
    pub use crate::error::ExposeError;

    // Exposure
    pub use crate::expose::{
        ChainedMethod, CopyMethod, ExposeMethod, ExposeRequest, Exposure, ExposureOutcome,
        MethodKind, MethodSelector, NullMethod, SymlinkMethod,
    };

    // Modules
    pub use crate::module::{ModuleDescriptor, Package};
    pub use crate::packages::PackageSet;

    // Orchestration
    pub use crate::orchestration::{
        ChangeSet, ExposureOrchestrator, Notifier, RecordingNotifier, RunReport, SyncReport,
        TracingNotifier,
    };

    // Registry
    pub use crate::registry::{ExposureRecord, ResourceRegistry};

    pub use crate::validate::validate_folder;
}
