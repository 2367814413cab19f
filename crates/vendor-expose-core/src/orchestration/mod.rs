//! Exposure runs: full reconciliation and targeted removal.

pub mod changes;
pub mod notify;
pub mod orchestrator;
pub mod report;

pub use changes::{ChangeSet, RunMode};
pub use notify::{Notice, Notifier, RecordingNotifier, TracingNotifier};
pub use orchestrator::ExposureOrchestrator;
pub use report::{
    Conflict, ExposedFolder, FolderFailure, RemovalReport, RunReport, SkippedModule, SyncReport,
};
