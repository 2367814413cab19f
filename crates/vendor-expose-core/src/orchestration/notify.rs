//! Where progress and warning lines go.

use std::sync::Mutex;

/// Receives human-readable lines while a run is in progress.
pub trait Notifier: Send + Sync {
    fn progress(&self, message: &str);
    fn warning(&self, message: &str);
}

/// Forwards every line to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn progress(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Progress(String),
    Warning(String),
}

/// Keeps every line in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Warning(message) => Some(message),
                Notice::Progress(_) => None,
            })
            .collect()
    }

    pub fn progress_lines(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Progress(message) => Some(message),
                Notice::Warning(_) => None,
            })
            .collect()
    }

    fn push(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notice);
    }
}

impl Notifier for RecordingNotifier {
    fn progress(&self, message: &str) {
        self.push(Notice::Progress(message.to_string()));
    }

    fn warning(&self, message: &str) {
        self.push(Notice::Warning(message.to_string()));
    }
}
