//! Outcome of one reconciliation cycle

use serde::Serialize;

/// What one cycle changed on the remote side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Remote paths of uploaded files
    pub uploaded: Vec<String>,
    /// Remote paths of deleted files
    pub deleted: Vec<String>,
    /// Remote paths of removed directories
    pub removed_dirs: Vec<String>,
    /// Per-item failures that were skipped
    pub errors: Vec<String>,
}

impl CycleReport {
    /// True when the cycle changed nothing on the remote side.
    pub fn is_quiet(&self) -> bool {
        self.uploaded.is_empty() && self.deleted.is_empty() && self.removed_dirs.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn record_error(&mut self, context: &str, error: &crate::Error) {
        self.errors.push(format!("{context}: {error}"));
    }

    pub fn summary(&self) -> String {
        format!(
            "{} uploaded, {} deleted, {} directories removed, {} errors",
            self.uploaded.len(),
            self.deleted.len(),
            self.removed_dirs.len(),
            self.errors.len()
        )
    }
}
