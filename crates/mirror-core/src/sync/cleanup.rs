//! Recursive sweep of the remote tree.
//!
//! The remote store only lists one directory at a time, so the sweep
//! walks it level by level: move the cursor into a directory, list its
//! children, decide each child's fate, recurse where needed.

use std::fmt;

use mirror_fs::child_path;
use tracing::{debug, info, warn};

use crate::metadata::MetadataStore;
use crate::remote::RemoteEntry;
use crate::{Error, Result};

use super::report::CycleReport;
use super::session::Session;
use super::snapshot::LocalTreeSnapshot;

/// What the sweep does with one remote entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Expiry has passed; removed regardless of owner
    Expired,
    /// Gone locally and not owned by the user
    Orphaned,
    /// Left in place (directories are still descended into)
    Keep,
}

impl Disposition {
    /// Decide the fate of `path`. Expiry wins over every other rule.
    pub fn classify(
        path: &str,
        metadata: &MetadataStore,
        local: &LocalTreeSnapshot,
        now_ms: i64,
    ) -> Self {
        if metadata.is_expired(path, now_ms) {
            Self::Expired
        } else if !local.contains(path) && !metadata.is_protected(path) {
            Self::Orphaned
        } else {
            Self::Keep
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => write!(f, "expired"),
            Self::Orphaned => write!(f, "orphaned"),
            Self::Keep => write!(f, "kept"),
        }
    }
}

pub(crate) struct RemoteSweep<'a> {
    session: &'a mut Session,
    local: &'a LocalTreeSnapshot,
    now_ms: i64,
    report: &'a mut CycleReport,
}

impl<'a> RemoteSweep<'a> {
    pub(crate) fn new(
        session: &'a mut Session,
        local: &'a LocalTreeSnapshot,
        now_ms: i64,
        report: &'a mut CycleReport,
    ) -> Self {
        Self {
            session,
            local,
            now_ms,
            report,
        }
    }

    pub(crate) fn run(mut self) -> Result<()> {
        self.sweep_branch("/")
    }

    /// Sweep `dir`, containing any failure other than a lost connection
    /// to this branch.
    fn sweep_branch(&mut self, dir: &str) -> Result<()> {
        match self.sweep_directory(dir) {
            Err(e) if !e.is_connectivity() => {
                warn!(dir, error = %e, "Unable to clean remote directory");
                self.report.record_error(dir, &e);
                Ok(())
            }
            other => other,
        }
    }

    fn sweep_directory(&mut self, dir: &str) -> Result<()> {
        if !self.session.remote.change_directory(dir)? {
            return Err(Error::Navigation { path: dir.into() });
        }
        let entries = self.session.remote.list(None)?;
        debug!(dir, count = entries.len(), "Listed remote directory");

        for entry in entries.iter().filter(|e| !e.is_navigation()) {
            let path = child_path(dir, &entry.name, entry.is_dir());
            let disposition =
                Disposition::classify(&path, &self.session.metadata, self.local, self.now_ms);

            let outcome = match disposition {
                Disposition::Expired | Disposition::Orphaned => {
                    self.evict(&path, entry, disposition)
                }
                Disposition::Keep if entry.is_dir() => self.sweep_branch(&path),
                Disposition::Keep => Ok(()),
            };

            match outcome {
                Err(e) if !e.is_connectivity() => {
                    warn!(path, error = %e, "Unable to clean remote entry");
                    self.report.record_error(&path, &e);
                }
                other => other?,
            }
        }
        Ok(())
    }

    fn evict(&mut self, path: &str, entry: &RemoteEntry, reason: Disposition) -> Result<()> {
        if entry.is_dir() {
            self.sweep_branch(path)?;
            if self.session.at_root()?.remove_directory(path)? {
                info!(path, %reason, "Remote directory removed");
                self.session.forget(path)?;
                self.report.removed_dirs.push(path.to_string());
            } else {
                // Protected children keep the directory alive
                debug!(path, %reason, "Remote directory not removed");
            }
        } else if self.session.at_root()?.delete(path)? {
            info!(path, %reason, "Remote file deleted");
            self.session.forget(path)?;
            self.report.deleted.push(path.to_string());
        } else {
            warn!(path, %reason, "Remote file could not be deleted");
            self.report
                .errors
                .push(format!("{path}: delete of {reason} file refused"));
        }
        Ok(())
    }
}
