//! The locked remote session: one cursor, one metadata store.

use mirror_fs::parent_segments;
use tracing::debug;

use crate::metadata::MetadataStore;
use crate::remote::RemoteFileStore;
use crate::timestamp::ModTime;
use crate::{Error, Result};

/// Everything the engine mutates, guarded together by one lock.
pub(crate) struct Session {
    pub(crate) remote: Box<dyn RemoteFileStore>,
    pub(crate) metadata: MetadataStore,
}

impl Session {
    /// The remote store with its cursor reset to the root.
    ///
    /// All path-qualified calls go through here because the working
    /// directory is shared by every operation on the session.
    pub(crate) fn at_root(&mut self) -> Result<&mut (dyn RemoteFileStore + 'static)> {
        if !self.remote.change_directory("/")? {
            return Err(Error::Navigation { path: "/".into() });
        }
        Ok(&mut *self.remote)
    }

    /// Create any missing directories leading to `remote_path`, top-down.
    pub(crate) fn ensure_parent_dirs(&mut self, remote_path: &str) -> Result<()> {
        let remote = self.at_root()?;
        let mut exists = true;

        for segment in parent_segments(remote_path) {
            if exists {
                exists = remote.change_directory(segment)?;
            }
            if exists {
                continue;
            }

            match remote.make_directory(segment) {
                Ok(true) => debug!(segment, path = remote_path, "Created remote directory"),
                Ok(false) => {
                    return Err(Error::DirectoryCreation {
                        segment: segment.to_string(),
                        path: remote_path.to_string(),
                        reason: "request refused".into(),
                    });
                }
                Err(e) if e.is_connection() => return Err(e.into()),
                Err(e) => {
                    return Err(Error::DirectoryCreation {
                        segment: segment.to_string(),
                        path: remote_path.to_string(),
                        reason: e.to_string(),
                    });
                }
            }

            if !remote.change_directory(segment)? {
                return Err(Error::Navigation {
                    path: segment.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Modification time of the remote file at `remote_path`, or `None` if
    /// it does not exist.
    pub(crate) fn remote_mod_time(&mut self, remote_path: &str) -> Result<Option<ModTime>> {
        let remote = self.at_root()?;
        let listing = remote.list(Some(remote_path))?;
        match listing.len() {
            0 => Ok(None),
            1 => Ok(Some(remote.modification_time(remote_path)?)),
            count => Err(Error::AmbiguousListing {
                path: remote_path.to_string(),
                count,
            }),
        }
    }

    /// Drop `path` from the metadata and persist if anything changed.
    pub(crate) fn forget(&mut self, path: &str) -> Result<()> {
        if self.metadata.forget(path) {
            self.metadata.save()?;
        }
        Ok(())
    }
}
