//! Backups into a local directory tree

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

use super::BackupArchiver;

/// Archives files under a destination directory, keeping their remote
/// layout so that same-named files in different folders do not collide.
#[derive(Debug, Clone)]
pub struct DirectoryArchiver {
    destination: PathBuf,
}

impl DirectoryArchiver {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Where the copy of `remote_path` lives.
    pub fn backup_path(&self, remote_path: &str) -> PathBuf {
        remote_path
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
            .fold(self.destination.clone(), |path, segment| path.join(segment))
    }
}

impl BackupArchiver for DirectoryArchiver {
    fn archive(&self, file: &Path, remote_path: &str) -> Result<PathBuf> {
        let target = self.backup_path(remote_path);
        let backup_error = |source: std::io::Error| Error::Backup {
            path: file.to_path_buf(),
            destination: self.destination.clone(),
            source,
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(backup_error)?;
        }
        fs::copy(file, &target).map_err(backup_error)?;

        tracing::debug!(file = %file.display(), backup = %target.display(), "Backed up file");
        Ok(target)
    }
}
