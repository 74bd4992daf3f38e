//! Safety copies taken before a file is uploaded
//!
//! Every upload first copies the local file into a backup destination. A
//! failed copy fails the upload, so nothing reaches the remote store without
//! a local safety copy.

mod directory;

pub use directory::DirectoryArchiver;

use std::path::{Path, PathBuf};

use crate::Result;

/// Copies a local file somewhere safe before it is uploaded.
pub trait BackupArchiver: Send + Sync {
    /// Archive `file`, whose remote path is `remote_path`, overwriting any
    /// previous copy. Returns where the copy was written.
    fn archive(&self, file: &Path, remote_path: &str) -> Result<PathBuf>;
}
