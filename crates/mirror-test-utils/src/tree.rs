//! [`TestTree`] builder for local sync roots.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use filetime::FileTime;
use mirror_core::{DirectoryArchiver, MetadataStore, ModTime, SyncEngine};
use tempfile::TempDir;

use crate::remote::MemoryRemoteStore;

/// A temporary synced root plus a separate backup directory.
///
/// # Example
///
/// ```rust,no_run
/// use mirror_test_utils::{MemoryRemoteStore, TestTree};
///
/// let tree = TestTree::new();
/// tree.write_at("docs/a.txt", "hello", 1_700_000_000);
/// let remote = MemoryRemoteStore::new();
/// let engine = tree.engine(&remote);
/// engine.run_cycle().unwrap();
/// assert_eq!(remote.file_text("/docs/a.txt").as_deref(), Some("hello"));
/// ```
pub struct TestTree {
    root: TempDir,
    backups: TempDir,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
            backups: TempDir::new().unwrap(),
        }
    }

    /// Root of the local tree.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn backup_dir(&self) -> &Path {
        self.backups.path()
    }

    /// Absolute path of `relative` below the root.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write a file, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Write a file and pin its mtime to `unix_secs`.
    pub fn write_at(&self, relative: &str, content: &str, unix_secs: i64) -> PathBuf {
        let path = self.write(relative, content);
        self.touch(relative, unix_secs);
        path
    }

    /// Set the mtime of an existing file.
    pub fn touch(&self, relative: &str, unix_secs: i64) {
        filetime::set_file_mtime(self.path(relative), FileTime::from_unix_time(unix_secs, 0))
            .unwrap();
    }

    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Remove a file or an entire directory.
    pub fn remove(&self, relative: &str) {
        let path = self.path(relative);
        if path.is_dir() {
            fs::remove_dir_all(path).unwrap();
        } else {
            fs::remove_file(path).unwrap();
        }
    }

    /// Metadata currently persisted at the root.
    pub fn metadata(&self) -> MetadataStore {
        MetadataStore::load(self.root()).unwrap()
    }

    pub fn archiver(&self) -> DirectoryArchiver {
        DirectoryArchiver::new(self.backup_dir())
    }

    /// An engine over this tree talking to `remote`, using the metadata
    /// already on disk.
    pub fn engine(&self, remote: &MemoryRemoteStore) -> SyncEngine {
        SyncEngine::with_session(
            self.root(),
            remote.boxed(),
            self.metadata(),
            Box::new(self.archiver()),
        )
        .unwrap()
    }
}

/// The [`ModTime`] for `unix_secs`.
pub fn mod_time(unix_secs: u64) -> ModTime {
    ModTime::from_system_time(UNIX_EPOCH + Duration::from_secs(unix_secs))
}

/// The [`ModTime`] of now.
pub fn now() -> ModTime {
    ModTime::from_system_time(SystemTime::now())
}
