//! Pure traversal of the local tree

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use mirror_fs::{MirrorFile, PathMapper};
use walkdir::WalkDir;

use crate::Result;
use crate::remote::EntryKind;
use crate::timestamp::ModTime;

/// One file or directory found below the synced root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub local: PathBuf,
    pub remote: String,
    pub kind: EntryKind,
    /// Set for files only
    pub modified: Option<ModTime>,
}

/// Every descendant of the root discovered by one walk.
///
/// Rebuilt each cycle and never persisted. The metadata files at the root
/// are not part of the mirrored content and are left out.
#[derive(Debug, Clone, Default)]
pub struct LocalTreeSnapshot {
    entries: Vec<LocalEntry>,
    index: HashSet<String>,
}

impl LocalTreeSnapshot {
    /// Walk the tree below `mapper.root()`.
    ///
    /// Any unreadable entry fails the whole scan: a partial snapshot would
    /// make the missing content look orphaned on the remote side.
    pub fn scan(mapper: &PathMapper) -> Result<Self> {
        let mut snapshot = Self::default();
        let walker = WalkDir::new(mapper.root())
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() != 1
                    || !MirrorFile::is_metadata_name(&entry.file_name().to_string_lossy())
            });

        for entry in walker {
            let entry = entry.map_err(|e| walk_error(mapper.root(), e))?;
            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else if file_type.is_symlink() {
                match link_target_kind(entry.path())? {
                    Some(kind) => kind,
                    None => continue,
                }
            } else {
                tracing::debug!(path = %entry.path().display(), "Skipping special file");
                continue;
            };

            let remote = mapper.to_remote(entry.path(), kind.is_dir())?;
            let modified = match kind {
                EntryKind::File => Some(
                    ModTime::of_file(entry.path())
                        .map_err(|e| mirror_fs::Error::io(entry.path(), e))?,
                ),
                EntryKind::Directory => None,
            };

            snapshot.push(LocalEntry {
                local: entry.into_path(),
                remote,
                kind,
                modified,
            });
        }

        Ok(snapshot)
    }

    fn push(&mut self, entry: LocalEntry) {
        self.index.insert(entry.remote.clone());
        self.entries.push(entry);
    }

    /// Whether `remote_path` (with trailing slash for directories) exists locally.
    pub fn contains(&self, remote_path: &str) -> bool {
        self.index.contains(remote_path)
    }

    pub fn entries(&self) -> &[LocalEntry] {
        &self.entries
    }

    pub fn files(&self) -> impl Iterator<Item = &LocalEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::File)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Kind of the entry a symlink points at. Links are never descended, so a
/// linked directory is mirrored as an empty one. Dangling links are skipped.
fn link_target_kind(link: &Path) -> Result<Option<EntryKind>> {
    match std::fs::metadata(link) {
        Ok(meta) if meta.is_file() => Ok(Some(EntryKind::File)),
        Ok(meta) if meta.is_dir() => {
            tracing::debug!(path = %link.display(), "Not descending into linked directory");
            Ok(Some(EntryKind::Directory))
        }
        Ok(_) => {
            tracing::debug!(path = %link.display(), "Skipping link to special file");
            Ok(None)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %link.display(), "Skipping dangling link");
            Ok(None)
        }
        Err(e) => Err(mirror_fs::Error::io(link, e).into()),
    }
}

fn walk_error(root: &Path, error: walkdir::Error) -> crate::Error {
    let path = error
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let source = error
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
    mirror_fs::Error::io(path, source).into()
}
