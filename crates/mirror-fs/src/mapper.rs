//! Translation between local filesystem paths and remote path strings.
//!
//! Remote paths are root-relative, forward-slash separated and always start
//! with `/`. Directories carry a trailing slash (`/photos/2024/`), files do
//! not (`/photos/2024/beach.jpg`). The same string is the key used by the
//! metadata store, so both sides of a comparison must go through here.

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Maps paths below a synced root to remote paths and back.
#[derive(Debug, Clone)]
pub struct PathMapper {
    root: PathBuf,
}

impl PathMapper {
    /// Create a mapper for `root`.
    ///
    /// The root is canonicalized so that paths discovered by a walk and paths
    /// handed in by a caller agree on their prefix.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = dunce::canonicalize(root).map_err(|e| Error::io(root, e))?;
        Ok(Self { root })
    }

    /// The canonical local root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remote path for a local file or directory below the root.
    ///
    /// Paths that do not literally start with the canonical root, or that
    /// contain `..`, are canonicalized first and must then exist.
    pub fn to_remote(&self, local: &Path, is_dir: bool) -> Result<String> {
        let segments = match self.plain_segments(local) {
            Some(segments) => segments,
            None => {
                let absolute = if local.is_absolute() {
                    local.to_path_buf()
                } else {
                    self.root.join(local)
                };
                let canonical =
                    dunce::canonicalize(&absolute).map_err(|e| Error::io(&absolute, e))?;
                if !canonical.starts_with(&self.root) {
                    return Err(Error::OutsideRoot {
                        path: local.to_path_buf(),
                        root: self.root.clone(),
                    });
                }
                self.plain_segments(&canonical)
                    .ok_or_else(|| Error::UnmappablePath {
                        path: local.to_path_buf(),
                    })?
            }
        };

        if segments.is_empty() {
            return Ok("/".to_string());
        }

        let mut remote = format!("/{}", segments.join("/"));
        if is_dir {
            remote.push('/');
        }
        Ok(remote)
    }

    /// Segments of `local` below the root, if it is a plain descendant.
    fn plain_segments(&self, local: &Path) -> Option<Vec<String>> {
        let relative = local.strip_prefix(&self.root).ok()?;
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => {
                    segments.push(segment.to_string_lossy().into_owned())
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(segments)
    }

    /// Local path for a remote path. `.` and `..` segments are dropped so
    /// the result never leaves the root.
    pub fn to_local(&self, remote: &str) -> PathBuf {
        remote
            .split('/')
            .filter(|segment| !matches!(*segment, "" | "." | ".."))
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

/// Directory segments leading to `remote`, top-down, excluding the entry
/// itself. `/a/b/c.txt` yields `a`, `b`.
pub fn parent_segments(remote: &str) -> Vec<&str> {
    let trimmed = remote.trim_end_matches('/');
    let parent = match trimmed.rfind('/') {
        Some(idx) => &trimmed[..idx],
        None => "",
    };
    parent.split('/').filter(|s| !s.is_empty()).collect()
}

/// Remote path of a child entry listed inside directory `parent`.
pub fn child_path(parent: &str, name: &str, is_dir: bool) -> String {
    let mut path = format!("{}/{}", parent.trim_end_matches('/'), name);
    if is_dir {
        path.push('/');
    }
    path
}
