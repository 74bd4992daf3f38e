//! Durable per-path ownership and expiry metadata.
//!
//! Two flat text files live at the synced root, one mapping each tracked
//! remote path to its owner tag and one mapping it to an absolute expiry in
//! epoch milliseconds. Both are loaded once and rewritten in full after
//! every mutation.

mod table;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mirror_fs::{MirrorFile, RobustnessConfig, io};

use crate::Result;

/// Owner tag that protects an entry from orphan cleanup.
pub const USER_OWNER: &str = "user";

/// Ownership and lifetime mappings keyed by remote path.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    owners_path: PathBuf,
    lifetimes_path: PathBuf,
    owners: BTreeMap<String, String>,
    lifetimes: BTreeMap<String, i64>,
    robustness: RobustnessConfig,
}

impl MetadataStore {
    /// An empty store that will persist into `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            owners_path: root.join(MirrorFile::Owners.as_str()),
            lifetimes_path: root.join(MirrorFile::Lifetimes.as_str()),
            owners: BTreeMap::new(),
            lifetimes: BTreeMap::new(),
            robustness: RobustnessConfig::default(),
        }
    }

    /// Load both mappings from `root`. Missing files are empty mappings.
    ///
    /// # Errors
    ///
    /// Returns an error if a metadata file exists but cannot be read.
    pub fn load(root: &Path) -> Result<Self> {
        let mut store = Self::new(root);

        if let Some(content) = io::read_text_if_exists(&store.owners_path)? {
            store.owners = table::parse(&content, MirrorFile::Owners.as_str());
        }
        if let Some(content) = io::read_text_if_exists(&store.lifetimes_path)? {
            store.lifetimes = table::parse(&content, MirrorFile::Lifetimes.as_str());
        }

        tracing::debug!(
            owners = store.owners.len(),
            lifetimes = store.lifetimes.len(),
            "Loaded metadata"
        );
        Ok(store)
    }

    /// Rewrite both files wholesale.
    pub fn save(&self) -> Result<()> {
        io::write_atomic(
            &self.owners_path,
            table::render(&self.owners).as_bytes(),
            self.robustness,
        )?;
        io::write_atomic(
            &self.lifetimes_path,
            table::render(&self.lifetimes).as_bytes(),
            self.robustness,
        )?;
        Ok(())
    }

    pub fn owner(&self, path: &str) -> Option<&str> {
        self.owners.get(path).map(String::as_str)
    }

    /// Whether orphan cleanup must leave `path` alone.
    pub fn is_protected(&self, path: &str) -> bool {
        self.owner(path) == Some(USER_OWNER)
    }

    /// Absolute expiry in epoch milliseconds, if any.
    pub fn expiry(&self, path: &str) -> Option<i64> {
        self.lifetimes.get(path).copied()
    }

    /// Whether `path` has an expiry strictly before `now_ms`.
    pub fn is_expired(&self, path: &str, now_ms: i64) -> bool {
        self.expiry(path).is_some_and(|expires_at| expires_at < now_ms)
    }

    /// Set the owner and expiry of `path`. `None` clears any expiry.
    pub fn record(&mut self, path: &str, owner: &str, expires_at: Option<i64>) {
        self.owners.insert(path.to_string(), owner.to_string());
        match expires_at {
            Some(expires_at) => {
                self.lifetimes.insert(path.to_string(), expires_at);
            }
            None => {
                self.lifetimes.remove(path);
            }
        }
    }

    /// Drop `path` from both mappings. Returns whether anything changed.
    pub fn forget(&mut self, path: &str) -> bool {
        let owned = self.owners.remove(path).is_some();
        let timed = self.lifetimes.remove(path).is_some();
        owned || timed
    }

    pub fn owners(&self) -> impl Iterator<Item = (&str, &str)> {
        self.owners.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn lifetimes(&self) -> impl Iterator<Item = (&str, i64)> {
        self.lifetimes.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Every tracked path, sorted and without duplicates.
    pub fn tracked_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .owners
            .keys()
            .chain(self.lifetimes.keys())
            .map(String::as_str)
            .collect();
        paths.sort_unstable();
        paths.dedup();
        paths
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty() && self.lifetimes.is_empty()
    }

    pub fn owners_path(&self) -> &Path {
        &self.owners_path
    }

    pub fn lifetimes_path(&self) -> &Path {
        &self.lifetimes_path
    }
}
