//! Configuration for a mirror.
//!
//! A mirror is described by a single file (TOML by default, JSON or YAML
//! by extension) that names the synced root, the remote store and the
//! schedule. Values are resolved from these sources, later ones winning:
//!
//! 1. Built-in defaults (port 21, 4 second interval)
//! 2. The config file, if it exists
//! 3. `MIRROR_*` environment variables
//! 4. Explicit overrides, usually command-line flags
//!
//! # Example
//!
//! ```toml
//! root = "/srv/photos"
//! interval_secs = 4
//!
//! [remote]
//! server = "ftp.example.com"
//! user = "camera"
//! ```

mod layer;

pub use layer::{ConfigLayer, ENV_PREFIX, RemoteLayer};

use std::path::{Path, PathBuf};
use std::time::Duration;

use mirror_fs::ConfigStore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::remote::ConnectionParams;
use crate::{Error, Result};

/// Default time between cycles.
pub const DEFAULT_INTERVAL_SECS: u64 = 4;

/// Default remote port.
pub const DEFAULT_PORT: u16 = 21;

/// Fully resolved mirror configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Local directory mirrored to the remote root
    pub root: PathBuf,

    /// Seconds between scheduled cycles
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Where files are copied before upload. Defaults to
    /// `<data dir>/mirror/backups` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,

    pub remote: ConnectionParams,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

impl MirrorConfig {
    /// A starting point for a new config file.
    pub fn starter(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            backup_dir: None,
            remote: ConnectionParams::new("localhost", DEFAULT_PORT, "anonymous", ""),
        }
    }

    /// Resolve from `path` (optional), the environment, then `overrides`.
    pub fn load(path: &Path, overrides: ConfigLayer) -> Result<Self> {
        Self::resolve(Self::load_layer(path, overrides)?)
    }

    /// Merge the file, environment and override layers without applying
    /// defaults or checking for required values.
    pub fn load_layer(path: &Path, overrides: ConfigLayer) -> Result<ConfigLayer> {
        let mut layer = ConfigStore::new()
            .load_optional::<ConfigLayer>(path)?
            .unwrap_or_default();
        debug!(path = %path.display(), "Loaded config file layer");

        layer.merge(ConfigLayer::from_env()?);
        layer.merge(overrides);
        Ok(layer)
    }

    /// Apply defaults to a merged layer, failing on missing required values.
    pub fn resolve(layer: ConfigLayer) -> Result<Self> {
        let root = layer.root.ok_or_else(|| missing("root"))?;
        let remote = layer.remote;
        let interval_secs = layer.interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS);
        if interval_secs == 0 {
            return Err(Error::Config {
                message: "interval_secs must be greater than zero".into(),
            });
        }

        Ok(Self {
            root,
            interval_secs,
            backup_dir: layer.backup_dir,
            remote: ConnectionParams {
                server: remote.server.ok_or_else(|| missing("remote.server"))?,
                port: remote.port.unwrap_or(DEFAULT_PORT),
                user: remote.user.ok_or_else(|| missing("remote.user"))?,
                password: remote.password.unwrap_or_default(),
            },
        })
    }

    /// Write this configuration to `path` in the format its extension names.
    pub fn save(&self, path: &Path) -> Result<()> {
        ConfigStore::new().save(path, self)?;
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// The configured backup directory, or the per-user default.
    pub fn backup_destination(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.backup_dir {
            return Ok(dir.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("mirror").join("backups"))
            .ok_or_else(|| Error::Config {
                message: "no backup_dir configured and no local data directory available".into(),
            })
    }
}

fn missing(key: &str) -> Error {
    Error::Config {
        message: format!("missing required setting '{key}'"),
    }
}
