//! Partial configuration layers and their merge

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Prefix shared by every environment variable the configuration reads.
pub const ENV_PREFIX: &str = "MIRROR_";

/// One source of configuration where every value is optional.
///
/// Layers are merged in order of increasing precedence; a value set in a
/// later layer replaces the earlier one, unset values fall through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,
    pub remote: RemoteLayer,
}

/// Optional connection settings.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for RemoteLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteLayer")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ConfigLayer {
    /// Overlay `other` on top of `self`.
    pub fn merge(&mut self, other: ConfigLayer) {
        overlay(&mut self.root, other.root);
        overlay(&mut self.interval_secs, other.interval_secs);
        overlay(&mut self.backup_dir, other.backup_dir);
        overlay(&mut self.remote.server, other.remote.server);
        overlay(&mut self.remote.port, other.remote.port);
        overlay(&mut self.remote.user, other.remote.user);
        overlay(&mut self.remote.password, other.remote.password);
    }

    /// Read `MIRROR_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Build a layer from `(name, value)` pairs, ignoring names without the
    /// `MIRROR_` prefix. Empty values count as unset.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut layer = Self::default();
        for (name, value) in vars {
            let Some(key) = name.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value: String = value.into();
            if value.is_empty() {
                continue;
            }
            match key {
                "ROOT" => layer.root = Some(PathBuf::from(value)),
                "INTERVAL_SECS" => layer.interval_secs = Some(parse_number(name.as_ref(), &value)?),
                "BACKUP_DIR" => layer.backup_dir = Some(PathBuf::from(value)),
                "SERVER" => layer.remote.server = Some(value),
                "PORT" => layer.remote.port = Some(parse_number(name.as_ref(), &value)?),
                "USER" => layer.remote.user = Some(value),
                "PASSWORD" => layer.remote.password = Some(value),
                _ => {}
            }
        }
        Ok(layer)
    }
}

fn overlay<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| Error::Config {
        message: format!("{name} must be a number, got '{value}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn later_layer_wins_where_set() {
        let mut base = ConfigLayer {
            interval_secs: Some(4),
            remote: RemoteLayer {
                server: Some("file.example".into()),
                user: Some("alice".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        base.merge(ConfigLayer {
            remote: RemoteLayer {
                server: Some("flag.example".into()),
                ..Default::default()
            },
            ..Default::default()
        });

        assert_eq!(base.interval_secs, Some(4));
        assert_eq!(base.remote.server.as_deref(), Some("flag.example"));
        assert_eq!(base.remote.user.as_deref(), Some("alice"));
    }

    #[test]
    fn env_vars_are_parsed() {
        let layer = ConfigLayer::from_vars([
            ("MIRROR_SERVER", "env.example"),
            ("MIRROR_PORT", "2121"),
            ("MIRROR_PASSWORD", "secret"),
            ("MIRROR_USER", ""),
            ("HOME", "/home/nobody"),
        ])
        .unwrap();

        assert_eq!(layer.remote.server.as_deref(), Some("env.example"));
        assert_eq!(layer.remote.port, Some(2121));
        assert_eq!(layer.remote.password.as_deref(), Some("secret"));
        assert_eq!(layer.remote.user, None);
        assert_eq!(layer.root, None);
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let err = ConfigLayer::from_vars([("MIRROR_PORT", "ftp")]).unwrap_err();
        assert!(err.to_string().contains("MIRROR_PORT"));
    }

    #[test]
    fn password_is_redacted_in_debug() {
        let layer = RemoteLayer {
            password: Some("hunter2".into()),
            ..Default::default()
        };
        assert!(!format!("{layer:?}").contains("hunter2"));
    }
}
