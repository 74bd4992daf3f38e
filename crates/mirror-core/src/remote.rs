//! The remote file store capability consumed by the engine.
//!
//! The contract mirrors a stateful, cursor-based protocol: there is one
//! working directory per session, `change_directory` moves it, and bare
//! names passed to `make_directory` or `list(None)` resolve against it.
//! Absolute paths (leading `/`) are resolved from the remote root.

use std::fmt;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::RemoteError;
use crate::timestamp::ModTime;

/// Result type for remote store operations
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Whether an entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// One child returned by listing a remote directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// `.` and `..` pseudo entries some servers include in listings.
    pub fn is_navigation(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}

/// Where and as whom to connect.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
}

fn default_port() -> u16 {
    21
}

impl ConnectionParams {
    pub fn new(
        server: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            port,
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opens sessions against a remote store.
pub trait RemoteConnector {
    /// Open a transport to `server:port`. Authentication happens separately
    /// through [`RemoteFileStore::login`].
    fn connect(&self, server: &str, port: u16) -> RemoteResult<Box<dyn RemoteFileStore>>;
}

/// A cursor-based remote filesystem session.
///
/// Boolean results report whether the server accepted the request; `Err` is
/// reserved for failures where the reply could not be obtained at all or
/// was malformed.
pub trait RemoteFileStore: Send {
    /// Authenticate the session. `Ok(false)` means the credentials were refused.
    fn login(&mut self, user: &str, password: &str) -> RemoteResult<bool>;

    /// Switch transfers to binary (image) mode.
    fn set_binary_mode(&mut self) -> RemoteResult<()>;

    /// Move the working directory. `Ok(false)` if it does not exist.
    fn change_directory(&mut self, path: &str) -> RemoteResult<bool>;

    /// List `path`, or the working directory when `None`. Listing a file path
    /// yields that single file.
    fn list(&mut self, path: Option<&str>) -> RemoteResult<Vec<RemoteEntry>>;

    /// Store `data` at `path`, replacing any existing file.
    fn store(&mut self, path: &str, data: &mut dyn Read) -> RemoteResult<()>;

    /// Delete a file.
    fn delete(&mut self, path: &str) -> RemoteResult<bool>;

    /// Create a directory.
    fn make_directory(&mut self, path: &str) -> RemoteResult<bool>;

    /// Remove an empty directory.
    fn remove_directory(&mut self, path: &str) -> RemoteResult<bool>;

    fn modification_time(&mut self, path: &str) -> RemoteResult<ModTime>;

    fn set_modification_time(&mut self, path: &str, time: ModTime) -> RemoteResult<()>;

    /// No-op liveness probe. `Ok(false)` if the server answered negatively.
    fn noop(&mut self) -> RemoteResult<bool>;

    /// Politely end the session.
    fn quit(&mut self) -> RemoteResult<()> {
        Ok(())
    }
}
