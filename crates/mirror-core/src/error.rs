//! Error types for mirror-core

use std::path::PathBuf;

use crate::remote::EntryKind;

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by a [`RemoteFileStore`](crate::RemoteFileStore).
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The transport is gone; nothing further can succeed on this session
    #[error("connection failure during {operation}: {message}")]
    Connection {
        operation: &'static str,
        message: String,
    },

    /// The remote store answered but refused the request
    #[error("{operation} rejected: {message}")]
    Protocol {
        operation: &'static str,
        message: String,
    },

    /// Reading the local side of a transfer failed
    #[error("local read failed during {operation}: {source}")]
    LocalRead {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl RemoteError {
    pub fn connection(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Connection {
            operation,
            message: message.into(),
        }
    }

    pub fn protocol(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Protocol {
            operation,
            message: message.into(),
        }
    }

    /// Whether the session is unusable after this error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Errors that can occur in mirror-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Sync root missing or not a directory
    #[error("Invalid directory {path}, could not sync")]
    InvalidRoot { path: PathBuf },

    /// Connection to the remote store could not be established
    #[error("Unable to establish connection to {server}:{port}: {source}")]
    Connect {
        server: String,
        port: u16,
        #[source]
        source: RemoteError,
    },

    /// Remote store refused the credentials
    #[error("Remote login failed for user {user}")]
    Authenticate { user: String },

    /// A missing intermediate remote directory could not be created
    #[error("Unable to create remote directory '{segment}' for {path}: {reason}")]
    DirectoryCreation {
        segment: String,
        path: String,
        reason: String,
    },

    /// The remote cursor could not be moved
    #[error("Unable to change into remote directory {path}")]
    Navigation { path: String },

    /// A single-path listing matched more than one entry
    #[error("Remote listing of {path} returned {count} entries, expected exactly one")]
    AmbiguousListing { path: String, count: usize },

    /// Remote delete was refused
    #[error("Unable to delete remote {kind} {path}")]
    RemoteDelete { path: String, kind: EntryKind },

    /// The liveness probe was answered negatively
    #[error("Connection lost: remote store rejected the liveness probe")]
    ConnectionLost,

    /// Upload target is not a regular file
    #[error("Not a regular file: {path}")]
    NotAFile { path: PathBuf },

    /// Safety copy before upload failed
    #[error("Unable to back up {path} into {destination}: {source}")]
    Backup {
        path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `start_sync` called while a schedule is active
    #[error("Sync is already scheduled for this engine")]
    SchedulerRunning,

    /// Scheduler could not be started
    #[error("Scheduler error: {message}")]
    Scheduler { message: String },

    /// Incomplete or inconsistent configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A thread panicked while holding the engine state
    #[error("Engine state lock poisoned")]
    LockPoisoned,

    /// Error from the remote store
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Filesystem error from mirror-fs
    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the remote session is gone.
    ///
    /// A running schedule halts on these; everything else is logged and the
    /// cycle moves on.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::ConnectionLost => true,
            Self::Remote(remote) => remote.is_connection(),
            _ => false,
        }
    }
}
