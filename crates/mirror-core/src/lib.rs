//! Reconciliation engine for Remote Mirror
//!
//! Keeps a remote file store in step with a local directory tree:
//!
//! - **Upload**: new or locally newer files are copied up, after a safety
//!   backup, with their modification time carried over
//! - **Cleanup**: remote entries that expired or no longer exist locally
//!   are removed, unless owned by the user
//! - **Metadata**: per-path owner and expiry, persisted at the synced root
//! - **Scheduling**: periodic cycles on a background thread that halt when
//!   the connection is lost
//!
//! # Architecture
//!
//! ```text
//!                mirror-cli
//!                    |
//!               mirror-core  <---  mirror-ftp (RemoteFileStore impl)
//!                    |
//!                mirror-fs
//! ```
//!
//! The remote side is reached only through [`RemoteFileStore`], so the
//! engine runs unchanged against FTP or an in-memory store.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mirror_core::{MirrorConfig, SyncEngine, config::ConfigLayer};
//!
//! let config = MirrorConfig::load("mirror.toml".as_ref(), ConfigLayer::default())?;
//! let engine = Arc::new(SyncEngine::from_config(&config, &connector)?);
//! let report = engine.run_cycle()?;
//! println!("{}", report.summary());
//! ```

pub mod backup;
pub mod config;
pub mod error;
pub mod metadata;
pub mod remote;
pub mod scheduler;
pub mod sync;
pub mod timestamp;

pub use backup::{BackupArchiver, DirectoryArchiver};
pub use config::{ConfigLayer, MirrorConfig};
pub use error::{Error, RemoteError, Result};
pub use metadata::{MetadataStore, USER_OWNER};
pub use remote::{
    ConnectionParams, EntryKind, RemoteConnector, RemoteEntry, RemoteFileStore, RemoteResult,
};
pub use scheduler::SchedulerStatus;
pub use sync::{CycleReport, Disposition, LocalEntry, LocalTreeSnapshot, SyncEngine};
pub use timestamp::{ModTime, ParseModTimeError};
