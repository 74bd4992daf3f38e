//! Shared test utilities for the remote-mirror workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`remote`]: [`MemoryRemoteStore`], an in-memory remote with the same
//!   cursor semantics as FTP, plus counters and fault injection
//! - [`tree`]: [`TestTree`] builder for local roots with controlled mtimes

pub mod remote;
pub mod tree;

pub use remote::{MemoryConnector, MemoryRemoteStore};
pub use tree::{TestTree, mod_time, now};
