//! Filesystem layer for Remote Mirror
//!
//! Provides local/remote path translation, safe I/O operations and
//! format-agnostic configuration loading.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod mapper;

pub use config::{ConfigFormat, ConfigStore};
pub use constants::MirrorFile;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use mapper::{PathMapper, child_path, parent_segments};
