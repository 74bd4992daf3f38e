//! Command implementations for mirror-cli

pub mod init;
pub mod status;
pub mod sync;
pub mod transfer;

pub use init::run_init;
pub use status::run_status;
pub use sync::{run_once, run_schedule};
pub use transfer::{run_delete, run_upload};

use mirror_core::config::ConfigLayer;
use mirror_core::{MirrorConfig, SyncEngine};
use mirror_ftp::FtpConnector;

use crate::cli::GlobalArgs;
use crate::error::Result;

/// Resolve the full configuration from file, environment and flags.
pub fn load_config(global: &GlobalArgs, extra: ConfigLayer) -> Result<MirrorConfig> {
    let mut overrides = global.overrides();
    overrides.merge(extra);
    Ok(MirrorConfig::load(&global.config, overrides)?)
}

/// Connect an engine over FTP.
pub fn connect(config: &MirrorConfig) -> Result<SyncEngine> {
    Ok(SyncEngine::from_config(config, &FtpConnector)?)
}
