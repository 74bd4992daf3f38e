//! Init command implementation

use std::path::Path;

use colored::Colorize;
use mirror_core::MirrorConfig;

use crate::cli::GlobalArgs;
use crate::error::{CliError, Result};

/// Write a starter config to `global.config`.
///
/// The root defaults to `cwd`. Connection flags are copied in, the
/// password is not.
pub fn run_init(cwd: &Path, global: &GlobalArgs, force: bool) -> Result<()> {
    let path = cwd.join(&global.config);
    if path.exists() && !force {
        return Err(CliError::user(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let root = global.root.clone().unwrap_or_else(|| cwd.to_path_buf());
    let mut config = MirrorConfig::starter(root);
    config.backup_dir = global.backup_dir.clone();
    if let Some(server) = &global.server {
        config.remote.server = server.clone();
    }
    if let Some(port) = global.port {
        config.remote.port = port;
    }
    if let Some(user) = &global.user {
        config.remote.user = user.clone();
    }

    config.save(&path)?;

    println!("{} Wrote {}", "✓".green().bold(), path.display());
    println!(
        "Set {} before running {}.",
        "MIRROR_PASSWORD".cyan(),
        "mirror run".cyan()
    );
    Ok(())
}
