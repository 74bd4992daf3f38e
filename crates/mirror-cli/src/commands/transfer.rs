//! Upload and delete command implementations

use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use mirror_core::EntryKind;
use mirror_core::config::ConfigLayer;

use super::{connect, load_config};
use crate::cli::GlobalArgs;
use crate::error::Result;

/// Upload `file` with an owner and optional lifetime.
pub fn run_upload(global: &GlobalArgs, file: &Path, owner: &str, lifetime_ms: u64) -> Result<()> {
    let config = load_config(global, ConfigLayer::default())?;
    let engine = connect(&config)?;

    let remote = engine.upload(file, owner, Duration::from_millis(lifetime_ms))?;

    println!("{} {} → {}", "↑".green().bold(), file.display(), remote.cyan());
    Ok(())
}

/// Delete `path` on both sides.
pub fn run_delete(global: &GlobalArgs, path: &str, directory: bool) -> Result<()> {
    let config = load_config(global, ConfigLayer::default())?;
    let engine = connect(&config)?;
    let kind = if directory {
        EntryKind::Directory
    } else {
        EntryKind::File
    };

    engine.delete(path, kind)?;

    println!("{} Deleted {} {}", "✗".red().bold(), kind, path.cyan());
    Ok(())
}
