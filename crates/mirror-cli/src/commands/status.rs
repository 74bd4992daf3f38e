//! Status command implementation

use std::path::PathBuf;

use colored::Colorize;
use mirror_core::{MetadataStore, MirrorConfig};
use serde::Serialize;

use crate::cli::GlobalArgs;
use crate::error::{CliError, Result};

/// One tracked remote path.
#[derive(Debug, Serialize)]
struct TrackedEntry<'a> {
    path: &'a str,
    owner: Option<&'a str>,
    expires_at_ms: Option<i64>,
}

/// Print the metadata persisted at the synced root. Needs no connection.
pub fn run_status(global: &GlobalArgs, json: bool) -> Result<()> {
    let root = resolve_root(global)?;
    let metadata = MetadataStore::load(&root)?;
    let entries: Vec<TrackedEntry<'_>> = metadata
        .tracked_paths()
        .into_iter()
        .map(|path| TrackedEntry {
            path,
            owner: metadata.owner(path),
            expires_at_ms: metadata.expiry(path),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", "Mirror Status".bold());
    println!();
    println!("{}:   {}", "Root".dimmed(), root.display());
    println!("{}:  {}", "Owners".dimmed(), metadata.owners_path().display());
    println!();

    if entries.is_empty() {
        println!("  {}", "No tracked entries".dimmed());
        return Ok(());
    }
    for entry in &entries {
        let owner = entry.owner.unwrap_or("-");
        let owner = if owner == mirror_core::USER_OWNER {
            owner.green()
        } else {
            owner.yellow()
        };
        match entry.expires_at_ms {
            Some(expiry) => println!("  {} {} (expires at {} ms)", entry.path.cyan(), owner, expiry),
            None => println!("  {} {}", entry.path.cyan(), owner),
        }
    }
    Ok(())
}

/// The root from flags, environment or config file; other settings are
/// not needed here.
fn resolve_root(global: &GlobalArgs) -> Result<PathBuf> {
    MirrorConfig::load_layer(&global.config, global.overrides())?
        .root
        .ok_or_else(|| CliError::user("no root configured (pass --root or run mirror init)"))
}
