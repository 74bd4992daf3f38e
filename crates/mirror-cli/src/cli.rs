//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use mirror_core::config::{ConfigLayer, RemoteLayer};

/// Remote Mirror - Keep a remote file store in step with a local directory
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that override the config file
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (TOML, JSON or YAML)
    #[arg(short, long, global = true, default_value = "mirror.toml")]
    pub config: PathBuf,

    /// Local directory to mirror
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Remote server host
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Remote server port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Remote user
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Remote password
    #[arg(long, global = true, env = "MIRROR_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Directory that receives a copy of every file before upload
    #[arg(long, global = true)]
    pub backup_dir: Option<PathBuf>,
}

impl GlobalArgs {
    /// The flags as the highest-precedence config layer.
    pub fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            root: self.root.clone(),
            interval_secs: None,
            backup_dir: self.backup_dir.clone(),
            remote: RemoteLayer {
                server: self.server.clone(),
                port: self.port,
                user: self.user.clone(),
                password: self.password.clone(),
            },
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write a starter config file
    ///
    /// Flags given alongside (--root, --server, ...) are written into it.
    /// The password is never written; supply it through MIRROR_PASSWORD.
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Sync on a schedule until interrupted or the connection is lost
    Run {
        /// Seconds between cycles
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Run a single sync cycle now
    Once {
        /// Output the cycle report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upload one file
    Upload {
        /// File below the synced root
        file: PathBuf,

        /// Owner tag; files owned by "user" survive orphan cleanup
        #[arg(long, default_value = mirror_core::USER_OWNER)]
        owner: String,

        /// Milliseconds until the remote copy expires (0 = never)
        #[arg(long, default_value_t = 0)]
        lifetime_ms: u64,
    },

    /// Delete a path from both the remote store and the local tree
    Delete {
        /// Remote path, e.g. /photos/a.jpg
        path: String,

        /// The path names a directory
        #[arg(long)]
        directory: bool,
    },

    /// Show tracked ownership and expiry entries
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
