//! Remote Mirror CLI
//!
//! Mirrors a local directory onto an FTP server.

mod cli;
mod commands;
mod error;
mod logging;

use clap::{CommandFactory, Parser};
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let global = &cli.global;
    match cli.command {
        Commands::Init { force } => {
            let cwd = std::env::current_dir()?;
            commands::run_init(&cwd, global, force)
        }
        Commands::Run { interval } => commands::run_schedule(global, interval),
        Commands::Once { json } => commands::run_once(global, json),
        Commands::Upload {
            file,
            owner,
            lifetime_ms,
        } => commands::run_upload(global, &file, &owner, lifetime_ms),
        Commands::Delete { path, directory } => commands::run_delete(global, &path, directory),
        Commands::Status { json } => commands::run_status(global, json),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "mirror", &mut std::io::stdout());
            Ok(())
        }
    }
}
