//! Sync command implementations

use std::sync::Arc;

use colored::Colorize;
use mirror_core::config::ConfigLayer;
use mirror_core::{CycleReport, SchedulerStatus};
use tracing::info;

use super::{connect, load_config};
use crate::cli::GlobalArgs;
use crate::error::{CliError, Result};

/// Run one cycle and print what changed.
pub fn run_once(global: &GlobalArgs, json: bool) -> Result<()> {
    let config = load_config(global, ConfigLayer::default())?;
    let engine = connect(&config)?;
    let report = engine.run_cycle()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Sync on a schedule until Ctrl-C or a halt.
pub fn run_schedule(global: &GlobalArgs, interval: Option<u64>) -> Result<()> {
    let config = load_config(
        global,
        ConfigLayer {
            interval_secs: interval,
            ..Default::default()
        },
    )?;
    let engine = Arc::new(connect(&config)?);
    let mut status = engine.start_sync(config.interval())?;

    println!(
        "{} Mirroring {} every {}s (Ctrl-C to stop)",
        "→".cyan().bold(),
        config.root.display(),
        config.interval_secs
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let interrupted = runtime.block_on(async {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => signal.map(|()| true),
            _ = status.wait_for(SchedulerStatus::is_terminal) => Ok(false),
        }
    })?;
    if interrupted {
        info!("Interrupted, stopping");
    }

    let last = engine.stop_sync()?.unwrap_or_else(|| status.borrow().clone());
    match last {
        SchedulerStatus::Halted { .. } => Err(CliError::user(format!("sync {last}"))),
        _ => {
            println!("{} Sync {}", "✓".green().bold(), last);
            Ok(())
        }
    }
}

fn print_report(report: &CycleReport) {
    for path in &report.uploaded {
        println!("  {} {}", "↑".green(), path);
    }
    for path in report.deleted.iter().chain(&report.removed_dirs) {
        println!("  {} {}", "✗".red(), path);
    }
    for error in &report.errors {
        println!("  {} {}", "!".yellow().bold(), error);
    }
    println!("{}", report.summary());
}
