//! Periodic reconciliation on a background thread.
//!
//! The schedule runs on its own thread with a current-thread tokio
//! runtime. It holds only a weak reference to the engine, so dropping the
//! last engine handle also ends the schedule.

use std::fmt;
use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::sync::SyncEngine;
use crate::{Error, Result};

/// Lifecycle of a schedule, published over a watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// Started, first cycle not yet due
    Idle,
    /// At least one cycle has run
    Running { cycles: u64 },
    /// Stopped itself after losing the remote connection
    Halted { cycles: u64, reason: String },
    /// Stopped on request or because the engine went away
    Stopped { cycles: u64 },
}

impl SchedulerStatus {
    pub fn cycles(&self) -> u64 {
        match self {
            Self::Idle => 0,
            Self::Running { cycles }
            | Self::Halted { cycles, .. }
            | Self::Stopped { cycles } => *cycles,
        }
    }

    /// Whether no further cycles will run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Halted { .. } | Self::Stopped { .. })
    }
}

impl fmt::Display for SchedulerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running { cycles } => write!(f, "running ({cycles} cycles)"),
            Self::Halted { cycles, reason } => {
                write!(f, "halted after {cycles} cycles: {reason}")
            }
            Self::Stopped { cycles } => write!(f, "stopped after {cycles} cycles"),
        }
    }
}

/// Handle to a running schedule. Dropping it stops the schedule.
pub(crate) struct Scheduler {
    stop: watch::Sender<bool>,
    status: watch::Receiver<SchedulerStatus>,
    worker: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub(crate) fn spawn(engine: Weak<SyncEngine>, period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(Error::Scheduler {
                message: "interval must be greater than zero".into(),
            });
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let (status_tx, status_rx) = watch::channel(SchedulerStatus::Idle);

        let worker = thread::Builder::new()
            .name("mirror-sync".into())
            .spawn(move || runtime.block_on(run_schedule(engine, period, stop_rx, status_tx)))?;

        Ok(Self {
            stop: stop_tx,
            status: status_rx,
            worker: Some(worker),
        })
    }

    pub(crate) fn status(&self) -> SchedulerStatus {
        self.status.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SchedulerStatus> {
        self.status.clone()
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the schedule and wait for the worker to exit.
    pub(crate) fn stop(mut self) -> SchedulerStatus {
        self.shutdown();
        self.status()
    }

    fn shutdown(&mut self) {
        let _ = self.stop.send(true);
        let Some(worker) = self.worker.take() else {
            return;
        };
        // The last engine handle may be released by the worker itself
        if worker.thread().id() == thread::current().id() {
            return;
        }
        if worker.join().is_err() {
            error!("Sync worker panicked");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_schedule(
    engine: Weak<SyncEngine>,
    period: Duration,
    mut stop: watch::Receiver<bool>,
    status: watch::Sender<SchedulerStatus>,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycles = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = stop.changed() => break,
            _ = ticker.tick() => {}
        }
        if *stop.borrow() {
            break;
        }

        let Some(engine) = engine.upgrade() else {
            debug!("Engine dropped, ending schedule");
            break;
        };
        let outcome = engine.run_cycle();
        drop(engine);
        cycles += 1;

        match outcome {
            Ok(report) => debug!(cycle = cycles, quiet = report.is_quiet(), "Cycle complete"),
            Err(e) if e.is_connectivity() => {
                error!(cycle = cycles, error = %e, "Connection lost, halting sync");
                status.send_replace(SchedulerStatus::Halted {
                    cycles,
                    reason: e.to_string(),
                });
                return;
            }
            Err(e) => warn!(cycle = cycles, error = %e, "Cycle failed"),
        }
        status.send_replace(SchedulerStatus::Running { cycles });
    }

    info!(cycles, "Sync stopped");
    status.send_replace(SchedulerStatus::Stopped { cycles });
}
