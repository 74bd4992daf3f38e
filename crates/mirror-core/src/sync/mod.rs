//! Local-to-remote reconciliation.

mod cleanup;
mod engine;
mod report;
mod session;
mod snapshot;

pub use cleanup::Disposition;
pub use engine::SyncEngine;
pub use report::CycleReport;
pub use snapshot::{LocalEntry, LocalTreeSnapshot};
