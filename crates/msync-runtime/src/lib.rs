//! msync-runtime
//!
//! Run orchestration: fetch truth, resolve identities, reconcile, plan,
//! dispatch, report. Fatal fetch errors abort before any update is
//! attempted; everything else accumulates into the run report.

mod pipeline;
mod report;

pub use pipeline::{gather_and_plan, run_sync, PlannedRun};
pub use report::{RunCounters, RunReport};
