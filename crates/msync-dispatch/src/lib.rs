//! msync-dispatch
//!
//! Batch planning and update dispatch.
//!
//! Architectural decisions:
//! - One command per (listing_id, sales_model) enters the planner, so plain
//!   chunking preserves per-item atomicity
//! - The update protocol is a synchronous `Send + Sync` trait; blocking
//!   adapters run under `spawn_blocking`
//! - Transport failures retry the whole batch with exponential backoff;
//!   per-item rejections never retry
//! - One exhausted batch never blocks the remaining batches
//! - A run deadline skips batches that have not been launched yet

pub mod api;
pub mod batch;
pub mod dispatcher;
pub mod retry;

pub use api::{ItemOutcome, TransportError, UpdateApi};
pub use batch::{plan, Batch, PlanError};
pub use dispatcher::{dispatch, DispatchLimits, UpdateOutcome, UpdateResult};
pub use retry::RetryPolicy;
