//! Update dispatcher: drives planned batches through the update protocol.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use msync_reconcile::UpdateCommand;

use crate::api::{ItemOutcome, TransportError, UpdateApi};
use crate::batch::Batch;
use crate::retry::RetryPolicy;

/// Final outcome of one command after dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateOutcome {
    Applied,
    /// Marketplace rejected the command; not retried.
    Rejected { detail: String },
    /// Transient batch failures persisted through every permitted attempt.
    RetriedExhausted { detail: String },
    /// The run deadline passed before this command's batch was launched.
    SkippedDeadline,
}

/// One command paired with its final outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub command: UpdateCommand,
    pub outcome: UpdateOutcome,
}

/// Concurrency and cancellation bounds for one dispatch pass.
#[derive(Clone, Copy, Debug)]
pub struct DispatchLimits {
    /// Batches in flight at once. Bounded by marketplace rate limits;
    /// values below 1 behave as 1.
    pub max_concurrent_batches: usize,
    /// Run deadline measured from dispatch start. Batches not yet launched
    /// when it passes are skipped; in-flight batches finish on their own.
    pub deadline: Option<Duration>,
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self {
            max_concurrent_batches: 2,
            deadline: None,
        }
    }
}

/// Submit every batch, retrying transient failures per `policy`.
///
/// Results are re-assembled in batch order, so the flattened output pairs
/// one-to-one with the planner's input commands regardless of completion
/// order under concurrency. One failed batch never blocks the others.
pub async fn dispatch(
    batches: Vec<Batch>,
    api: Arc<dyn UpdateApi>,
    policy: RetryPolicy,
    limits: DispatchLimits,
) -> Vec<UpdateResult> {
    if batches.is_empty() {
        return Vec::new();
    }
    let deadline = limits.deadline.map(|d| Instant::now() + d);
    let concurrency = limits.max_concurrent_batches.max(1);
    let total = batches.len();

    let mut indexed: Vec<(usize, Vec<UpdateResult>)> =
        stream::iter(batches.into_iter().enumerate())
            .map(|(idx, batch)| {
                let api = Arc::clone(&api);
                async move {
                    if let Some(d) = deadline {
                        if Instant::now() >= d {
                            warn!(
                                api = api.name(),
                                batch = idx + 1,
                                total,
                                "run deadline passed; batch skipped"
                            );
                            let results = batch
                                .into_iter()
                                .map(|command| UpdateResult {
                                    command,
                                    outcome: UpdateOutcome::SkippedDeadline,
                                })
                                .collect();
                            return (idx, results);
                        }
                    }
                    debug!(api = api.name(), batch = idx + 1, total, "submitting batch");
                    (idx, submit_with_retry(api, batch, policy).await)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

    indexed.sort_by_key(|(idx, _)| *idx);
    indexed.into_iter().flat_map(|(_, r)| r).collect()
}

async fn submit_with_retry(
    api: Arc<dyn UpdateApi>,
    batch: Batch,
    policy: RetryPolicy,
) -> Vec<UpdateResult> {
    let mut attempt = 1u32;
    loop {
        let call_api = Arc::clone(&api);
        let call_batch = batch.clone();
        let submitted =
            tokio::task::spawn_blocking(move || call_api.submit(&call_batch)).await;

        let err = match submitted {
            Ok(Ok(outcomes)) => return merge_outcomes(batch, outcomes),
            Ok(Err(e)) => e,
            Err(join) => TransportError::Connect(format!("submit task failed: {join}")),
        };

        if err.is_retryable() && !policy.is_exhausted(attempt) {
            let delay = policy.delay_after(attempt);
            warn!(
                api = api.name(),
                attempt,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "transient batch failure; retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
            continue;
        }

        let detail = err.to_string();
        let exhausted = err.is_retryable();
        return batch
            .into_iter()
            .map(|command| UpdateResult {
                command,
                outcome: if exhausted {
                    UpdateOutcome::RetriedExhausted {
                        detail: detail.clone(),
                    }
                } else {
                    UpdateOutcome::Rejected {
                        detail: detail.clone(),
                    }
                },
            })
            .collect();
    }
}

/// Pair each command with its per-item outcome, in command order.
///
/// A response with the wrong cardinality cannot be attributed safely, so
/// the whole batch is recorded as rejected.
fn merge_outcomes(batch: Batch, outcomes: Vec<ItemOutcome>) -> Vec<UpdateResult> {
    if outcomes.len() != batch.len() {
        let detail = format!(
            "protocol violation: {} outcomes for {} commands",
            outcomes.len(),
            batch.len()
        );
        return batch
            .into_iter()
            .map(|command| UpdateResult {
                command,
                outcome: UpdateOutcome::Rejected {
                    detail: detail.clone(),
                },
            })
            .collect();
    }
    batch
        .into_iter()
        .zip(outcomes)
        .map(|(command, item)| UpdateResult {
            command,
            outcome: match item {
                ItemOutcome::Applied => UpdateOutcome::Applied,
                ItemOutcome::Rejected { detail } => UpdateOutcome::Rejected { detail },
            },
        })
        .collect()
}
