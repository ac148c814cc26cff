//! Batch planning: bounded contiguous chunks, input order preserved.

use std::fmt;

use msync_reconcile::UpdateCommand;

/// An ordered group of commands submitted in one protocol call.
///
/// Commands arrive one-per-(listing_id, sales_model), so chunking can never
/// split a logical item across batches.
pub type Batch = Vec<UpdateCommand>;

/// Errors produced by batch planning.
#[derive(Debug, PartialEq, Eq)]
pub enum PlanError {
    /// `max_batch_size` must be at least 1.
    ZeroBatchSize,
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::ZeroBatchSize => write!(f, "max_batch_size must be >= 1"),
        }
    }
}

impl std::error::Error for PlanError {}

/// Split the ordered command stream into chunks of at most `max_batch_size`.
///
/// No reordering: the concatenation of the returned batches equals the
/// input exactly, which keeps batch boundaries reproducible for audits.
pub fn plan(commands: Vec<UpdateCommand>, max_batch_size: usize) -> Result<Vec<Batch>, PlanError> {
    if max_batch_size == 0 {
        return Err(PlanError::ZeroBatchSize);
    }
    let mut batches = Vec::with_capacity(commands.len().div_ceil(max_batch_size));
    let mut current = Vec::with_capacity(max_batch_size.min(commands.len()));
    for cmd in commands {
        current.push(cmd);
        if current.len() == max_batch_size {
            batches.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }
    Ok(batches)
}
