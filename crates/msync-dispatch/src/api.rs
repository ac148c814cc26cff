//! Update protocol boundary.
//!
//! This module defines **only** the trait and its outcome/error types.
//! Concrete implementations live in the marketplace adapter crates and in
//! the testkit.

use std::fmt;

use crate::batch::Batch;

/// Per-command result reported by the marketplace for one batch call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemOutcome {
    Applied,
    /// Marketplace-side rejection (validation error, unknown listing, ...).
    /// Never retried: resubmitting an invalid command cannot succeed.
    Rejected { detail: String },
}

/// Batch-level failure: the call itself did not produce per-item results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// The request timed out.
    Timeout,
    /// Connection-level failure (DNS, refused, reset, TLS).
    Connect(String),
    /// The marketplace signalled rate limiting.
    RateLimited,
    /// Whole-call HTTP status with no per-item body.
    Status(u16),
}

impl TransportError {
    /// Transient failures are eligible for whole-batch retry with backoff.
    /// Client errors other than 408/429 are not: the request is wrong, not
    /// the moment.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout => true,
            TransportError::Connect(_) => true,
            TransportError::RateLimited => true,
            TransportError::Status(code) => *code >= 500 || *code == 408 || *code == 429,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout => write!(f, "request timed out"),
            TransportError::Connect(msg) => write!(f, "connection failed: {msg}"),
            TransportError::RateLimited => write!(f, "rate limited"),
            TransportError::Status(code) => write!(f, "http status {code}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Marketplace batched-update protocol.
///
/// Synchronous by design, mirroring the blocking HTTP adapters that
/// implement it; the dispatcher runs calls under `spawn_blocking`. The
/// session behind an implementation is stateless per call, so one instance
/// is shared read-only across concurrent dispatch workers.
///
/// `submit` must return exactly one [`ItemOutcome`] per command, in command
/// order.
pub trait UpdateApi: Send + Sync {
    /// Human-readable name identifying this protocol (e.g. `"ozon"`).
    fn name(&self) -> &'static str;

    fn submit(&self, batch: &Batch) -> Result<Vec<ItemOutcome>, TransportError>;
}
