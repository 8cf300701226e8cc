//! Error types for result queue operations.

use std::time::Duration;
use thiserror::Error;

/// Errors observed by the consumer side of a [`ResultQueue`](crate::ResultQueue).
///
/// End-of-stream is not an error: it is reported as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError<E> {
    /// `next()` was called while an earlier handle was still unresolved.
    #[error("a next() call is already outstanding on this queue")]
    WaiterOutstanding,

    /// The producer reported a failure.
    #[error("upstream error: {0}")]
    Upstream(E),

    /// The blocking wait gave up before anything arrived.
    #[error("timed out after {0:?} waiting for the next result")]
    Timeout(Duration),
}

impl<E> QueueError<E> {
    /// Returns `true` for a programming error on the consumer side.
    #[inline]
    pub fn is_usage_fault(&self) -> bool {
        matches!(self, Self::WaiterOutstanding)
    }

    /// Returns `true` if the blocking wait timed out. The queue is unaffected.
    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Borrows the upstream error, if this is one.
    pub fn upstream(&self) -> Option<&E> {
        match self {
            Self::Upstream(err) => Some(err),
            _ => None,
        }
    }

    /// Consumes `self`, returning the upstream error if this is one.
    pub fn into_upstream(self) -> Option<E> {
        match self {
            Self::Upstream(err) => Some(err),
            _ => None,
        }
    }
}
