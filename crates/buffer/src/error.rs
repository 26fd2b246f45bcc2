use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Everything a submitter can observe going wrong with an item.
///
/// Errors are `Clone` because one batch-level failure fans out to every item
/// of that batch.
#[derive(Debug, Clone, Error)]
pub enum BufferError {
    /// The pending queue stayed full for the whole submission timeout.
    /// The item never entered the buffer.
    #[error("timed out after {0:?} waiting for space in the pending queue")]
    SubmissionTimeout(Duration),

    /// The batch processor failed. Every item of the batch holds the same
    /// underlying error.
    #[error("{0}")]
    Processor(Arc<anyhow::Error>),

    /// The batch processor returned a different number of outputs than it
    /// was given inputs.
    #[error("batch processor returned {actual} outputs for {expected} inputs")]
    CardinalityMismatch { expected: usize, actual: usize },

    /// The buffer was dropped while the item was still queued.
    #[error("buffer dropped before the item was flushed")]
    Abandoned,

    #[error("invalid buffer configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("failed to start flush scheduler: {0}")]
    Spawn(String),
}

impl BufferError {
    pub(crate) fn processor(err: anyhow::Error) -> Self {
        BufferError::Processor(Arc::new(err))
    }
}
