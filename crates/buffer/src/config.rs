use std::time::Duration;

use crate::error::BufferError;

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(10);
pub const DEFAULT_SUBMISSION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Maximum number of items handed to one processor call.
    pub batch_size: usize,
    /// Maximum number of processor calls in flight at once.
    pub concurrency_limit: usize,
    /// Period of the flush ticker, and the minimum time a slot stays
    /// occupied after a non-empty flush started.
    pub flush_interval: Duration,
    /// How long `submit_no_wait` waits for queue space.
    pub submission_timeout: Duration,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            submission_timeout: DEFAULT_SUBMISSION_TIMEOUT,
        }
    }
}

impl BufferConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_concurrency_limit(mut self, concurrency_limit: usize) -> Self {
        self.concurrency_limit = concurrency_limit;
        self
    }

    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    pub fn with_submission_timeout(mut self, submission_timeout: Duration) -> Self {
        self.submission_timeout = submission_timeout;
        self
    }

    /// Capacity of the pending queue: one full batch per concurrency slot.
    pub fn queue_capacity(&self) -> usize {
        self.batch_size.saturating_mul(self.concurrency_limit)
    }

    pub fn validate(&self) -> Result<(), BufferError> {
        if self.batch_size == 0 {
            return Err(BufferError::InvalidConfig("batch_size must be at least 1"));
        }
        if self.concurrency_limit == 0 {
            return Err(BufferError::InvalidConfig(
                "concurrency_limit must be at least 1",
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(BufferError::InvalidConfig(
                "flush_interval must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
