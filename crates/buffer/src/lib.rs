//! A bounded-concurrency batching buffer.
//!
//! Producers submit items one at a time; the buffer groups them into batches
//! of at most `batch_size`, hands each batch to a [`BatchProcessor`] with at
//! most `concurrency_limit` calls in flight, and routes every item's result
//! or error back to the producer that submitted it.
//!
//! ```no_run
//! use flushq_buffer::{Buffer, BufferConfig};
//!
//! let buffer = Buffer::<u64, u64>::new(BufferConfig::default(), |rows: Vec<u64>| -> anyhow::Result<Vec<u64>> {
//!     Ok(rows.into_iter().map(|r| r * 2).collect())
//! })?;
//!
//! assert_eq!(buffer.submit(21)?, 42);
//! # Ok::<(), flushq_buffer::BufferError>(())
//! ```

mod buffer;
mod config;
mod error;
mod handle;
mod limiter;
mod processor;
mod scheduler;
mod worker;

pub use buffer::Buffer;
pub use config::{
    BufferConfig, DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY_LIMIT, DEFAULT_FLUSH_INTERVAL,
    DEFAULT_SUBMISSION_TIMEOUT,
};
pub use error::BufferError;
pub use handle::{Handle, Outcome, SubmittedItem};
pub use limiter::{ConcurrencyLimiter, Permit};
pub use processor::BatchProcessor;
