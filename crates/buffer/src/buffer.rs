use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
};

use crossbeam::channel::{self, SendTimeoutError, Sender, TrySendError};
use log::{debug, error, trace};

use crate::{
    config::BufferConfig,
    error::BufferError,
    handle::{Handle, SubmittedItem},
    processor::BatchProcessor,
    scheduler::{self, FlushContext},
};

/// Coalesces individually submitted items into batches and flushes them
/// through a [`BatchProcessor`] with bounded concurrency.
///
/// Items are flushed when a submission wakes the scheduler, and on every
/// `flush_interval` tick otherwise. Each flush takes only what is already
/// queued, up to `batch_size` items, and at most `concurrency_limit` flushes
/// run at once.
///
/// The buffer shuts down on [`Buffer::shutdown`] or when dropped. Shutdown
/// attempts one final flush; items that flush cannot take stay unresolved.
pub struct Buffer<I, O> {
    ctx: Arc<FlushContext<I, O>>,
    queue_tx: Sender<SubmittedItem<I, O>>,
    notify_tx: Sender<()>,
    shutdown_tx: Sender<()>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
    shut_down: AtomicBool,
}

impl<I, O> Buffer<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new<P>(config: BufferConfig, processor: P) -> Result<Self, BufferError>
    where
        P: BatchProcessor<I, O> + 'static,
    {
        config.validate()?;

        let (queue_tx, queue_rx) = channel::bounded(config.queue_capacity());
        // A single slot: any number of pending wake-ups collapse into one.
        let (notify_tx, notify_rx) = channel::bounded(1);
        let (shutdown_tx, shutdown_rx) = channel::bounded(1);

        let ctx = Arc::new(FlushContext::new(config, queue_rx, Box::new(processor)));

        let scheduler = scheduler::spawn(Arc::clone(&ctx), notify_rx, shutdown_rx)
            .map_err(|e| BufferError::Spawn(e.to_string()))?;

        Ok(Self {
            ctx,
            queue_tx,
            notify_tx,
            shutdown_tx,
            scheduler: Mutex::new(Some(scheduler)),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Queue `input` and return a handle to its eventual outcome.
    ///
    /// Waits up to `submission_timeout` for queue space; on expiry the item
    /// is not queued and [`BufferError::SubmissionTimeout`] is returned.
    pub fn submit_no_wait(&self, input: I) -> Result<Handle<O>, BufferError> {
        let timeout = self.ctx.config.submission_timeout;
        let (item, handle) = SubmittedItem::new(input);

        match self.queue_tx.send_timeout(item, timeout) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => {
                debug!("[submit] pending queue full for {timeout:?}; rejecting item");
                return Err(BufferError::SubmissionTimeout(timeout));
            }
            // The context owns the receiver for as long as `self` exists.
            Err(SendTimeoutError::Disconnected(_)) => return Err(BufferError::Abandoned),
        }

        if self.is_shut_down() {
            debug!("[submit] item queued after shutdown; it will not be flushed");
        }

        match self.notify_tx.try_send(()) {
            Ok(()) => {}
            Err(TrySendError::Full(())) => trace!("[submit] wake-up already pending"),
            Err(TrySendError::Disconnected(())) => {}
        }

        Ok(handle)
    }

    /// Queue `input` and block until its outcome is delivered.
    pub fn submit(&self, input: I) -> Result<O, BufferError> {
        self.submit_no_wait(input)?.wait()
    }
}

impl<I, O> Buffer<I, O> {
    /// Stop scheduling flushes.
    ///
    /// Runs one final flush attempt and returns once that flush has been
    /// processed. Flushes already in progress run to completion. Calling this
    /// more than once is harmless; concurrent callers all return only after
    /// the final flush.
    pub fn shutdown(&self) {
        // Held across the join so that a concurrent caller waits too.
        let mut scheduler = self
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(handle) = scheduler.take() else {
            return;
        };

        self.shut_down.store(true, Ordering::Release);
        // Capacity 1 and a single sender that only ever sends once.
        let _ = self.shutdown_tx.try_send(());

        if handle.join().is_err() {
            error!("[shutdown] flush scheduler panicked");
        }

        debug!(
            "[shutdown] complete; {} items left in the pending queue",
            self.pending()
        );
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &BufferConfig {
        &self.ctx.config
    }

    /// Number of items currently waiting in the pending queue.
    pub fn pending(&self) -> usize {
        self.queue_tx.len()
    }

    /// Number of concurrency slots currently held by flush workers,
    /// including slots held through their throttle window.
    pub fn active_slots(&self) -> usize {
        self.ctx.limiter.in_use()
    }
}

impl<I, O> Drop for Buffer<I, O> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
