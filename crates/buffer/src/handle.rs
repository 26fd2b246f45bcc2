use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::error::BufferError;

pub type Outcome<O> = Result<O, BufferError>;

/// A queued item together with the endpoint its outcome is delivered on.
///
/// Result and error travel on the same one-shot channel, so an item can
/// never observe both.
pub struct SubmittedItem<I, O> {
    pub(crate) input: I,
    outcome_tx: Sender<Outcome<O>>,
}

/// Returned to the producer by `submit_no_wait`; waits for the item's outcome.
pub struct Handle<O> {
    outcome_rx: Receiver<Outcome<O>>,
}

impl<I, O> SubmittedItem<I, O> {
    pub fn new(input: I) -> (Self, Handle<O>) {
        // Capacity 1 so that delivery never blocks the flush worker, even if
        // the producer has not started waiting yet.
        let (outcome_tx, outcome_rx) = channel::bounded(1);

        (Self { input, outcome_tx }, Handle { outcome_rx })
    }

    /// Split into the payload and a resolver that can deliver exactly once.
    pub(crate) fn into_parts(self) -> (I, Resolver<O>) {
        (
            self.input,
            Resolver {
                outcome_tx: self.outcome_tx,
            },
        )
    }

    /// Deliver the outcome, consuming the item.
    pub fn resolve(self, outcome: Outcome<O>) {
        let (_, resolver) = self.into_parts();
        resolver.resolve(outcome);
    }
}

/// The delivery half of a submitted item once its payload has been handed
/// to the batch processor.
pub(crate) struct Resolver<O> {
    outcome_tx: Sender<Outcome<O>>,
}

impl<O> Resolver<O> {
    pub(crate) fn resolve(self, outcome: Outcome<O>) {
        // The producer may have dropped its handle; nobody is left to tell.
        let _ = self.outcome_tx.send(outcome);
    }
}

impl<O> Handle<O> {
    /// Block until the outcome is delivered.
    ///
    /// Items stranded in the queue of a buffer that has shut down stay
    /// unresolved for as long as that buffer lives; once it is dropped they
    /// resolve with [`BufferError::Abandoned`].
    pub fn wait(self) -> Outcome<O> {
        match self.outcome_rx.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(BufferError::Abandoned),
        }
    }

    /// Like [`Handle::wait`], but gives up after `timeout` and returns `None`.
    /// The handle stays usable after a timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome<O>> {
        match self.outcome_rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(BufferError::Abandoned)),
        }
    }

    /// Non-blocking check for a delivered outcome.
    pub fn try_wait(&self) -> Option<Outcome<O>> {
        self.wait_timeout(Duration::ZERO)
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
