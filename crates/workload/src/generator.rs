use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam::channel::{self, Receiver, SendTimeoutError, Sender};
use log::debug;
use uuid::Uuid;

use crate::payload::generate_json_payload;

/// Parameters for one row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskParams {
    pub args: Vec<u8>,
    pub idempotency_key: String,
}

impl TaskParams {
    pub fn generate(max_payload_size: usize) -> Self {
        Self {
            args: generate_json_payload(max_payload_size),
            idempotency_key: Uuid::new_v4().to_string(),
        }
    }
}

/// How often a generator blocked on a full channel re-checks the stop flag.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Emits freshly generated [`TaskParams`] on a bounded channel until stopped.
pub struct DataGenerator {
    tasks_tx: Option<Sender<TaskParams>>,
    tasks_rx: Receiver<TaskParams>,
}

impl DataGenerator {
    pub fn new(buffer_size: usize) -> Self {
        let (tasks_tx, tasks_rx) = channel::bounded(buffer_size);
        Self {
            tasks_tx: Some(tasks_tx),
            tasks_rx,
        }
    }

    /// Start producing on a background thread.
    ///
    /// The channel is closed once `stop` is set, so consumers see the end of
    /// the stream as a disconnected receiver. Can only be started once;
    /// later calls return an error.
    pub fn start(
        &mut self,
        stop: Arc<AtomicBool>,
        max_payload_size: usize,
    ) -> io::Result<JoinHandle<u64>> {
        let tx = self
            .tasks_tx
            .take()
            .ok_or_else(|| io::Error::other("data generator already started"))?;

        thread::Builder::new()
            .name("flushq-generator".into())
            .spawn(move || produce(tx, &stop, max_payload_size))
    }

    pub fn tasks(&self) -> Receiver<TaskParams> {
        self.tasks_rx.clone()
    }
}

fn produce(tx: Sender<TaskParams>, stop: &AtomicBool, max_payload_size: usize) -> u64 {
    let mut produced = 0u64;

    'outer: while !stop.load(Ordering::Relaxed) {
        let mut task = TaskParams::generate(max_payload_size);

        loop {
            match tx.send_timeout(task, STOP_POLL_INTERVAL) {
                Ok(()) => break,
                Err(SendTimeoutError::Timeout(t)) => {
                    if stop.load(Ordering::Relaxed) {
                        break 'outer;
                    }
                    task = t;
                }
                Err(SendTimeoutError::Disconnected(_)) => break 'outer,
            }
        }

        produced += 1;
    }

    debug!("[generator] stopped after {produced} tasks");
    produced
}

#[cfg(test)]
#[path = "generator_tests.rs"]
mod tests;
