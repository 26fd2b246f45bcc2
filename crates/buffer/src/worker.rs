use std::panic::{self, AssertUnwindSafe};

use crossbeam::channel::Receiver;
use log::{debug, warn};

use crate::{
    error::BufferError,
    handle::{Resolver, SubmittedItem},
    processor::BatchProcessor,
};

/// Take whatever is immediately available from the queue, up to `max` items.
/// Never waits for more items to arrive.
pub(crate) fn drain<I, O>(
    queue: &Receiver<SubmittedItem<I, O>>,
    max: usize,
) -> Vec<SubmittedItem<I, O>> {
    let mut items = Vec::with_capacity(max.min(queue.len()));

    while items.len() < max {
        match queue.try_recv() {
            Ok(item) => items.push(item),
            Err(_) => break,
        }
    }

    items
}

/// Run one flush: drain a batch, hand it to the processor, deliver outcomes.
///
/// Returns the number of items flushed; zero means the processor was not
/// called.
pub(crate) fn flush_once<I, O, P>(
    queue: &Receiver<SubmittedItem<I, O>>,
    batch_size: usize,
    processor: &P,
) -> usize
where
    P: BatchProcessor<I, O> + ?Sized,
{
    let items = drain(queue, batch_size);
    if items.is_empty() {
        return 0;
    }

    let count = items.len();
    let (inputs, resolvers): (Vec<I>, Vec<Resolver<O>>) =
        items.into_iter().map(SubmittedItem::into_parts).unzip();

    debug!("[flush] processing batch of {count}");

    let result = panic::catch_unwind(AssertUnwindSafe(|| processor.process(inputs)))
        .unwrap_or_else(|payload| Err(anyhow::anyhow!(panic_message(payload.as_ref()))));

    distribute(resolvers, result);

    count
}

/// Route a batch result back to the submitters, by position.
fn distribute<O>(resolvers: Vec<Resolver<O>>, result: anyhow::Result<Vec<O>>) {
    let expected = resolvers.len();

    let outputs = match result {
        Ok(outputs) if outputs.len() == expected => outputs,
        Ok(outputs) => {
            let actual = outputs.len();
            warn!("[flush] batch processor returned {actual} outputs for {expected} inputs");
            fail_all(resolvers, BufferError::CardinalityMismatch { expected, actual });
            return;
        }
        Err(err) => {
            warn!("[flush] batch of {expected} failed: {err:#}");
            fail_all(resolvers, BufferError::processor(err));
            return;
        }
    };

    for (resolver, output) in resolvers.into_iter().zip(outputs) {
        resolver.resolve(Ok(output));
    }
}

fn fail_all<O>(resolvers: Vec<Resolver<O>>, err: BufferError) {
    for resolver in resolvers {
        resolver.resolve(Err(err.clone()));
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("batch processor panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("batch processor panicked: {s}")
    } else {
        "batch processor panicked".to_string()
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
