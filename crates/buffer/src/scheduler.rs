use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use crossbeam::{
    channel::{self, Receiver, Sender},
    select,
    sync::WaitGroup,
};
use log::{debug, error, trace};

use crate::{
    config::BufferConfig,
    handle::SubmittedItem,
    limiter::{ConcurrencyLimiter, Permit},
    processor::BatchProcessor,
    worker,
};

/// State shared by the scheduler thread and every flush worker.
pub(crate) struct FlushContext<I, O> {
    pub(crate) config: BufferConfig,
    pub(crate) queue: Receiver<SubmittedItem<I, O>>,
    pub(crate) limiter: ConcurrencyLimiter,
    pub(crate) processor: Box<dyn BatchProcessor<I, O>>,
    /// Flushes handed to the worker pool so far.
    pub(crate) dispatched: AtomicU64,
}

impl<I, O> FlushContext<I, O> {
    pub(crate) fn new(
        config: BufferConfig,
        queue: Receiver<SubmittedItem<I, O>>,
        processor: Box<dyn BatchProcessor<I, O>>,
    ) -> Self {
        Self {
            config,
            queue,
            limiter: ConcurrencyLimiter::new(config.concurrency_limit),
            processor,
            dispatched: AtomicU64::new(0),
        }
    }
}

/// One flush to run: the slot it runs under and the group waiting for it.
pub(crate) struct FlushJob {
    permit: Permit,
    done: WaitGroup,
}

/// A fixed set of flush worker threads, one per concurrency slot.
///
/// Every queued job holds a permit, so the job channel never holds more than
/// `concurrency_limit` jobs and there is always an idle worker for each one.
/// Dropping the pool closes the channel; workers exit once their current
/// job, throttle included, is done.
pub(crate) struct WorkerPool {
    jobs: Sender<FlushJob>,
}

impl WorkerPool {
    pub(crate) fn start<I, O>(ctx: &Arc<FlushContext<I, O>>) -> io::Result<Self>
    where
        I: Send + 'static,
        O: Send + 'static,
    {
        let size = ctx.limiter.limit();
        let (jobs, jobs_rx) = channel::bounded::<FlushJob>(size);

        for id in 0..size {
            let ctx = Arc::clone(ctx);
            let jobs_rx = jobs_rx.clone();

            // On failure `jobs` is dropped and the workers already started exit.
            thread::Builder::new()
                .name(format!("flushq-flush-{id}"))
                .spawn(move || {
                    for job in jobs_rx {
                        run_flush(&ctx, job);
                    }
                })?;
        }

        debug!("[scheduler] started {size} flush workers");

        Ok(Self { jobs })
    }
}

/// Start the worker pool and the scheduler thread.
///
/// The scheduler wakes on every tick of `flush_interval` and on every
/// coalesced "new item" notification, and tries to launch flushes each time.
/// A message on (or disconnection of) `shutdown_rx` triggers one last launch,
/// waits for those flushes to finish, and ends the thread.
pub(crate) fn spawn<I, O>(
    ctx: Arc<FlushContext<I, O>>,
    notify_rx: Receiver<()>,
    shutdown_rx: Receiver<()>,
) -> io::Result<JoinHandle<()>>
where
    I: Send + 'static,
    O: Send + 'static,
{
    let pool = WorkerPool::start(&ctx)?;

    thread::Builder::new()
        .name("flushq-scheduler".into())
        .spawn(move || run(ctx, pool, notify_rx, shutdown_rx))
}

fn run<I, O>(
    ctx: Arc<FlushContext<I, O>>,
    pool: WorkerPool,
    notify_rx: Receiver<()>,
    shutdown_rx: Receiver<()>,
) {
    let ticker = channel::tick(ctx.config.flush_interval);

    debug!(
        "[scheduler] started: batch_size={}, concurrency_limit={}, flush_interval={:?}",
        ctx.config.batch_size, ctx.config.concurrency_limit, ctx.config.flush_interval
    );

    loop {
        select! {
            recv(shutdown_rx) -> _ => break,
            recv(ticker) -> _ => {
                launch_workers(&ctx, &pool);
            }
            recv(notify_rx) -> msg => {
                if msg.is_err() {
                    break;
                }
                trace!("[scheduler] woken by pending notification");
                launch_workers(&ctx, &pool);
            }
        }
    }

    debug!(
        "[scheduler] shutting down; final flush with {} items pending",
        ctx.queue.len()
    );

    launch_workers(&ctx, &pool).wait();

    debug!(
        "[scheduler] stopped; {} items left unflushed",
        ctx.queue.len()
    );
}

/// Hand one flush to the pool per free concurrency slot, but no more than
/// the queued items can fill.
///
/// Never blocks: an empty queue launches nothing, and once the limiter
/// refuses a slot launching stops. The returned group completes when every
/// launched flush has finished (not its throttle window).
pub(crate) fn launch_workers<I, O>(ctx: &FlushContext<I, O>, pool: &WorkerPool) -> WaitGroup {
    let flushed = WaitGroup::new();

    let wanted = ctx
        .queue
        .len()
        .div_ceil(ctx.config.batch_size)
        .min(ctx.limiter.limit());

    for _ in 0..wanted {
        let Some(permit) = ctx.limiter.try_acquire() else {
            break;
        };

        let job = FlushJob {
            permit,
            done: flushed.clone(),
        };

        // The returned job, and with it the permit, is dropped on failure.
        if pool.jobs.send(job).is_err() {
            error!("[scheduler] flush workers have exited; cannot launch flush");
            break;
        }

        ctx.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    flushed
}

fn run_flush<I, O>(ctx: &FlushContext<I, O>, job: FlushJob) {
    let FlushJob { permit, done } = job;
    let started = Instant::now();

    let count = worker::flush_once(&ctx.queue, ctx.config.batch_size, ctx.processor.as_ref());
    drop(done);

    if count == 0 {
        drop(permit);
        return;
    }

    // Keep the slot until a full interval has passed since this flush began,
    // so each slot re-enters service at most once per interval.
    let remaining = ctx.config.flush_interval.saturating_sub(started.elapsed());
    if !remaining.is_zero() {
        thread::sleep(remaining);
    }

    drop(permit);
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
