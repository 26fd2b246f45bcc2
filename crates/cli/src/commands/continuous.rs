use std::{
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use flushq_buffer::{Buffer, BufferConfig, Handle};
use flushq_workload::{DataGenerator, Reporter, TaskParams, TaskStore};
use log::{debug, error, info, warn};

use super::{GlobalArgs, interrupt_flag, parse_duration};

/// How often producer loops re-check the deadline and the interrupt flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Args)]
pub struct ContinuousArgs {
    #[command(subcommand)]
    pub strategy: ContinuousStrategy,

    /// Number of concurrent writers; also the buffer's concurrency limit.
    #[arg(long, short = 'w', global = true, default_value_t = 10)]
    pub writers: usize,

    /// How long to keep generating rows.
    #[arg(
        long,
        short = 'd',
        global = true,
        default_value = "10s",
        value_parser = parse_duration
    )]
    pub duration: Duration,

    /// Maximum rows per flush for the buffered strategies.
    #[arg(long, short = 'b', global = true, default_value_t = 100)]
    pub batch_size: usize,

    /// Interval between periodic flushes, and the per-writer throttle window.
    #[arg(
        long,
        short = 'f',
        global = true,
        default_value = "10ms",
        value_parser = parse_duration
    )]
    pub flush_interval: Duration,

    /// Capacity of the generator channel (default: batch size × writers).
    #[arg(long = "buffer", global = true)]
    pub channel_buffer: Option<usize>,

    /// How long a submission may wait for space in the buffer.
    #[arg(long, global = true, default_value = "10s", value_parser = parse_duration)]
    pub submission_timeout: Duration,

    /// Write an associated-data row with every task, in the same transaction
    /// (singleton and batch only).
    #[arg(long, global = true)]
    pub with_associated_data: bool,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ContinuousStrategy {
    /// Each writer inserts one row per round trip.
    Singleton,
    /// Rows go through the buffer and are flushed as multi-row inserts.
    Batch,
    /// Rows go through the buffer and are flushed as bulk copies.
    Copyfrom,
    /// Rows go through the buffer, but each flush only pings the store.
    Ping,
}

impl ContinuousArgs {
    pub fn channel_buffer_size(&self) -> usize {
        self.channel_buffer
            .unwrap_or_else(|| self.batch_size.saturating_mul(self.writers))
            .max(1)
    }

    pub fn buffer_config(&self) -> BufferConfig {
        BufferConfig::default()
            .with_batch_size(self.batch_size)
            .with_concurrency_limit(self.writers)
            .with_flush_interval(self.flush_interval)
            .with_submission_timeout(self.submission_timeout)
    }
}

/// Everything one run shares between producer, writers and waiters.
struct RunContext {
    store: Arc<TaskStore>,
    reporter: Arc<Reporter>,
    stop: Arc<AtomicBool>,
    deadline: Instant,
}

impl RunContext {
    fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed) || Instant::now() >= self.deadline
    }
}

pub fn run(args: ContinuousArgs, globals: &GlobalArgs) -> ExitCode {
    match execute(args, globals) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[continuous] {e:#}");
            eprintln!("[continuous] {e:#}");
            ExitCode::from(2)
        }
    }
}

fn execute(args: ContinuousArgs, globals: &GlobalArgs) -> Result<()> {
    if args.writers == 0 {
        bail!("--writers must be at least 1");
    }

    let stop = interrupt_flag()?;
    let store = Arc::new(TaskStore::new(globals.trip_latency));
    let reporter = Arc::new(Reporter::new());

    let mut generator = DataGenerator::new(args.channel_buffer_size());
    let tasks = generator.tasks();

    info!(
        "[continuous] {:?}: writers={}, batch_size={}, flush_interval={:?}, duration={:?}",
        args.strategy, args.writers, args.batch_size, args.flush_interval, args.duration
    );

    let start = Instant::now();
    let ctx = RunContext {
        store: Arc::clone(&store),
        reporter: Arc::clone(&reporter),
        stop: Arc::clone(&stop),
        deadline: start + args.duration,
    };

    let generator_stop = Arc::new(AtomicBool::new(false));
    let generator_handle = generator
        .start(Arc::clone(&generator_stop), globals.max_payload_size)
        .context("could not start data generator")?;

    let with_associated_data = args.with_associated_data;
    if with_associated_data
        && matches!(
            args.strategy,
            ContinuousStrategy::Copyfrom | ContinuousStrategy::Ping
        )
    {
        warn!(
            "[continuous] --with-associated-data has no effect on {:?}",
            args.strategy
        );
    }

    let result = match args.strategy {
        ContinuousStrategy::Singleton => {
            run_singleton(&ctx, &tasks, args.writers, with_associated_data)
        }
        ContinuousStrategy::Batch => {
            let store = Arc::clone(&store);
            run_buffered(&ctx, &tasks, &args, move |rows: Vec<TaskParams>| {
                if with_associated_data {
                    store.insert_batch_with_associated_data(rows)
                } else {
                    store.insert_batch(rows)
                }
            })
        }
        ContinuousStrategy::Copyfrom => {
            let store = Arc::clone(&store);
            run_buffered(&ctx, &tasks, &args, move |rows: Vec<TaskParams>| {
                let copied = store.copy_from(&rows)?;
                if copied != rows.len() as u64 {
                    bail!("copied {copied} rows, expected {}", rows.len());
                }
                // Bulk copy reports no rows back; echo the inputs.
                Ok(rows)
            })
        }
        ContinuousStrategy::Ping => {
            let store = Arc::clone(&store);
            run_buffered(&ctx, &tasks, &args, move |rows: Vec<TaskParams>| {
                store.ping()?;
                Ok(rows)
            })
        }
    };

    generator_stop.store(true, Ordering::Relaxed);
    match generator_handle.join() {
        Ok(produced) => debug!("[continuous] generator produced {produced} tasks"),
        Err(_) => warn!("[continuous] data generator panicked"),
    }

    result?;

    info!(
        "[continuous] store holds {} rows, {} associated",
        store.len(),
        store.associated_len()
    );

    reporter
        .print(start.elapsed(), globals.output_format())
        .context("could not print report")
}

/// A fixed pool of writers, each inserting one row per round trip.
fn run_singleton(
    ctx: &RunContext,
    tasks: &Receiver<TaskParams>,
    writers: usize,
    with_associated_data: bool,
) -> Result<()> {
    thread::scope(|s| {
        for _ in 0..writers {
            s.spawn(|| {
                while !ctx.should_stop() {
                    let task = match tasks.recv_timeout(POLL_INTERVAL) {
                        Ok(task) => task,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    };

                    let started = Instant::now();
                    let outcome = if with_associated_data {
                        ctx.store.insert_singleton_with_associated_data(task)
                    } else {
                        ctx.store.insert_singleton(task)
                    };

                    ctx.reporter.record_task(started.elapsed());
                    ctx.reporter.record_batch();

                    if let Err(e) = outcome {
                        warn!("[singleton] could not create task: {e:#}");
                    }
                }
            });
        }
    });

    Ok(())
}

/// Feed generated rows through a [`Buffer`] flushing into `write`.
///
/// Handles are awaited by a pool of waiter threads so that each row's
/// latency is measured when its own outcome arrives. The buffer outlives the
/// waiters, so every submitted row resolves before it shuts down.
fn run_buffered<O, F>(
    ctx: &RunContext,
    tasks: &Receiver<TaskParams>,
    args: &ContinuousArgs,
    write: F,
) -> Result<()>
where
    O: Send + 'static,
    F: Fn(Vec<TaskParams>) -> Result<Vec<O>> + Send + Sync + 'static,
{
    let reporter = Arc::clone(&ctx.reporter);
    let processor = move |rows: Vec<TaskParams>| -> Result<Vec<O>> {
        reporter.record_batch();
        write(rows)
    };

    let buffer = Buffer::<TaskParams, O>::new(args.buffer_config(), processor)
        .context("could not create buffer")?;

    let submitted = thread::scope(|s| -> Result<u64> {
        let (pending_tx, pending_rx) = channel::unbounded::<(Instant, Handle<O>)>();

        for _ in 0..args.writers {
            let pending_rx = pending_rx.clone();
            s.spawn(move || {
                for (started, handle) in pending_rx {
                    let outcome = handle.wait();
                    ctx.reporter.record_task(started.elapsed());

                    if let Err(e) = outcome {
                        warn!("[buffered] could not create task: {e}");
                    }
                }
            });
        }
        drop(pending_rx);

        let mut submitted = 0u64;
        while !ctx.should_stop() {
            let task = match tasks.recv_timeout(POLL_INTERVAL) {
                Ok(task) => task,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let started = Instant::now();
            let handle = buffer
                .submit_no_wait(task)
                .context("could not buffer task")?;

            // Waiters only exit once this sender is dropped.
            let _ = pending_tx.send((started, handle));
            submitted += 1;
        }

        Ok(submitted)
    })?;

    debug!("[buffered] submitted {submitted} tasks");
    buffer.shutdown();

    Ok(())
}
