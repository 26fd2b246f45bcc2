use std::{process::ExitCode, thread, time::Instant};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Subcommand};
use flushq_workload::{Reporter, TaskParams, TaskStore};
use log::{error, info};

use super::{
    GlobalArgs,
    basic::{generate, record_single_trip},
};

#[derive(Debug, Args)]
pub struct ConcurrentArgs {
    #[command(subcommand)]
    pub strategy: ConcurrentStrategy,

    /// Total number of rows to insert, split across the writers.
    #[arg(long, short = 'c', global = true, default_value_t = 1000)]
    pub count: usize,

    /// Number of concurrent writers.
    #[arg(long, short = 'w', global = true, default_value_t = 10)]
    pub writers: usize,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConcurrentStrategy {
    /// Each writer inserts its rows one per round trip.
    Singleton,
    /// Each writer inserts its rows in one multi-row insert.
    Batch,
    /// Each writer inserts its rows in one bulk copy.
    Copyfrom,
}

/// Rows assigned to writer `index`: an even split, with the remainder going
/// one row each to the first writers.
pub fn writer_share(count: usize, writers: usize, index: usize) -> usize {
    let share = count / writers;
    if index < count % writers {
        share + 1
    } else {
        share
    }
}

pub fn run(args: ConcurrentArgs, globals: &GlobalArgs) -> ExitCode {
    match execute(args, globals) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[concurrent] {e:#}");
            eprintln!("[concurrent] {e:#}");
            ExitCode::from(2)
        }
    }
}

fn execute(args: ConcurrentArgs, globals: &GlobalArgs) -> Result<()> {
    if args.writers == 0 {
        bail!("--writers must be at least 1");
    }

    let store = TaskStore::new(globals.trip_latency);
    let reporter = Reporter::new();

    info!(
        "[concurrent] inserting {} rows with {:?} across {} writers",
        args.count, args.strategy, args.writers
    );

    let start = Instant::now();

    thread::scope(|s| -> Result<()> {
        let writers: Vec<_> = (0..args.writers)
            .map(|i| {
                let rows = writer_share(args.count, args.writers, i);
                let (store, reporter) = (&store, &reporter);
                s.spawn(move || {
                    write_share(store, reporter, args.strategy, rows, globals.max_payload_size)
                })
            })
            .collect();

        for writer in writers {
            writer
                .join()
                .map_err(|_| anyhow!("writer thread panicked"))??;
        }

        Ok(())
    })?;

    info!(
        "[concurrent] inserted {} rows in {:?}",
        store.len(),
        start.elapsed()
    );

    reporter
        .print(start.elapsed(), globals.output_format())
        .context("could not print report")
}

fn write_share(
    store: &TaskStore,
    reporter: &Reporter,
    strategy: ConcurrentStrategy,
    rows: usize,
    max_payload_size: usize,
) -> Result<()> {
    match strategy {
        ConcurrentStrategy::Singleton => {
            for _ in 0..rows {
                let started = Instant::now();
                store
                    .insert_singleton(TaskParams::generate(max_payload_size))
                    .context("could not create task")?;

                reporter.record_task(started.elapsed());
                reporter.record_batch();
            }
        }
        ConcurrentStrategy::Batch if rows > 0 => {
            let tasks = generate(rows, max_payload_size);
            let started = Instant::now();
            store
                .insert_batch(tasks)
                .context("could not create tasks batch")?;
            record_single_trip(reporter, rows, started);
        }
        ConcurrentStrategy::Copyfrom if rows > 0 => {
            let tasks = generate(rows, max_payload_size);
            let started = Instant::now();
            store
                .copy_from(&tasks)
                .context("could not copy tasks")?;
            record_single_trip(reporter, rows, started);
        }
        // More writers than rows: nothing to send.
        ConcurrentStrategy::Batch | ConcurrentStrategy::Copyfrom => {}
    }

    Ok(())
}
