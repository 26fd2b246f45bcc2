use std::{process::ExitCode, time::Instant};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use flushq_workload::{Reporter, TaskParams, TaskStore};
use log::{error, info};

use super::GlobalArgs;

#[derive(Debug, Args)]
pub struct BasicArgs {
    #[command(subcommand)]
    pub strategy: BasicStrategy,

    /// Number of rows to insert.
    #[arg(long, short = 'c', global = true, default_value_t = 1000)]
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum BasicStrategy {
    /// One row per round trip.
    Singleton,
    /// All rows in a single multi-row insert.
    Batch,
    /// All rows in a single bulk copy.
    Copyfrom,
}

pub fn run(args: BasicArgs, globals: &GlobalArgs) -> ExitCode {
    match execute(args, globals) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[basic] {e:#}");
            eprintln!("[basic] {e:#}");
            ExitCode::from(2)
        }
    }
}

fn execute(args: BasicArgs, globals: &GlobalArgs) -> Result<()> {
    let store = TaskStore::new(globals.trip_latency);
    let reporter = Reporter::new();

    info!(
        "[basic] inserting {} rows with {:?}",
        args.count, args.strategy
    );

    let start = Instant::now();

    match args.strategy {
        BasicStrategy::Singleton => {
            for _ in 0..args.count {
                let insert_start = Instant::now();
                let params = TaskParams::generate(globals.max_payload_size);

                store
                    .insert_singleton(params)
                    .context("could not create task")?;

                reporter.record_batch();
                reporter.record_task(insert_start.elapsed());
            }
        }
        BasicStrategy::Batch => {
            let tasks = generate(args.count, globals.max_payload_size);
            store
                .insert_batch(tasks)
                .context("could not create tasks batch")?;
            record_single_trip(&reporter, args.count, start);
        }
        BasicStrategy::Copyfrom => {
            let tasks = generate(args.count, globals.max_payload_size);
            store
                .copy_from(&tasks)
                .context("could not copy tasks")?;
            record_single_trip(&reporter, args.count, start);
        }
    }

    reporter
        .print(start.elapsed(), globals.output_format())
        .context("could not print report")
}

pub(super) fn generate(count: usize, max_payload_size: usize) -> Vec<TaskParams> {
    (0..count)
        .map(|_| TaskParams::generate(max_payload_size))
        .collect()
}

/// Every row of a one-shot insert waited for the whole run.
pub(super) fn record_single_trip(reporter: &Reporter, count: usize, start: Instant) {
    let latency = start.elapsed();
    for _ in 0..count {
        reporter.record_task(latency);
    }
    reporter.record_batch();
}
