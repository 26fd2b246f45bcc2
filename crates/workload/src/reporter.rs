use std::{
    io::{self, Write},
    sync::{Mutex, PoisonError},
    time::Duration,
};

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable banner.
    #[default]
    Human,
    /// Pretty-printed JSON object.
    Json,
}

#[derive(Debug, Default)]
struct Counters {
    task_count: u64,
    num_batches: u64,
    total_latency: Duration,
}

/// Thread-safe tally of task latencies and batch round trips.
#[derive(Debug, Default)]
pub struct Reporter {
    counters: Mutex<Counters>,
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub task_count: u64,
    pub total_time: String,
    pub avg_latency: String,
    pub throughput: f64,
    pub num_batches: u64,
    pub avg_batch_size: u64,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed task and the time it took from submission.
    pub fn record_task(&self, latency: Duration) {
        let mut c = self.lock();
        c.task_count += 1;
        c.total_latency += latency;
    }

    /// Record one round trip to the store.
    pub fn record_batch(&self) {
        self.lock().num_batches += 1;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn report(&self, elapsed: Duration) -> ReportData {
        let c = self.lock();

        let avg_latency = match u32::try_from(c.task_count) {
            Ok(0) => Duration::ZERO,
            Ok(n) => c.total_latency / n,
            Err(_) => {
                Duration::from_secs_f64(c.total_latency.as_secs_f64() / c.task_count as f64)
            }
        };

        let secs = elapsed.as_secs_f64();
        let throughput = if secs > 0.0 {
            c.task_count as f64 / secs
        } else {
            0.0
        };

        let avg_batch_size = c.task_count.checked_div(c.num_batches).unwrap_or(0);

        ReportData {
            task_count: c.task_count,
            total_time: format!("{elapsed:?}"),
            avg_latency: format!("{avg_latency:?}"),
            throughput,
            num_batches: c.num_batches,
            avg_batch_size,
        }
    }

    pub fn write_report<W: Write>(
        &self,
        out: &mut W,
        elapsed: Duration,
        format: OutputFormat,
    ) -> io::Result<()> {
        let data = self.report(elapsed);

        match format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, &data).map_err(io::Error::other)?;
                writeln!(out)
            }
            OutputFormat::Human => {
                writeln!(out, "==== Execution Report ====")?;
                writeln!(out, "Total tasks executed: {}", data.task_count)?;
                writeln!(out, "Total time: {}", data.total_time)?;
                writeln!(out, "Average write latency: {}", data.avg_latency)?;
                writeln!(out, "Throughput: {:.2} rows/second", data.throughput)?;
                writeln!(out, "Number of batches: {}", data.num_batches)?;
                writeln!(out, "Average batch size: {}", data.avg_batch_size)?;
                writeln!(out, "==========================")
            }
        }
    }

    pub fn print(&self, elapsed: Duration, format: OutputFormat) -> io::Result<()> {
        self.write_report(&mut io::stdout().lock(), elapsed, format)
    }
}

#[cfg(test)]
#[path = "reporter_tests.rs"]
mod tests;
