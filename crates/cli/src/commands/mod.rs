pub mod basic;
pub mod concurrent;
pub mod continuous;

use std::{
    sync::{Arc, atomic::AtomicBool},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flushq_workload::OutputFormat;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag;

pub use basic::BasicArgs;
pub use concurrent::ConcurrentArgs;
pub use continuous::ContinuousArgs;

#[derive(Parser, Debug)]
#[command(
    name = "flushq",
    version,
    about = "Compare insert strategies, with and without a batching buffer",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub globals: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Upper bound on the size of each generated JSON payload.
    #[arg(long, global = true, default_value_t = 1000)]
    pub max_payload_size: usize,

    /// Print the report as JSON.
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Simulated round-trip time of one call to the task store.
    #[arg(long, global = true, default_value = "1ms", value_parser = parse_duration)]
    pub trip_latency: Duration,
}

impl GlobalArgs {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Insert a fixed number of rows once with a single strategy.
    ///
    /// Example:
    ///   flushq basic batch -c 5000
    Basic(BasicArgs),

    /// Insert a fixed number of rows split across concurrent writers, with
    /// no buffer in between.
    ///
    /// Example:
    ///   flushq concurrent singleton -c 10000 -w 20
    Concurrent(ConcurrentArgs),

    /// Insert continuously from a generator for a fixed duration.
    ///
    /// Example:
    ///   flushq continuous batch -w 20 -b 200 -d 30s
    ///   flushq --json continuous copyfrom -f 5ms
    ///   flushq continuous batch --with-associated-data
    Continuous(ContinuousArgs),
}

/// Flag raised on SIGINT or SIGTERM.
pub fn interrupt_flag() -> Result<Arc<AtomicBool>> {
    let interrupted = Arc::new(AtomicBool::new(false));

    for sig in [SIGINT, SIGTERM] {
        flag::register(sig, Arc::clone(&interrupted))
            .with_context(|| format!("Failed to register signal handler for {sig}"))?;
    }

    Ok(interrupted)
}

/// Parse durations such as `250ms`, `10s`, `1.5m` or `2h`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .ok_or_else(|| format!("missing unit in duration '{s}' (use ns, us, ms, s, m or h)"))?;

    let (value, unit) = s.split_at(split);
    let value: f64 = value
        .parse()
        .map_err(|_| format!("invalid number in duration '{s}'"))?;

    let secs = match unit {
        "ns" => value / 1e9,
        "us" | "µs" => value / 1e6,
        "ms" => value / 1e3,
        "s" => value,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        other => return Err(format!("unknown unit '{other}' in duration '{s}'")),
    };

    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid duration '{s}': {e}"))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
