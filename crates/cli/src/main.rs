use std::process::ExitCode;

use clap::Parser;

mod commands;

use commands::{Cli, Command};
use flushq_runtime::logging;

fn main() -> ExitCode {
    logging::init().ok();

    let cli = Cli::parse();
    let globals = cli.globals;

    match cli.command {
        Command::Basic(args) => commands::basic::run(args, &globals),
        Command::Concurrent(args) => commands::concurrent::run(args, &globals),
        Command::Continuous(args) => commands::continuous::run(args, &globals),
    }
}
