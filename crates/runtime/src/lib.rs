mod config;
pub mod logging;

pub use config::{DEFAULT_LOG_LEVEL, PROGRAM_LOG_LEVEL};

pub use logging::init;
