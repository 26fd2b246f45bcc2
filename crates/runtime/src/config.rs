pub const PROGRAM_LOG_LEVEL: &str = "FLUSHQ_LOG_LEVEL";

/// Level used when `FLUSHQ_LOG_LEVEL` is unset or unparsable.
pub const DEFAULT_LOG_LEVEL: log::Level = log::Level::Warn;

