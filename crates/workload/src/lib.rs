//! Synthetic insert workload: payloads, a continuous generator, an in-memory
//! task store and a throughput reporter.

mod generator;
mod payload;
mod reporter;
mod store;

pub use generator::{DataGenerator, TaskParams};
pub use payload::{NUM_FIELDS, generate_json_payload};
pub use reporter::{OutputFormat, ReportData, Reporter};
pub use store::{AssociatedData, Task, TaskStore};
