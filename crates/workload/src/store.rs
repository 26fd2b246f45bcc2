use std::{
    sync::{Mutex, PoisonError},
    thread,
    time::Duration,
};

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use hashbrown::HashSet;
use log::trace;

use crate::generator::TaskParams;

/// A stored row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub args: Vec<u8>,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

/// A row of the associated-data table, one per task written with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociatedData {
    pub task_id: u64,
    pub args_json: Vec<u8>,
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Task>,
    keys: HashSet<String>,
    next_id: u64,
    associated: Vec<AssociatedData>,
}

impl Table {
    /// Reject the whole statement if any key is already taken or repeated.
    fn check_unique<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let mut seen = HashSet::new();
        for key in keys {
            if self.keys.contains(key) || !seen.insert(key) {
                bail!("duplicate key value violates unique constraint: idempotency_key={key}");
            }
        }
        Ok(())
    }

    fn insert(&mut self, params: TaskParams, created_at: DateTime<Utc>) -> Task {
        self.next_id += 1;
        let task = Task {
            id: self.next_id,
            args: params.args,
            idempotency_key: params.idempotency_key,
            created_at,
        };
        self.keys.insert(task.idempotency_key.clone());
        self.rows.push(task.clone());
        task
    }

    fn associate(&mut self, task: &Task) {
        self.associated.push(AssociatedData {
            task_id: task.id,
            args_json: task.args.clone(),
        });
    }
}

/// In-process stand-in for the tasks table.
///
/// Every call costs one simulated round trip of `trip_latency`, regardless
/// of how many rows it carries; that is what makes batching pay off. Each
/// call is atomic: it either inserts all of its rows or none.
#[derive(Debug, Default)]
pub struct TaskStore {
    table: Mutex<Table>,
    trip_latency: Duration,
}

impl TaskStore {
    pub fn new(trip_latency: Duration) -> Self {
        Self {
            table: Mutex::default(),
            trip_latency,
        }
    }

    fn round_trip(&self) {
        if !self.trip_latency.is_zero() {
            thread::sleep(self.trip_latency);
        }
    }

    fn table(&self) -> std::sync::MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Round trip without touching the table.
    pub fn ping(&self) -> Result<()> {
        self.round_trip();
        Ok(())
    }

    pub fn insert_singleton(&self, params: TaskParams) -> Result<Task> {
        self.round_trip();

        let mut table = self.table();
        table.check_unique([params.idempotency_key.as_str()])?;
        Ok(table.insert(params, Utc::now()))
    }

    /// Insert many rows in one statement, returning them in input order.
    pub fn insert_batch(&self, params: Vec<TaskParams>) -> Result<Vec<Task>> {
        self.round_trip();

        let mut table = self.table();
        table.check_unique(params.iter().map(|p| p.idempotency_key.as_str()))?;

        let now = Utc::now();
        let tasks: Vec<Task> = params.into_iter().map(|p| table.insert(p, now)).collect();

        trace!("[store] batch inserted {} rows", tasks.len());
        Ok(tasks)
    }

    /// Insert one row plus its associated-data row in a single transaction.
    ///
    /// Costs two round trips; either both rows land or neither does.
    pub fn insert_singleton_with_associated_data(&self, params: TaskParams) -> Result<Task> {
        self.round_trip();
        self.round_trip();

        let mut table = self.table();
        table.check_unique([params.idempotency_key.as_str()])?;

        let task = table.insert(params, Utc::now());
        table.associate(&task);
        Ok(task)
    }

    /// Batch insert followed by a batch of associated-data rows, in one
    /// transaction. Costs two round trips and returns tasks in input order.
    pub fn insert_batch_with_associated_data(&self, params: Vec<TaskParams>) -> Result<Vec<Task>> {
        self.round_trip();
        self.round_trip();

        let mut table = self.table();
        table.check_unique(params.iter().map(|p| p.idempotency_key.as_str()))?;

        let now = Utc::now();
        let tasks: Vec<Task> = params.into_iter().map(|p| table.insert(p, now)).collect();
        for task in &tasks {
            table.associate(task);
        }

        trace!("[store] batch inserted {} rows with associated data", tasks.len());
        Ok(tasks)
    }

    /// Bulk-load rows, returning only the number of rows copied.
    pub fn copy_from(&self, params: &[TaskParams]) -> Result<u64> {
        self.round_trip();

        let mut table = self.table();
        table.check_unique(params.iter().map(|p| p.idempotency_key.as_str()))?;

        let now = Utc::now();
        let count = params.len() as u64;
        for p in params {
            table.insert(p.clone(), now);
        }

        trace!("[store] copied {count} rows");
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.table().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of rows in the associated-data table.
    pub fn associated_len(&self) -> usize {
        self.table().associated.len()
    }

    pub fn associated_data(&self, task_id: u64) -> Option<AssociatedData> {
        self.table()
            .associated
            .iter()
            .find(|row| row.task_id == task_id)
            .cloned()
    }

    pub fn get(&self, id: u64) -> Option<Task> {
        let table = self.table();
        // Ids are assigned densely from 1.
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        table.rows.get(index).cloned()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
