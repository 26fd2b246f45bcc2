use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

struct Slots {
    limit: usize,
    in_use: AtomicUsize,
}

/// Counting semaphore bounding how many flush workers run at once.
///
/// Acquisition never blocks: a flush attempt that finds no free slot is
/// simply skipped.
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    slots: Arc<Slots>,
}

/// One concurrency slot. The slot is returned when the permit is dropped.
#[must_use = "dropping a permit releases its slot immediately"]
pub struct Permit {
    slots: Arc<Slots>,
}

impl ConcurrencyLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            slots: Arc::new(Slots {
                limit,
                in_use: AtomicUsize::new(0),
            }),
        }
    }

    pub fn try_acquire(&self) -> Option<Permit> {
        let slots = &self.slots;
        let mut current = slots.in_use.load(Ordering::Acquire);

        loop {
            if current >= slots.limit {
                return None;
            }

            match slots.in_use.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Some(Permit {
                        slots: Arc::clone(&self.slots),
                    });
                }
                Err(actual) => current = actual,
            }
        }
    }

    pub fn limit(&self) -> usize {
        self.slots.limit
    }

    pub fn in_use(&self) -> usize {
        self.slots.in_use.load(Ordering::Acquire)
    }

    pub fn available(&self) -> usize {
        self.limit().saturating_sub(self.in_use())
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.slots.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
#[path = "limiter_tests.rs"]
mod tests;
