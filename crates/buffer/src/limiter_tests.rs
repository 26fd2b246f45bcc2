use super::*;

use std::{sync::Barrier, thread};

#[test]
fn acquire_up_to_limit_then_refuse() {
    let limiter = ConcurrencyLimiter::new(3);

    let permits: Vec<Permit> = (0..3)
        .map(|_| limiter.try_acquire().expect("slot available"))
        .collect();

    assert_eq!(limiter.in_use(), 3);
    assert_eq!(limiter.available(), 0);
    assert!(limiter.try_acquire().is_none());

    drop(permits);
    assert_eq!(limiter.in_use(), 0);
    assert_eq!(limiter.available(), 3);
}

#[test]
fn dropping_a_permit_frees_exactly_one_slot() {
    let limiter = ConcurrencyLimiter::new(2);

    let a = limiter.try_acquire().expect("first slot");
    let _b = limiter.try_acquire().expect("second slot");
    assert!(limiter.try_acquire().is_none());

    drop(a);
    assert_eq!(limiter.available(), 1);

    let _c = limiter.try_acquire().expect("slot freed by drop");
    assert!(limiter.try_acquire().is_none());
}

#[test]
fn clones_share_the_same_slots() {
    let limiter = ConcurrencyLimiter::new(1);
    let other = limiter.clone();

    let _p = limiter.try_acquire().expect("slot");
    assert!(other.try_acquire().is_none());
    assert_eq!(other.in_use(), 1);
}

#[test]
fn zero_limit_never_grants() {
    let limiter = ConcurrencyLimiter::new(0);
    assert!(limiter.try_acquire().is_none());
    assert_eq!(limiter.available(), 0);
}

#[test]
fn concurrent_acquirers_never_exceed_limit() {
    const THREADS: usize = 16;
    const LIMIT: usize = 4;

    let limiter = ConcurrencyLimiter::new(LIMIT);
    let barrier = Barrier::new(THREADS);

    let granted: Vec<Option<Permit>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    limiter.try_acquire()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("acquirer panicked"))
            .collect()
    });

    let held = granted.iter().filter(|p| p.is_some()).count();
    assert_eq!(held, LIMIT);
    assert_eq!(limiter.in_use(), LIMIT);
}
