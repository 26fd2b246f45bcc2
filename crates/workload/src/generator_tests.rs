use super::*;

use std::collections::HashSet;

#[test]
fn generated_params_have_uuid_keys_and_json_args() {
    let params = TaskParams::generate(100);

    assert!(Uuid::parse_str(&params.idempotency_key).is_ok());
    let value: serde_json::Value = serde_json::from_slice(&params.args).expect("json args");
    assert!(value.is_object());
}

#[test]
fn generator_streams_until_stopped_then_closes() {
    let stop = Arc::new(AtomicBool::new(false));
    let mut generator = DataGenerator::new(4);
    let tasks = generator.tasks();

    let handle = generator
        .start(Arc::clone(&stop), 50)
        .expect("start generator");

    let mut keys = HashSet::new();
    for _ in 0..20 {
        let task = tasks
            .recv_timeout(Duration::from_secs(2))
            .expect("generator produces");
        assert!(keys.insert(task.idempotency_key), "keys are unique");
    }

    stop.store(true, Ordering::Relaxed);
    // Drain whatever was in flight; the channel must eventually disconnect.
    while tasks.recv_timeout(Duration::from_secs(2)).is_ok() {}

    let produced = handle.join().expect("generator panicked");
    assert!(produced >= 20);
}

#[test]
fn stop_unblocks_a_generator_with_a_full_channel() {
    let stop = Arc::new(AtomicBool::new(false));
    let mut generator = DataGenerator::new(1);

    let handle = generator
        .start(Arc::clone(&stop), 10)
        .expect("start generator");

    // Nobody reads, so the generator parks on the full channel.
    thread::sleep(Duration::from_millis(20));
    stop.store(true, Ordering::Relaxed);

    let produced = handle.join().expect("generator panicked");
    assert_eq!(produced, 1);
}

#[test]
fn starting_twice_is_an_error() {
    let stop = Arc::new(AtomicBool::new(true));
    let mut generator = DataGenerator::new(1);

    generator
        .start(Arc::clone(&stop), 10)
        .expect("first start")
        .join()
        .expect("generator panicked");

    assert!(generator.start(stop, 10).is_err());
}
