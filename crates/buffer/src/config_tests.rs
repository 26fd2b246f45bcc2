use super::*;

#[test]
fn defaults_match_documented_values() {
    let cfg = BufferConfig::default();

    assert_eq!(cfg.batch_size, 100);
    assert_eq!(cfg.concurrency_limit, 10);
    assert_eq!(cfg.flush_interval, Duration::from_millis(10));
    assert_eq!(cfg.submission_timeout, Duration::from_secs(10));
    assert_eq!(cfg.queue_capacity(), 1000);
    assert!(cfg.validate().is_ok());
}

#[test]
fn builders_override_fields() {
    let cfg = BufferConfig::default()
        .with_batch_size(3)
        .with_concurrency_limit(2)
        .with_flush_interval(Duration::from_millis(5))
        .with_submission_timeout(Duration::from_millis(50));

    assert_eq!(cfg.batch_size, 3);
    assert_eq!(cfg.concurrency_limit, 2);
    assert_eq!(cfg.flush_interval, Duration::from_millis(5));
    assert_eq!(cfg.submission_timeout, Duration::from_millis(50));
    assert_eq!(cfg.queue_capacity(), 6);
}

#[test]
fn validate_rejects_degenerate_values() {
    let cases = [
        BufferConfig::default().with_batch_size(0),
        BufferConfig::default().with_concurrency_limit(0),
        BufferConfig::default().with_flush_interval(Duration::ZERO),
    ];

    for cfg in cases {
        match cfg.validate() {
            Err(BufferError::InvalidConfig(_)) => {}
            other => panic!("expected InvalidConfig for {cfg:?}, got {other:?}"),
        }
    }
}

#[test]
fn zero_submission_timeout_is_allowed() {
    // A zero timeout turns submit_no_wait into a pure try-send.
    let cfg = BufferConfig::default().with_submission_timeout(Duration::ZERO);
    assert!(cfg.validate().is_ok());
}
