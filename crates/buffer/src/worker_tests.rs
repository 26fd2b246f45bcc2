use super::*;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crossbeam::channel::{self, Sender};

use crate::handle::Handle;

fn enqueue<I, O>(
    tx: &Sender<SubmittedItem<I, O>>,
    inputs: impl IntoIterator<Item = I>,
) -> Vec<Handle<O>> {
    inputs
        .into_iter()
        .map(|input| {
            let (item, handle) = SubmittedItem::new(input);
            tx.send(item).expect("queue open");
            handle
        })
        .collect()
}

#[test]
fn drain_stops_at_max() {
    let (tx, rx) = channel::bounded::<SubmittedItem<u32, u32>>(10);
    let _handles = enqueue(&tx, 0..7);

    let first = drain(&rx, 3);
    assert_eq!(first.iter().map(|i| i.input).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(rx.len(), 4);
}

#[test]
fn drain_takes_what_is_available_without_waiting() {
    let (tx, rx) = channel::bounded::<SubmittedItem<u32, u32>>(10);
    let _handles = enqueue(&tx, 0..2);

    let items = drain(&rx, 100);
    assert_eq!(items.len(), 2);
    assert!(drain(&rx, 100).is_empty());
}

#[test]
fn empty_queue_never_calls_processor() {
    let (_tx, rx) = channel::bounded::<SubmittedItem<u32, u32>>(4);
    let calls = AtomicUsize::new(0);

    let processor = |inputs: Vec<u32>| -> anyhow::Result<Vec<u32>> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs)
    };

    assert_eq!(flush_once(&rx, 4, &processor), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn successful_batch_is_delivered_by_position() {
    let (tx, rx) = channel::bounded::<SubmittedItem<u32, String>>(8);
    let handles = enqueue(&tx, [10u32, 20, 30]);

    let processor = |inputs: Vec<u32>| -> anyhow::Result<Vec<String>> {
        Ok(inputs.iter().map(|n| format!("row-{n}")).collect())
    };

    assert_eq!(flush_once(&rx, 8, &processor), 3);

    let got: Vec<String> = handles
        .into_iter()
        .map(|h| h.wait().expect("result"))
        .collect();
    assert_eq!(got, vec!["row-10", "row-20", "row-30"]);
}

#[test]
fn processor_error_is_shared_by_every_item() {
    let (tx, rx) = channel::bounded::<SubmittedItem<u32, u32>>(8);
    let handles = enqueue(&tx, 0u32..5);

    let processor =
        |_: Vec<u32>| -> anyhow::Result<Vec<u32>> { Err(anyhow::anyhow!("db down")) };

    assert_eq!(flush_once(&rx, 8, &processor), 5);

    let errors: Vec<Arc<anyhow::Error>> = handles
        .into_iter()
        .map(|h| match h.wait() {
            Err(BufferError::Processor(e)) => e,
            other => panic!("expected Processor error, got {other:?}"),
        })
        .collect();

    for e in &errors {
        assert_eq!(e.to_string(), "db down");
        assert!(Arc::ptr_eq(e, &errors[0]), "all items share one error");
    }
}

#[test]
fn short_output_is_a_cardinality_mismatch_for_all() {
    let (tx, rx) = channel::bounded::<SubmittedItem<u32, u32>>(8);
    let handles = enqueue(&tx, [1u32, 2, 3]);

    let processor = |mut inputs: Vec<u32>| -> anyhow::Result<Vec<u32>> {
        inputs.pop();
        Ok(inputs)
    };

    flush_once(&rx, 8, &processor);

    for h in handles {
        match h.wait() {
            Err(BufferError::CardinalityMismatch { expected, actual }) => {
                assert_eq!((expected, actual), (3, 2));
            }
            other => panic!("expected CardinalityMismatch, got {other:?}"),
        }
    }
}

#[test]
fn long_output_is_also_a_cardinality_mismatch() {
    let (tx, rx) = channel::bounded::<SubmittedItem<u32, u32>>(8);
    let handles = enqueue(&tx, [1u32]);

    let processor = |_: Vec<u32>| -> anyhow::Result<Vec<u32>> { Ok(vec![1, 1]) };

    flush_once(&rx, 8, &processor);

    assert!(matches!(
        handles.into_iter().next().expect("one handle").wait(),
        Err(BufferError::CardinalityMismatch {
            expected: 1,
            actual: 2
        })
    ));
}

#[test]
fn panicking_processor_fails_the_batch() {
    let (tx, rx) = channel::bounded::<SubmittedItem<u32, u32>>(8);
    let handles = enqueue(&tx, [1u32, 2]);

    let processor = |_: Vec<u32>| -> anyhow::Result<Vec<u32>> { panic!("boom") };

    assert_eq!(flush_once(&rx, 8, &processor), 2);

    for h in handles {
        match h.wait() {
            Err(BufferError::Processor(e)) => {
                assert!(e.to_string().contains("boom"), "got {e}");
            }
            other => panic!("expected Processor error, got {other:?}"),
        }
    }
}

#[test]
fn flush_respects_batch_size_and_leaves_the_rest() {
    let (tx, rx) = channel::bounded::<SubmittedItem<u32, u32>>(16);
    let handles = enqueue(&tx, 0u32..10);

    let sizes = std::sync::Mutex::new(Vec::new());
    let processor = |inputs: Vec<u32>| -> anyhow::Result<Vec<u32>> {
        sizes.lock().unwrap().push(inputs.len());
        Ok(inputs)
    };

    while flush_once(&rx, 4, &processor) > 0 {}

    assert_eq!(*sizes.lock().unwrap(), vec![4, 4, 2]);
    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(h.wait().expect("result"), i as u32);
    }
}
