/// The pluggable operation a buffer flushes batches into.
///
/// Implementations must return exactly one output per input, in input order,
/// or an error for the whole batch. Anything else is reported to every item
/// of the batch as [`BufferError::CardinalityMismatch`].
///
/// [`BufferError::CardinalityMismatch`]: crate::BufferError::CardinalityMismatch
pub trait BatchProcessor<I, O>: Send + Sync {
    fn process(&self, inputs: Vec<I>) -> anyhow::Result<Vec<O>>;
}

impl<I, O, F> BatchProcessor<I, O> for F
where
    F: Fn(Vec<I>) -> anyhow::Result<Vec<O>> + Send + Sync,
{
    fn process(&self, inputs: Vec<I>) -> anyhow::Result<Vec<O>> {
        self(inputs)
    }
}
