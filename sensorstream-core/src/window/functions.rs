use super::*;

/// Incremental aggregation function.
///
/// The accumulator is updated on each incoming element, so only `O(1)` state
/// is kept per `(window, group)` instead of the element list.
pub trait AggregateFunction<IN, ACC, OUT>: Send {
    /// Create a fresh accumulator for a new group.
    fn create_accumulator(&self) -> ACC;
    /// Fold one element into the accumulator.
    fn add(&self, acc: &mut ACC, element: &IN);
    /// Convert the final accumulator into the result.
    fn get_result(&self, acc: ACC) -> OUT;
    /// Merge two accumulators.
    fn merge(&self, acc: &mut ACC, other: ACC);
}

/// Running `{count, sum}` for a mean.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanAccumulator {
    pub count: u64,
    pub sum: f64,
}

/// Result of [`Mean`]: `mean = sum / count`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanResult {
    pub mean: f64,
    pub count: u64,
}

/// Arithmetic mean over `f64` samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl AggregateFunction<f64, MeanAccumulator, Option<MeanResult>> for Mean {
    fn create_accumulator(&self) -> MeanAccumulator {
        MeanAccumulator::default()
    }

    fn add(&self, acc: &mut MeanAccumulator, element: &f64) {
        acc.count += 1;
        acc.sum += *element;
    }

    /// `None` for an empty accumulator; an unobserved group never yields a row.
    fn get_result(&self, acc: MeanAccumulator) -> Option<MeanResult> {
        (acc.count > 0).then(|| MeanResult {
            mean: acc.sum / acc.count as f64,
            count: acc.count,
        })
    }

    fn merge(&self, acc: &mut MeanAccumulator, other: MeanAccumulator) {
        acc.count += other.count;
        acc.sum += other.sum;
    }
}
