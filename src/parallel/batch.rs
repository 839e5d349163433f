//! Batch distribution for parallel simulation.
//!
//! Monte Carlo trials are split into a fixed number of batches so that each
//! batch can own a random stream; the split never depends on thread count.

use rayon::prelude::*;

use crate::parallel::pool::WorkerPool;

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; later batches may be smaller.
///
/// # Example
/// ```
/// # use spacebattle::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + if i < remainder { 1 } else { 0 };
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Runs `work(batch_index, start, end)` for every batch on `pool` and
/// returns the results in batch order.
pub fn run_batches<T, F>(total: usize, num_batches: usize, pool: &WorkerPool, work: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize, usize, usize) -> T + Sync + Send,
{
    let ranges = batch_ranges(total, num_batches);
    pool.install(|| {
        ranges
            .par_iter()
            .enumerate()
            .map(|(index, &(start, end))| work(index, start, end))
            .collect()
    })
}
