//! Deterministic parallel reduction.
//!
//! Work is split into chunks whose boundaries depend only on the number of
//! items, never on the thread count. Chunks run on the rayon pool, their
//! partial results are collected in chunk order and then combined through a
//! balanced pairwise tree. The floating point operations performed are
//! therefore identical for every pool size and every schedule.

use std::ops::Range;
use rayon::prelude::*;

/// Number of samples evaluated sequentially inside one chunk.
pub const SAMPLE_CHUNK_SIZE: usize = 4096;

/// Combine `items` pairwise, level by level: `((a+b)+(c+d))+e`.
pub fn pairwise_reduce<T>(mut items: Vec<T>, combine: impl Fn(T, T) -> T) -> Option<T> {
    while items.len() > 1 {
        let mut next = Vec::with_capacity(items.len().div_ceil(2));
        let mut iter = items.into_iter();
        while let Some(left) = iter.next() {
            match iter.next() {
                Some(right) => next.push(combine(left, right)),
                None => next.push(left),
            }
        }
        items = next;
    }
    items.pop()
}

/// Map every chunk of `0..total` in parallel and reduce the partials
/// deterministically. Returns `None` when `total` is zero.
pub fn chunked_map_reduce<T, M, C>(total: usize, chunk_size: usize, map: M, combine: C) -> Option<T>
where
    T: Send,
    M: Fn(Range<usize>) -> T + Sync + Send,
    C: Fn(T, T) -> T,
{
    let chunk_size = chunk_size.max(1);
    let partials: Vec<T> = (0..total.div_ceil(chunk_size))
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * chunk_size;
            map(start..(start + chunk_size).min(total))
        })
        .collect();
    pairwise_reduce(partials, combine)
}
