//! Chunked data-parallel helpers shared by the compression phases.
//!
//! With a single core no thread pool is built and every helper runs the
//! closure once over the whole input, so the sequential variants pay no
//! synchronization cost.

use crate::error::{RecompressionError, Result};
use crate::symbol::{Symbol, DELETED};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::ops::Range;

/// Worker handle owning the thread pool of one compressor.
pub struct Workers {
    pool: Option<ThreadPool>,
    cores: usize,
}

impl Workers {
    pub fn new(cores: usize) -> Result<Self> {
        if cores == 0 {
            return Err(RecompressionError::NoCores);
        }
        let pool = if cores > 1 {
            Some(ThreadPoolBuilder::new().num_threads(cores).build()?)
        } else {
            None
        };
        Ok(Self { pool, cores })
    }

    pub fn sequential() -> Self {
        Self {
            pool: None,
            cores: 1,
        }
    }

    pub fn cores(&self) -> usize {
        self.cores
    }

    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Splits `0..n` into one contiguous range per core.
    ///
    /// Ranges differ in length by at most one and may be empty.
    pub fn chunk_bounds(&self, n: usize) -> Vec<Range<usize>> {
        let base = n / self.cores;
        let extra = n % self.cores;
        let mut start = 0;
        (0..self.cores)
            .map(|i| {
                let end = start + base + usize::from(i < extra);
                let range = start..end;
                start = end;
                range
            })
            .collect()
    }

    /// Runs `f` on each chunk of `0..n`; results come back in chunk order.
    pub fn map_chunks<T, F>(&self, n: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(Range<usize>) -> T + Sync,
    {
        match &self.pool {
            None => vec![f(0..n)],
            Some(pool) => {
                let bounds = self.chunk_bounds(n);
                pool.install(|| bounds.into_par_iter().map(&f).collect())
            }
        }
    }

    /// Runs `f(offset, chunk)` on disjoint mutable chunks of `data`.
    pub fn for_each_chunk_mut<T, F>(&self, data: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync,
    {
        match &self.pool {
            None => f(0, data),
            Some(pool) => {
                let chunk_size = data.len().div_ceil(self.cores).max(1);
                pool.install(|| {
                    data.par_chunks_mut(chunk_size)
                        .enumerate()
                        .for_each(|(i, chunk)| f(i * chunk_size, chunk))
                });
            }
        }
    }

    /// Runs `op` inside the pool so nested rayon calls use its threads.
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            None => op(),
            Some(pool) => pool.install(op),
        }
    }
}

/// Concatenates per-chunk buffers.
///
/// In parallel mode the target offsets are a prefix sum of the buffer
/// lengths and every buffer is copied by its own worker.
pub(crate) fn concat<T>(workers: &Workers, parts: Vec<Vec<T>>) -> Vec<T>
where
    T: Copy + Default + Send + Sync,
{
    if parts.len() == 1 || !workers.is_parallel() {
        return parts.into_iter().flatten().collect();
    }
    let total = parts.iter().map(Vec::len).sum();
    let mut out = vec![T::default(); total];

    let mut slices = Vec::with_capacity(parts.len());
    let mut rest = out.as_mut_slice();
    for part in &parts {
        let (head, tail) = rest.split_at_mut(part.len());
        slices.push(head);
        rest = tail;
    }
    workers.install(|| {
        slices
            .into_par_iter()
            .zip(parts.par_iter())
            .for_each(|(dst, src)| dst.copy_from_slice(src))
    });
    out
}

/// Removes every `DELETED` slot from `text`, keeping order.
pub(crate) fn compact(workers: &Workers, text: &mut Vec<Symbol>) {
    if !workers.is_parallel() {
        text.retain(|&s| s != DELETED);
        return;
    }
    let kept = workers.map_chunks(text.len(), |range| {
        text[range]
            .iter()
            .copied()
            .filter(|&s| s != DELETED)
            .collect::<Vec<_>>()
    });
    *text = concat(workers, kept);
}
