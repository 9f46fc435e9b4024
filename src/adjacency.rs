//! The multiset of adjacent symbol pairs of the working text.

use crate::parallel::{concat, Workers};
use crate::symbol::Symbol;
use rayon::prelude::*;

/// One occurrence of two adjacent, unequal symbols.
///
/// Ordered by `larger`, then `smaller`, then orientation, so equal
/// directed pairs are consecutive in a sorted multiset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Adjacency {
    pub larger: Symbol,
    pub smaller: Symbol,
    /// True if `larger` occurred on the left.
    pub larger_left: bool,
}

impl Adjacency {
    pub fn new(left: Symbol, right: Symbol) -> Self {
        if left > right {
            Self {
                larger: left,
                smaller: right,
                larger_left: true,
            }
        } else {
            Self {
                larger: right,
                smaller: left,
                larger_left: false,
            }
        }
    }

    /// The pair in text order.
    pub fn directed(&self) -> (Symbol, Symbol) {
        if self.larger_left {
            (self.larger, self.smaller)
        } else {
            (self.smaller, self.larger)
        }
    }
}

/// Pair counts across a bipartition, split by direction.
///
/// `lr` counts pairs from a `false` symbol to a `true` symbol, `rl` the
/// reverse. The `distinct_` fields count distinct directed pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectedCounts {
    pub lr: usize,
    pub rl: usize,
    pub distinct_lr: usize,
    pub distinct_rl: usize,
}

impl std::ops::Add for DirectedCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            lr: self.lr + other.lr,
            rl: self.rl + other.rl,
            distinct_lr: self.distinct_lr + other.distinct_lr,
            distinct_rl: self.distinct_rl + other.distinct_rl,
        }
    }
}

/// Sorted multiset of the adjacencies of a text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyMultiset {
    entries: Vec<Adjacency>,
}

impl AdjacencyMultiset {
    /// Collects one entry per adjacent unequal pair of `text`.
    pub fn from_text(workers: &Workers, text: &[Symbol]) -> Self {
        let pairs = text.len().saturating_sub(1);
        let local = workers.map_chunks(pairs, |range| {
            range
                .filter(|&i| text[i] != text[i + 1])
                .map(|i| Adjacency::new(text[i], text[i + 1]))
                .collect::<Vec<_>>()
        });
        let mut entries = concat(workers, local);
        if workers.is_parallel() {
            workers.install(|| entries.par_sort_unstable());
        } else {
            entries.sort_unstable();
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[Adjacency] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries grouped by their larger symbol, in increasing order.
    pub fn groups(&self) -> impl Iterator<Item = &[Adjacency]> {
        self.entries.chunk_by(|a, b| a.larger == b.larger)
    }

    /// Counts the pairs crossing the bipartition `sides` in each direction.
    pub fn directed_counts(&self, workers: &Workers, sides: &[bool]) -> DirectedCounts {
        let entries = &self.entries;
        workers
            .map_chunks(entries.len(), |range| {
                let mut counts = DirectedCounts::default();
                for i in range {
                    let (left, right) = entries[i].directed();
                    let fresh = i == 0 || entries[i] != entries[i - 1];
                    match (sides[left as usize], sides[right as usize]) {
                        (false, true) => {
                            counts.lr += 1;
                            counts.distinct_lr += usize::from(fresh);
                        }
                        (true, false) => {
                            counts.rl += 1;
                            counts.distinct_rl += usize::from(fresh);
                        }
                        _ => {}
                    }
                }
                counts
            })
            .into_iter()
            .fold(DirectedCounts::default(), |acc, c| acc + c)
    }

    /// Number of entries whose symbols lie on different sides.
    pub fn cut_size(&self, workers: &Workers, sides: &[bool]) -> usize {
        let entries = &self.entries;
        workers
            .map_chunks(entries.len(), |range| {
                entries[range]
                    .iter()
                    .filter(|e| sides[e.larger as usize] != sides[e.smaller as usize])
                    .count()
            })
            .into_iter()
            .sum()
    }
}
