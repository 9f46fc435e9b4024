//! Strategies for turning occurrence keys into distinct rule ids.
//!
//! Block keys are `(symbol, run length)` and pair keys are `(left, right)`,
//! so one trait serves both compressors. Every strategy hands out ids in
//! ascending key order, which makes the produced grammar independent of
//! both the strategy and the number of cores.

use crate::parallel::{concat, Workers};
use crate::symbol::Symbol;
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Occurrence key of a block or pair.
pub type Key = (Symbol, Symbol);

/// Assigns dense ids to distinct keys.
pub trait Deduper: Default + Send + Sync {
    /// Collects the distinct keys of `keys` in ascending order and prepares
    /// [`Deduper::rank`] for them.
    ///
    /// Every first component is below `alphabet_size`.
    fn assign(&mut self, workers: &Workers, keys: &[Key], alphabet_size: Symbol) -> Vec<Key>;

    /// Index of `key` in the list returned by the last `assign`.
    fn rank(&self, key: Key) -> Symbol;
}

/// Deduplication through a hash map.
///
/// Workers collect their keys into local sets that are merged afterwards.
#[derive(Debug, Default)]
pub struct HashDedup {
    ids: HashMap<Key, Symbol>,
}

impl Deduper for HashDedup {
    fn assign(&mut self, workers: &Workers, keys: &[Key], _alphabet_size: Symbol) -> Vec<Key> {
        let local_sets = workers.map_chunks(keys.len(), |range| {
            keys[range].iter().copied().collect::<HashSet<Key>>()
        });
        let mut merged = HashSet::new();
        for set in local_sets {
            if merged.is_empty() {
                merged = set;
            } else {
                merged.extend(set);
            }
        }

        let mut distinct: Vec<Key> = merged.into_iter().collect();
        sort_keys(workers, &mut distinct);

        self.ids.clear();
        self.ids.reserve(distinct.len());
        for (id, &key) in distinct.iter().enumerate() {
            self.ids.insert(key, id as Symbol);
        }
        distinct
    }

    fn rank(&self, key: Key) -> Symbol {
        self.ids[&key]
    }
}

/// Deduplication through one ordered map per first component.
///
/// Needs memory proportional to the alphabet but no sorting.
#[derive(Debug, Default)]
pub struct DenseDedup {
    ids: Vec<BTreeMap<Symbol, Symbol>>,
}

impl Deduper for DenseDedup {
    fn assign(&mut self, _workers: &Workers, keys: &[Key], alphabet_size: Symbol) -> Vec<Key> {
        self.ids.clear();
        self.ids.resize_with(alphabet_size as usize, BTreeMap::new);
        for &(first, second) in keys {
            self.ids[first as usize].insert(second, 0);
        }

        let mut distinct = Vec::new();
        for (first, seconds) in self.ids.iter_mut().enumerate() {
            for (&second, id) in seconds.iter_mut() {
                *id = distinct.len() as Symbol;
                distinct.push((first as Symbol, second));
            }
        }
        distinct
    }

    fn rank(&self, key: Key) -> Symbol {
        self.ids[key.0 as usize][&key.1]
    }
}

/// Deduplication by sorting all occurrences.
///
/// Distinct keys are the heads of equal runs in the sorted occurrence list;
/// ids are found again by binary search.
#[derive(Debug, Default)]
pub struct SortDedup {
    distinct: Vec<Key>,
}

impl Deduper for SortDedup {
    fn assign(&mut self, workers: &Workers, keys: &[Key], _alphabet_size: Symbol) -> Vec<Key> {
        let mut sorted = keys.to_vec();
        sort_keys(workers, &mut sorted);

        let heads = workers.map_chunks(sorted.len(), |range| {
            range
                .filter(|&i| i == 0 || sorted[i] != sorted[i - 1])
                .map(|i| sorted[i])
                .collect::<Vec<_>>()
        });
        self.distinct = concat(workers, heads);
        self.distinct.clone()
    }

    fn rank(&self, key: Key) -> Symbol {
        self.distinct.partition_point(|&k| k < key) as Symbol
    }
}

fn sort_keys(workers: &Workers, keys: &mut [Key]) {
    if workers.is_parallel() {
        workers.install(|| keys.par_sort_unstable());
    } else {
        keys.sort_unstable();
    }
}
