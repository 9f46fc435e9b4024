//! Block compression: replaces maximal runs of one symbol by block rules.

use crate::alphabet::AlphabetContext;
use crate::dedup::{Deduper, Key};
use crate::error::Result;
use crate::parallel::{compact, concat, Workers};
use crate::rlslp::Rlslp;
use crate::symbol::{Symbol, DELETED};
use log::trace;

/// A maximal run of length at least 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Run {
    pub start: usize,
    pub len: Symbol,
}

impl Run {
    fn end(&self) -> usize {
        self.start + self.len as usize
    }
}

/// Finds the runs starting inside `range`.
///
/// A run belongs to the chunk holding its first character; it may extend
/// past the end of the chunk, and a chunk skips the tail of a run that
/// started before it.
pub(crate) fn find_runs(text: &[Symbol], range: std::ops::Range<usize>) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut i = range.start;
    if i > 0 {
        while i < range.end && text[i] == text[i - 1] {
            i += 1;
        }
    }
    while i < range.end {
        let symbol = text[i];
        let mut j = i + 1;
        while j < text.len() && text[j] == symbol {
            j += 1;
        }
        if j - i > 1 {
            runs.push(Run {
                start: i,
                len: (j - i) as Symbol,
            });
        }
        i = j;
    }
    runs
}

/// Replaces every run of the compact `text` by a block rule.
///
/// One rule is created per distinct `(symbol, run length)`, in ascending
/// key order. New symbols are registered in `alphabet`; the caller is
/// expected to renumber afterwards. Returns the number of created rules.
pub(crate) fn bcomp<D: Deduper>(
    workers: &Workers,
    dedup: &mut D,
    text: &mut Vec<Symbol>,
    grammar: &mut Rlslp,
    alphabet: &mut AlphabetContext,
) -> Result<usize> {
    if text.len() < 2 {
        return Ok(0);
    }

    let view: &[Symbol] = text;
    let local_runs = workers.map_chunks(view.len(), |range| find_runs(view, range));
    let runs = concat(workers, local_runs);
    if runs.is_empty() {
        return Ok(0);
    }

    let local_keys = workers.map_chunks(runs.len(), |range| {
        runs[range]
            .iter()
            .map(|run| (view[run.start], run.len))
            .collect::<Vec<Key>>()
    });
    let keys = concat(workers, local_keys);
    let distinct = dedup.assign(workers, &keys, alphabet.size());

    let first = grammar.reserve(distinct.len())?;
    let real_keys: Vec<Key> = distinct
        .iter()
        .map(|&(symbol, count)| (alphabet.real(symbol), count))
        .collect();
    grammar.extend_blocks(&real_keys);

    let base = alphabet.size();
    for k in 0..distinct.len() {
        alphabet.push_rule(first + k as Symbol);
    }

    let dedup = &*dedup;
    workers.for_each_chunk_mut(text, |offset, chunk| {
        let end = offset + chunk.len();
        let from = runs.partition_point(|run| run.end() <= offset);
        for (run, &key) in runs[from..]
            .iter()
            .zip(&keys[from..])
            .take_while(|(run, _)| run.start < end)
        {
            for p in run.start.max(offset)..run.end().min(end) {
                chunk[p - offset] = if p == run.start {
                    base + dedup.rank(key)
                } else {
                    DELETED
                };
            }
        }
    });
    compact(workers, text);
    debug_assert!(!text.contains(&DELETED));

    trace!(
        "bcomp: {} runs, {} block rules, text length {}",
        runs.len(),
        distinct.len(),
        text.len()
    );
    Ok(distinct.len())
}
