//! Pair compression: replaces every `(left, right)` occurrence selected by
//! a partition with a pair rule.

use crate::adjacency::AdjacencyMultiset;
use crate::alphabet::AlphabetContext;
use crate::dedup::{Deduper, Key};
use crate::error::Result;
use crate::parallel::{compact, concat, Workers};
use crate::partition::{Partition, PartitionStrategy};
use crate::rlslp::Rlslp;
use crate::symbol::{Symbol, DELETED};
use log::trace;

/// Positions `i` in `range` where `text[i], text[i + 1]` is a match.
///
/// The right symbol of a match is never left, so matches cannot overlap
/// and chunks need no coordination at their borders.
pub(crate) fn find_pairs(text: &[Symbol], partition: &Partition, range: std::ops::Range<usize>) -> Vec<usize> {
    range
        .filter(|&i| i + 1 < text.len() && partition.is_match(text[i], text[i + 1]))
        .collect()
}

/// Partitions the compact alphabet and replaces all matched pairs.
///
/// Returns the number of created rules.
pub(crate) fn pcomp<D: Deduper, P: PartitionStrategy>(
    workers: &Workers,
    dedup: &mut D,
    partitioner: &mut P,
    text: &mut Vec<Symbol>,
    grammar: &mut Rlslp,
    alphabet: &mut AlphabetContext,
) -> Result<usize> {
    if text.len() < 2 {
        return Ok(0);
    }

    let view: &[Symbol] = text;
    let partition = {
        let adjacency = AdjacencyMultiset::from_text(workers, view);
        partitioner.partition(workers, &adjacency, alphabet.size())
    };

    let local_positions = workers.map_chunks(view.len(), |range| find_pairs(view, &partition, range));
    let positions = concat(workers, local_positions);
    debug_assert!(!positions.is_empty());

    let local_keys = workers.map_chunks(positions.len(), |range| {
        positions[range]
            .iter()
            .map(|&p| (view[p], view[p + 1]))
            .collect::<Vec<Key>>()
    });
    let keys = concat(workers, local_keys);
    let distinct = dedup.assign(workers, &keys, alphabet.size());

    let first = grammar.reserve(distinct.len())?;
    let real_keys: Vec<Key> = distinct
        .iter()
        .map(|&(left, right)| (alphabet.real(left), alphabet.real(right)))
        .collect();
    grammar.extend_pairs(&real_keys);

    let base = alphabet.size();
    for k in 0..distinct.len() {
        alphabet.push_rule(first + k as Symbol);
    }

    let dedup = &*dedup;
    workers.for_each_chunk_mut(text, |offset, chunk| {
        let end = offset + chunk.len();
        let from = positions.partition_point(|&p| p + 1 < offset);
        for (&p, &key) in positions[from..]
            .iter()
            .zip(&keys[from..])
            .take_while(|&(&p, _)| p < end)
        {
            if p >= offset {
                chunk[p - offset] = base + dedup.rank(key);
            }
            if p + 1 >= offset && p + 1 < end {
                chunk[p + 1 - offset] = DELETED;
            }
        }
    });
    compact(workers, text);
    debug_assert!(!text.contains(&DELETED));

    trace!(
        "pcomp: {} pairs, {} pair rules, text length {}",
        positions.len(),
        distinct.len(),
        text.len()
    );
    Ok(distinct.len())
}
