//! Dense renumbering of the symbols present in the working text.
//!
//! The driver keeps the text over a compact alphabet `[0, size)`. The
//! context maps every compact symbol back to its grammar symbol, which is
//! what new rules reference.

use crate::error::{RecompressionError, Result};
use crate::parallel::Workers;
use crate::symbol::{Symbol, DELETED};
use std::sync::atomic::{AtomicBool, Ordering};

/// Compact alphabet of the working text, owned by the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AlphabetContext {
    /// `mapping[c]` is the grammar symbol of compact symbol `c`.
    mapping: Vec<Symbol>,
}

impl AlphabetContext {
    /// Validates `text` against `alphabet_size` and renumbers it to the
    /// dense range of symbols it actually uses.
    pub fn from_text(workers: &Workers, text: &mut [Symbol], alphabet_size: u64) -> Result<Self> {
        if alphabet_size > u64::from(DELETED) {
            return Err(RecompressionError::AlphabetTooLarge { alphabet_size });
        }
        if text.len() >= DELETED as usize {
            return Err(RecompressionError::TextTooLong { len: text.len() });
        }
        if let Some(position) = first_out_of_range(workers, text, alphabet_size) {
            return Err(RecompressionError::SymbolOutOfRange {
                symbol: text[position],
                position,
                alphabet_size,
            });
        }

        let used = used_symbols(workers, text, alphabet_size as usize);
        let mapping = renumber(workers, text, &used, |s| s as Symbol);
        Ok(Self { mapping })
    }

    /// Number of compact symbols.
    pub fn size(&self) -> Symbol {
        self.mapping.len() as Symbol
    }

    /// Grammar symbol of a compact symbol.
    pub fn real(&self, compact: Symbol) -> Symbol {
        self.mapping[compact as usize]
    }

    #[cfg(test)]
    pub fn mapping(&self) -> &[Symbol] {
        &self.mapping
    }

    /// Registers a freshly created grammar symbol and returns its compact id.
    pub fn push_rule(&mut self, real: Symbol) -> Symbol {
        let compact = self.size();
        self.mapping.push(real);
        compact
    }

    /// Drops compact symbols no longer present in `text` and rewrites
    /// `text` through the rank table of the survivors.
    pub fn realphabet(&mut self, workers: &Workers, text: &mut [Symbol]) {
        let used = used_symbols(workers, text, self.mapping.len());
        let mapping = &self.mapping;
        self.mapping = renumber(workers, text, &used, |s| mapping[s]);
    }
}

/// Position of the first symbol not below `alphabet_size`.
fn first_out_of_range(workers: &Workers, text: &[Symbol], alphabet_size: u64) -> Option<usize> {
    workers
        .map_chunks(text.len(), |range| {
            let start = range.start;
            text[range]
                .iter()
                .position(|&s| u64::from(s) >= alphabet_size)
                .map(|i| start + i)
        })
        .into_iter()
        .flatten()
        .next()
}

/// Bitmap of the symbols of `[0, size)` occurring in `text`.
fn used_symbols(workers: &Workers, text: &[Symbol], size: usize) -> Vec<bool> {
    if !workers.is_parallel() {
        let mut used = vec![false; size];
        for &s in text {
            used[s as usize] = true;
        }
        return used;
    }
    let used: Vec<AtomicBool> = (0..size).map(|_| AtomicBool::new(false)).collect();
    workers.map_chunks(text.len(), |range| {
        for &s in &text[range] {
            used[s as usize].store(true, Ordering::Relaxed);
        }
    });
    used.into_iter().map(AtomicBool::into_inner).collect()
}

/// Rewrites `text` to the ranks of its symbols in `used` and returns the
/// new mapping, built from `real` for every used symbol.
fn renumber(
    workers: &Workers,
    text: &mut [Symbol],
    used: &[bool],
    real: impl Fn(usize) -> Symbol,
) -> Vec<Symbol> {
    let mut ranks = Vec::with_capacity(used.len());
    let mut mapping = Vec::new();
    for (s, &u) in used.iter().enumerate() {
        ranks.push(mapping.len() as Symbol);
        if u {
            mapping.push(real(s));
        }
    }
    if mapping.len() < used.len() {
        workers.for_each_chunk_mut(text, |_, chunk| {
            for s in chunk {
                *s = ranks[*s as usize];
            }
        });
    }
    mapping
}
