//! The recompression driver.
//!
//! Alternates block compression and pair compression on a working text
//! until a single symbol remains. After every phase the text is renumbered
//! to the dense alphabet of the symbols it still uses.
//!
//! # Example
//!
//! ```
//! use recompression_rs::Recompression;
//!
//! let mut recompression = Recompression::new();
//! let grammar = recompression.compress_bytes(b"abababababab").unwrap();
//!
//! assert_eq!(grammar.derive_text(), "abababababab");
//! assert_eq!(grammar.extract(3, 4), "baba");
//! ```

use crate::alphabet::AlphabetContext;
use crate::bcomp::bcomp;
use crate::dedup::{DenseDedup, Deduper, HashDedup, SortDedup};
use crate::error::Result;
use crate::parallel::Workers;
use crate::partition::{GreedyCut, LocalSearch, PartitionStrategy, RandomCut};
use crate::pcomp::pcomp;
use crate::rlslp::Rlslp;
use crate::symbol::{Symbol, BYTE_ALPHABET};
use log::{debug, info, trace};

/// Driver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecompressionConfig {
    /// Number of worker threads; 1 runs every phase sequentially.
    pub cores: usize,
    /// Move block rules behind pair rules once the grammar is finished.
    pub rename_rules: bool,
}

impl Default for RecompressionConfig {
    fn default() -> Self {
        Self {
            cores: 1,
            rename_rules: true,
        }
    }
}

impl RecompressionConfig {
    /// Uses every available core.
    pub fn all_cores() -> Self {
        Self::default().with_cores(num_cpus::get())
    }

    pub fn with_cores(mut self, cores: usize) -> Self {
        self.cores = cores;
        self
    }

    pub fn with_rename_rules(mut self, rename_rules: bool) -> Self {
        self.rename_rules = rename_rules;
        self
    }
}

/// Statistics about the last run of a driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecompressionStats {
    /// Length of the input text
    pub input_len: usize,
    /// Number of bcomp/pcomp rounds
    pub rounds: usize,
    /// Text length after each round
    pub text_lengths: Vec<usize>,
    /// Number of rules of the produced grammar
    pub productions: usize,
}

impl RecompressionStats {
    /// Returns the number of rules per input symbol as a percentage.
    pub fn compression_ratio(&self) -> f64 {
        if self.input_len == 0 {
            0.0
        } else {
            (self.productions as f64 / self.input_len as f64) * 100.0
        }
    }
}

/// Builds RLSLPs by recompression.
///
/// `B` deduplicates block keys, `Q` pair keys and `P` chooses the
/// partition of every pair compression phase.
pub struct Recompression<B = HashDedup, Q = HashDedup, P = GreedyCut> {
    config: RecompressionConfig,
    workers: Workers,
    blocks: B,
    pairs: Q,
    partitioner: P,
    stats: Option<RecompressionStats>,
}

impl Recompression {
    /// Sequential driver with hash deduplication and the greedy partition.
    pub fn new() -> Self {
        Self {
            config: RecompressionConfig::default(),
            workers: Workers::sequential(),
            blocks: HashDedup::default(),
            pairs: HashDedup::default(),
            partitioner: GreedyCut::new(),
            stats: None,
        }
    }
}

impl Default for Recompression {
    fn default() -> Self {
        Self::new()
    }
}

impl Recompression<DenseDedup, DenseDedup, GreedyCut> {
    /// Sequential driver deduplicating through per-symbol dense maps.
    pub fn fast() -> Self {
        Self {
            config: RecompressionConfig::default(),
            workers: Workers::sequential(),
            blocks: DenseDedup::default(),
            pairs: DenseDedup::default(),
            partitioner: GreedyCut::new(),
            stats: None,
        }
    }
}

impl Recompression<SortDedup, SortDedup, GreedyCut> {
    /// Parallel driver with sort-based deduplication.
    ///
    /// Ties between the two pair directions go to the one creating fewer
    /// rules.
    pub fn parallel(cores: usize) -> Result<Self> {
        Self::with_strategies(
            RecompressionConfig::default().with_cores(cores),
            SortDedup::default(),
            SortDedup::default(),
            GreedyCut::fewer_productions(),
        )
    }
}

impl Recompression<SortDedup, SortDedup, LocalSearch> {
    /// Parallel driver partitioning by randomized local search.
    pub fn local_search(cores: usize, rounds: usize) -> Result<Self> {
        Self::with_strategies(
            RecompressionConfig::default().with_cores(cores),
            SortDedup::default(),
            SortDedup::default(),
            LocalSearch::new(rounds),
        )
    }
}

impl Recompression<SortDedup, SortDedup, RandomCut> {
    /// Parallel driver keeping the best of `trials` random partitions.
    pub fn random(cores: usize, trials: usize) -> Result<Self> {
        Self::with_strategies(
            RecompressionConfig::default().with_cores(cores),
            SortDedup::default(),
            SortDedup::default(),
            RandomCut::new(trials),
        )
    }
}

impl<B: Deduper, Q: Deduper, P: PartitionStrategy> Recompression<B, Q, P> {
    /// Creates a driver from explicit strategies.
    ///
    /// Fails if `config.cores` is 0 or the thread pool cannot be built.
    pub fn with_strategies(config: RecompressionConfig, blocks: B, pairs: Q, partitioner: P) -> Result<Self> {
        let workers = Workers::new(config.cores)?;
        Ok(Self {
            config,
            workers,
            blocks,
            pairs,
            partitioner,
            stats: None,
        })
    }

    pub fn config(&self) -> &RecompressionConfig {
        &self.config
    }

    /// Statistics of the last successful run.
    pub fn last_stats(&self) -> Option<&RecompressionStats> {
        self.stats.as_ref()
    }

    /// Compresses raw bytes over the full byte alphabet.
    pub fn compress_bytes(&mut self, bytes: &[u8]) -> Result<Rlslp> {
        let text = bytes.iter().map(|&b| Symbol::from(b)).collect();
        self.compress(text, BYTE_ALPHABET)
    }

    /// Computes an RLSLP deriving `text`.
    ///
    /// Every symbol must be below `alphabet_size`, which becomes the
    /// terminal count of the grammar.
    pub fn compress(&mut self, text: Vec<Symbol>, alphabet_size: u64) -> Result<Rlslp> {
        let mut text = text;
        let mut stats = RecompressionStats {
            input_len: text.len(),
            ..Default::default()
        };
        let mut grammar = Rlslp::new(alphabet_size);
        let mut alphabet = AlphabetContext::from_text(&self.workers, &mut text, alphabet_size)?;
        debug!(
            "recompression: {} symbols, effective alphabet {}, {} cores",
            text.len(),
            alphabet.size(),
            self.workers.cores()
        );

        while text.len() > 1 {
            let before = text.len();
            let created = bcomp(
                &self.workers,
                &mut self.blocks,
                &mut text,
                &mut grammar,
                &mut alphabet,
            )?;
            alphabet.realphabet(&self.workers, &mut text);
            debug!(
                "round {}: bcomp {} -> {} symbols, {} block rules, alphabet {}",
                stats.rounds,
                before,
                text.len(),
                created,
                alphabet.size()
            );

            if text.len() > 1 {
                let before = text.len();
                let created = pcomp(
                    &self.workers,
                    &mut self.pairs,
                    &mut self.partitioner,
                    &mut text,
                    &mut grammar,
                    &mut alphabet,
                )?;
                alphabet.realphabet(&self.workers, &mut text);
                debug!(
                    "round {}: pcomp {} -> {} symbols, {} pair rules, alphabet {}",
                    stats.rounds,
                    before,
                    text.len(),
                    created,
                    alphabet.size()
                );
            }

            debug_assert!(text.len() < before);
            stats.rounds += 1;
            stats.text_lengths.push(text.len());
        }

        if let Some(&last) = text.first() {
            grammar.set_root(alphabet.real(last));
            if self.config.rename_rules {
                grammar.rename_rules_with(&self.workers);
                trace!("renamed rules, block boundary {}", grammar.block_boundary());
            }
        }
        debug_assert!(grammar.references_valid());

        stats.productions = grammar.size();
        info!(
            "recompression finished: {} symbols, {} productions ({} blocks), {} rounds",
            stats.input_len,
            stats.productions,
            grammar.block_count(),
            stats.rounds
        );
        self.stats = Some(stats);
        Ok(grammar)
    }
}

/// Compresses `text` with the sequential driver for one core and the
/// parallel driver otherwise.
pub fn recompress(text: Vec<Symbol>, alphabet_size: u64, cores: usize) -> Result<Rlslp> {
    if cores == 1 {
        Recompression::new().compress(text, alphabet_size)
    } else {
        Recompression::parallel(cores)?.compress(text, alphabet_size)
    }
}
