//! # Recompression - Run-Length Straight-Line Programs
//!
//! Builds a run-length straight-line program (RLSLP), a grammar deriving
//! exactly one text, with the recompression technique.
//!
//! The driver alternates two phases until one symbol remains:
//! 1. **Block compression**: every maximal run `a^d` becomes a block rule
//! 2. **Pair compression**: the alphabet is split in two sides and every
//!    adjacent (left, right) pair becomes a pair rule
//!
//! ## Example
//!
//! ```
//! use recompression_rs::Recompression;
//!
//! let mut recompression = Recompression::new();
//! let grammar = recompression.compress_bytes(b"abracadabra abracadabra").unwrap();
//!
//! // Decompresses the whole text or any substring
//! assert_eq!(grammar.derive_text(), "abracadabra abracadabra");
//! assert_eq!(grammar.extract(12, 5), "abrac");
//!
//! println!("Created {} rules", grammar.size());
//! ```
//!
//! ## Variants
//!
//! - [`Recompression::new`]: sequential, hash based rule deduplication
//! - [`Recompression::fast`]: sequential, dense per-symbol maps
//! - [`Recompression::parallel`]: fork-join over `cores` threads
//! - [`Recompression::local_search`] and [`Recompression::random`]:
//!   randomized partitions
//!
//! All deterministic variants produce identical grammars.
//!
//! ## Performance
//!
//! - Every round shrinks the text by a constant factor, so there are
//!   O(log n) rounds of linear work
//! - Extraction of `len` symbols costs O(len + depth)

mod adjacency;
mod alphabet;
mod bcomp;
mod dedup;
mod error;
mod iter;
mod parallel;
mod partition;
mod pcomp;
mod recompression;
mod rlslp;
mod symbol;

#[cfg(test)]
mod tests;

pub use adjacency::{Adjacency, AdjacencyMultiset, DirectedCounts};
pub use dedup::{Deduper, DenseDedup, HashDedup, Key, SortDedup};
pub use error::{RecompressionError, Result};
pub use iter::DeriveIter;
pub use parallel::Workers;
pub use partition::{greedy_sides, refine, GreedyCut, LocalSearch, Partition, PartitionStrategy, RandomCut};
pub use recompression::{recompress, Recompression, RecompressionConfig, RecompressionStats};
pub use rlslp::{NonTerminal, Rlslp, RlslpStats, RuleLayout};
pub use symbol::{Symbol, BYTE_ALPHABET, DELETED};
