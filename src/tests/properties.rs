use super::{greedy_round_bound, init_logger};
use crate::dedup::{HashDedup, SortDedup};
use crate::partition::{GreedyCut, LocalSearch, RandomCut};
use crate::recompression::{Recompression, RecompressionConfig};
use crate::rlslp::Rlslp;
use crate::symbol::Symbol;
use proptest::prelude::*;

fn symbols(input: &[u8]) -> Vec<Symbol> {
    input.iter().map(|&b| Symbol::from(b)).collect()
}

fn creation_order(input: &[u8]) -> Rlslp {
    let config = RecompressionConfig::default().with_rename_rules(false);
    let mut recompression =
        Recompression::with_strategies(config, HashDedup::default(), HashDedup::default(), GreedyCut::new())
            .unwrap();
    recompression.compress_bytes(input).unwrap()
}

/// Checks the stored length of every rule against its right-hand side.
fn lengths_consistent(grammar: &Rlslp) -> bool {
    let terminals = grammar.terminals();
    grammar.non_terminals().iter().enumerate().all(|(i, nt)| {
        let symbol = (terminals + i as u64) as Symbol;
        let expected = if grammar.is_block(symbol) {
            grammar.len_of(nt.first) * u64::from(nt.count())
        } else {
            grammar.len_of(nt.first) + grammar.len_of(nt.second)
        };
        nt.len == expected
    })
}

proptest! {
    /// Property 1: Roundtrip fidelity
    /// The derived text must exactly match the input.
    #[test]
    fn prop_roundtrip(input: Vec<u8>) {
        let grammar = Recompression::new().compress_bytes(&input).unwrap();

        prop_assert_eq!(grammar.derive(), symbols(&input));
        prop_assert_eq!(grammar.text_len(), input.len() as u64);
        prop_assert_eq!(grammar.is_empty(), input.is_empty());
    }

    /// Property 2: Roundtrip on small alphabets
    /// Few distinct symbols produce long runs and deep grammars.
    #[test]
    fn prop_roundtrip_small_alphabet(input in prop::collection::vec(0u8..3, 0..2000)) {
        let grammar = Recompression::new().compress_bytes(&input).unwrap();
        prop_assert_eq!(grammar.derive(), symbols(&input));
    }

    /// Property 3: Extraction agrees with full derivation
    /// Ranges running past the end are clamped.
    #[test]
    fn prop_extract_matches_substring(
        input in prop::collection::vec(0u8..4, 0..300),
        i in 0u64..350,
        len in 0u64..350,
    ) {
        let grammar = Recompression::new().compress_bytes(&input).unwrap();
        let text = symbols(&input);

        let start = (i as usize).min(text.len());
        let end = (i.saturating_add(len) as usize).min(text.len());
        prop_assert_eq!(grammar.extract_symbols(i, len), text[start..end].to_vec());
    }

    /// Property 4: Acyclicity
    /// In creation order every rule only references earlier symbols.
    #[test]
    fn prop_acyclic(input: Vec<u8>) {
        let grammar = creation_order(&input);

        prop_assert!(grammar.is_topologically_sorted());
        prop_assert!(grammar.references_valid());
        prop_assert!(lengths_consistent(&grammar));
    }

    /// Property 5: Renaming keeps the grammar valid
    #[test]
    fn prop_renamed_grammar_valid(input: Vec<u8>) {
        let grammar = Recompression::new().compress_bytes(&input).unwrap();

        prop_assert!(grammar.references_valid());
        prop_assert!(lengths_consistent(&grammar));
        let boundary = grammar.block_boundary();
        for i in 0..grammar.size() {
            prop_assert_eq!(grammar.is_block((256 + i) as Symbol), i >= boundary);
        }
        prop_assert_eq!(grammar.block_count(), grammar.size() - boundary);
    }

    /// Property 6: Termination bound
    /// The text shrinks every round and the greedy partition needs only
    /// logarithmically many rounds.
    #[test]
    fn prop_termination(input in prop::collection::vec(any::<u8>(), 1..3000)) {
        let mut recompression = Recompression::new();
        recompression.compress_bytes(&input).unwrap();
        let stats = recompression.last_stats().unwrap();

        prop_assert!(stats.text_lengths.windows(2).all(|w| w[1] < w[0]));
        prop_assert!(
            stats.rounds <= greedy_round_bound(input.len()),
            "{} rounds for {} symbols",
            stats.rounds,
            input.len()
        );
    }

    /// Property 7: Local search still derives the input
    #[test]
    fn prop_local_search_roundtrip(
        input in prop::collection::vec(0u8..6, 0..800),
        rounds in 1usize..=3,
        seed: u64,
        cores in 1usize..4,
    ) {
        init_logger();
        let config = RecompressionConfig::default().with_cores(cores);
        let mut recompression = Recompression::with_strategies(
            config,
            SortDedup::default(),
            SortDedup::default(),
            LocalSearch::with_seed(rounds, seed),
        )
        .unwrap();
        let grammar = recompression.compress_bytes(&input).unwrap();

        prop_assert_eq!(grammar.derive(), symbols(&input));
        let stats = recompression.last_stats().unwrap();
        prop_assert!(stats.text_lengths.windows(2).all(|w| w[1] < w[0]));
    }

    /// Property 8: Random cuts still derive the input
    #[test]
    fn prop_random_cut_roundtrip(
        input in prop::collection::vec(0u8..6, 0..800),
        trials in 1usize..4,
        seed: u64,
    ) {
        let config = RecompressionConfig::default().with_cores(2);
        let mut recompression = Recompression::with_strategies(
            config,
            HashDedup::default(),
            SortDedup::default(),
            RandomCut::with_seed(trials, seed),
        )
        .unwrap();
        let grammar = recompression.compress_bytes(&input).unwrap();

        prop_assert_eq!(grammar.derive(), symbols(&input));
    }
}

/// Bolero fuzz test: No panics on arbitrary input
#[cfg(test)]
#[test]
fn fuzz_no_panic() {
    bolero::check!().with_type::<Vec<u8>>().for_each(|input| {
        let grammar = Recompression::new().compress_bytes(input).unwrap();

        // Verify basic operations don't panic
        let _ = grammar.stats();
        let _ = grammar.to_string();
        let count = grammar.iter().count();
        assert_eq!(count, input.len());

        // Roundtrip should work
        assert_eq!(grammar.derive(), symbols(input));
    });
}

/// Bolero fuzz test: Parallel and sequential runs derive the same text
#[cfg(test)]
#[test]
fn fuzz_parallel_agrees() {
    bolero::check!()
        .with_type::<Vec<u8>>()
        .for_each(|input| {
            let sequential = Recompression::fast().compress_bytes(input).unwrap();
            let parallel = Recompression::parallel(3).unwrap().compress_bytes(input).unwrap();

            assert_eq!(sequential.derive(), parallel.derive());
            assert!(parallel.references_valid());
        });
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_text_with_long_runs() {
        let mut input = Vec::new();
        for (i, run) in [1usize, 500, 2, 70_000, 3, 1].iter().enumerate() {
            input.extend(std::iter::repeat(b'a' + i as u8 % 2).take(*run));
        }
        let grammar = Recompression::new().compress_bytes(&input).unwrap();
        assert_eq!(grammar.derive(), symbols(&input));
        assert_eq!(grammar.extract_symbols(600, 3), symbols(&input[600..603]));
    }

    #[test]
    fn test_nested_repetition() {
        let input = "abcabcabcabc".repeat(20);
        let grammar = Recompression::new().compress_bytes(input.as_bytes()).unwrap();

        assert_eq!(grammar.derive_text(), input);
        assert!(grammar.size() < 20, "created {} rules", grammar.size());
    }

    #[test]
    fn test_all_byte_values() {
        let input: Vec<u8> = (0..=255).chain((0..=255).rev()).collect();
        let grammar = Recompression::parallel(4).unwrap().compress_bytes(&input).unwrap();
        assert_eq!(grammar.derive(), symbols(&input));
        assert_eq!(grammar.text_len(), 512);
    }
}
