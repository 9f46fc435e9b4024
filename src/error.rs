use crate::symbol::Symbol;
use thiserror::Error;

/// Errors surfaced by the recompression driver.
///
/// Configuration, capacity and malformed-grammar problems are reported
/// here. Phase functions have no runtime failure modes on well-formed input.
#[derive(Error, Debug)]
pub enum RecompressionError {
    #[error("symbol {symbol} at position {position} is outside the alphabet of size {alphabet_size}")]
    SymbolOutOfRange {
        symbol: Symbol,
        position: usize,
        alphabet_size: u64,
    },
    #[error("alphabet of size {alphabet_size} does not fit the 32-bit symbol space")]
    AlphabetTooLarge { alphabet_size: u64 },
    #[error("at least one core is required")]
    NoCores,
    #[error("symbol space exhausted: {requested} symbols requested")]
    SymbolSpaceExhausted { requested: u64 },
    #[error("text of length {len} cannot be indexed by 32-bit symbols")]
    TextTooLong { len: usize },
    #[error("symbol {symbol} is not defined before rule {bound}")]
    InvalidReference { symbol: Symbol, bound: u64 },
    #[error("block repetition count {count} is below 2")]
    InvalidBlockCount { count: Symbol },
    #[error("block boundary {boundary} exceeds the {rules} rules of the grammar")]
    InvalidBlockBoundary { boundary: usize, rules: usize },
    #[error("rule {symbol} derives itself")]
    CyclicRule { symbol: Symbol },
    #[error("rule {symbol} stores length {stored}, which its body does not derive")]
    LengthMismatch { symbol: Symbol, stored: u64 },
    #[error("could not build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, RecompressionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_values() {
        let err = RecompressionError::SymbolOutOfRange {
            symbol: 300,
            position: 7,
            alphabet_size: 256,
        };
        let msg = err.to_string();
        assert!(msg.contains("300"));
        assert!(msg.contains("position 7"));
        assert!(msg.contains("256"));

        let err = RecompressionError::SymbolSpaceExhausted { requested: 1 << 33 };
        assert!(err.to_string().contains("exhausted"));

        let err = RecompressionError::InvalidReference { symbol: 257, bound: 256 };
        assert_eq!(err.to_string(), "symbol 257 is not defined before rule 256");
    }
}
