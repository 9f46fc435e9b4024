//! Symbols of the text and of the grammar.

/// A terminal or non-terminal symbol.
///
/// Symbols below the terminal count are terminals. Every other symbol
/// `s` names the production at index `s - terminals`.
pub type Symbol = u32;

/// Marks a text slot that was logically removed and awaits compaction.
///
/// Never a valid symbol: rule creation stops one below it.
pub const DELETED: Symbol = Symbol::MAX;

/// Terminal count used for raw byte input.
pub const BYTE_ALPHABET: u64 = 256;

/// Renders a terminal as a character.
///
/// Bytes map to their Latin-1 character, larger values to the Unicode
/// scalar with that value or U+FFFD if there is none.
pub(crate) fn terminal_char(symbol: Symbol) -> char {
    char::from_u32(symbol).unwrap_or(char::REPLACEMENT_CHARACTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_char() {
        assert_eq!(terminal_char(b'a' as Symbol), 'a');
        assert_eq!(terminal_char(0xE9), 'é');
        assert_eq!(terminal_char(0xD800), char::REPLACEMENT_CHARACTER);
    }
}
