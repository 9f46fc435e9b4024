//! The run-length straight-line program produced by recompression.
//!
//! An RLSLP is a context-free grammar deriving exactly one string. Each
//! non-terminal is either a *pair* rule `X -> A B` or a *block* rule
//! `X -> A^d`. Rules are stored in one table; the global symbol of the
//! rule at index `i` is `terminals + i`.
//!
//! # Example
//!
//! ```
//! use recompression_rs::Rlslp;
//!
//! let mut g = Rlslp::new(256);
//! let ab = g.push_pair(b'a' as u32, b'b' as u32).unwrap();
//! let root = g.push_block(ab, 3).unwrap();
//! g.set_root(root);
//!
//! assert_eq!(g.derive_text(), "ababab");
//! assert_eq!(g.extract(1, 3), "bab");
//! ```

use crate::error::{RecompressionError, Result};
use crate::iter::DeriveIter;
use crate::parallel::Workers;
use crate::symbol::{terminal_char, Symbol, DELETED};
use std::fmt;

/// A production rule together with the length of the string it derives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NonTerminal {
    /// Left symbol of a pair, or the repeated symbol of a block.
    pub first: Symbol,
    /// Right symbol of a pair, or the repetition count of a block.
    pub second: Symbol,
    /// Length of the derived string.
    pub len: u64,
}

impl NonTerminal {
    pub fn new(first: Symbol, second: Symbol, len: u64) -> Self {
        Self { first, second, len }
    }

    /// Repetition count, meaningful for block rules only.
    pub fn count(&self) -> Symbol {
        self.second
    }
}

/// Order of the rules in the production table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleLayout {
    /// Rules appear in the order they were created. Every rule only
    /// references symbols created before it.
    #[default]
    CreationOrder,
    /// All pair rules first, then all block rules.
    BlocksLast,
}

/// A run-length straight-line program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rlslp {
    terminals: u64,
    non_terminals: Vec<NonTerminal>,
    /// One flag per rule, `true` for block rules.
    block_flags: Vec<bool>,
    root: Symbol,
    /// Number of block rules in creation order, index of the first block
    /// rule in the blocks-last layout.
    block_boundary: usize,
    is_empty: bool,
    layout: RuleLayout,
}

impl Rlslp {
    /// Creates an empty grammar over `terminals` terminal symbols.
    pub fn new(terminals: u64) -> Self {
        Self {
            terminals,
            non_terminals: Vec::new(),
            block_flags: Vec::new(),
            root: 0,
            block_boundary: 0,
            is_empty: true,
            layout: RuleLayout::CreationOrder,
        }
    }

    /// Rebuilds a finished grammar in the blocks-last layout.
    ///
    /// Rules `[0, block_boundary)` are pair rules, the rest block rules.
    /// The rules are checked the way [`Rlslp::push_pair`] and
    /// [`Rlslp::push_block`] check them, except that references may point
    /// forward as long as no rule derives itself. Stored lengths must match
    /// the lengths the rule bodies derive.
    pub fn from_blocks_last(
        terminals: u64,
        non_terminals: Vec<NonTerminal>,
        block_boundary: usize,
        root: Symbol,
    ) -> Result<Self> {
        if block_boundary > non_terminals.len() {
            return Err(RecompressionError::InvalidBlockBoundary {
                boundary: block_boundary,
                rules: non_terminals.len(),
            });
        }
        let block_flags = (0..non_terminals.len())
            .map(|i| i >= block_boundary)
            .collect();
        let grammar = Self {
            terminals,
            non_terminals,
            block_flags,
            root,
            block_boundary,
            is_empty: false,
            layout: RuleLayout::BlocksLast,
        };
        grammar.check_rules()?;
        Ok(grammar)
    }

    pub fn terminals(&self) -> u64 {
        self.terminals
    }

    pub fn root(&self) -> Symbol {
        self.root
    }

    pub fn non_terminals(&self) -> &[NonTerminal] {
        &self.non_terminals
    }

    pub fn block_boundary(&self) -> usize {
        self.block_boundary
    }

    pub fn layout(&self) -> RuleLayout {
        self.layout
    }

    /// Returns true if the grammar derives the empty string.
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// Number of production rules.
    pub fn size(&self) -> usize {
        self.non_terminals.len()
    }

    pub fn is_terminal(&self, symbol: Symbol) -> bool {
        u64::from(symbol) < self.terminals
    }

    /// Returns true if `symbol` names a block rule.
    pub fn is_block(&self, symbol: Symbol) -> bool {
        self.rule_index(symbol)
            .map(|i| self.block_flags[i])
            .unwrap_or(false)
    }

    /// Returns the rule for a non-terminal symbol.
    pub fn get(&self, symbol: Symbol) -> Option<&NonTerminal> {
        self.rule_index(symbol).map(|i| &self.non_terminals[i])
    }

    /// Length of the string derived by `symbol`; 0 for unknown symbols.
    pub fn len_of(&self, symbol: Symbol) -> u64 {
        if self.is_terminal(symbol) {
            1
        } else {
            self.get(symbol).map(|nt| nt.len).unwrap_or(0)
        }
    }

    /// Length of the derived text.
    pub fn text_len(&self) -> u64 {
        if self.is_empty {
            0
        } else {
            self.len_of(self.root)
        }
    }

    pub fn block_count(&self) -> usize {
        self.block_flags.iter().filter(|&&b| b).count()
    }

    pub fn pair_count(&self) -> usize {
        self.size() - self.block_count()
    }

    fn rule_index(&self, symbol: Symbol) -> Option<usize> {
        let symbol = u64::from(symbol);
        if symbol < self.terminals {
            return None;
        }
        let index = (symbol - self.terminals) as usize;
        (index < self.non_terminals.len()).then_some(index)
    }

    /// Global symbol the next created rule will receive.
    pub(crate) fn next_symbol(&self) -> u64 {
        self.terminals + self.non_terminals.len() as u64
    }

    /// Checks that `count` more rules fit below the sentinel and returns
    /// the symbol of the first one.
    pub(crate) fn reserve(&self, count: usize) -> Result<Symbol> {
        let first = self.next_symbol();
        let requested = first + count as u64;
        if requested > u64::from(DELETED) {
            return Err(RecompressionError::SymbolSpaceExhausted { requested });
        }
        Ok(first as Symbol)
    }

    // ========================================================================
    // Rule creation
    // ========================================================================

    /// Appends a block rule `symbol^count` and returns its symbol.
    ///
    /// `symbol` must already exist and `count` must be at least 2.
    pub fn push_block(&mut self, symbol: Symbol, count: Symbol) -> Result<Symbol> {
        let new = self.reserve(1)?;
        self.check_reference(symbol)?;
        if count < 2 {
            return Err(RecompressionError::InvalidBlockCount { count });
        }
        self.extend_blocks(&[(symbol, count)]);
        Ok(new)
    }

    /// Appends a pair rule `first second` and returns its symbol.
    ///
    /// Both symbols must already exist.
    pub fn push_pair(&mut self, first: Symbol, second: Symbol) -> Result<Symbol> {
        let new = self.reserve(1)?;
        self.check_reference(first)?;
        self.check_reference(second)?;
        self.extend_pairs(&[(first, second)]);
        Ok(new)
    }

    fn check_reference(&self, symbol: Symbol) -> Result<()> {
        let bound = self.next_symbol();
        if u64::from(symbol) >= bound {
            return Err(RecompressionError::InvalidReference { symbol, bound });
        }
        Ok(())
    }

    /// Appends one block rule per `(symbol, count)` key.
    ///
    /// Capacity must have been checked with [`Rlslp::reserve`].
    pub(crate) fn extend_blocks(&mut self, keys: &[(Symbol, Symbol)]) {
        debug_assert_eq!(self.layout, RuleLayout::CreationOrder);
        self.non_terminals.reserve(keys.len());
        for &(symbol, count) in keys {
            debug_assert!(u64::from(symbol) < self.next_symbol());
            let len = self.len_of(symbol) * u64::from(count);
            self.non_terminals.push(NonTerminal::new(symbol, count, len));
        }
        self.block_flags.resize(self.non_terminals.len(), true);
        self.block_boundary += keys.len();
    }

    /// Appends one pair rule per `(first, second)` key.
    pub(crate) fn extend_pairs(&mut self, keys: &[(Symbol, Symbol)]) {
        debug_assert_eq!(self.layout, RuleLayout::CreationOrder);
        self.non_terminals.reserve(keys.len());
        for &(first, second) in keys {
            debug_assert!(u64::from(first) < self.next_symbol());
            debug_assert!(u64::from(second) < self.next_symbol());
            let len = self.len_of(first) + self.len_of(second);
            self.non_terminals.push(NonTerminal::new(first, second, len));
        }
        self.block_flags.resize(self.non_terminals.len(), false);
    }

    /// Sets the root symbol, marking the grammar as non-empty.
    pub fn set_root(&mut self, root: Symbol) {
        self.root = root;
        self.is_empty = false;
    }

    // ========================================================================
    // Renaming
    // ========================================================================

    /// Moves all block rules behind all pair rules.
    ///
    /// Relative order inside each kind is preserved. Every reference and the
    /// root are rewritten, `block_boundary` becomes the index of the first
    /// block rule. Does nothing if the grammar already has this layout.
    pub fn rename_rules(&mut self) {
        self.rename_rules_with(&Workers::sequential());
    }

    pub(crate) fn rename_rules_with(&mut self, workers: &Workers) {
        if self.layout == RuleLayout::BlocksLast {
            return;
        }
        let pairs = self.pair_count();
        let terminals = self.terminals;

        let mut renamed = Vec::with_capacity(self.size());
        let (mut pair_i, mut block_i) = (0u64, 0u64);
        for &is_block in &self.block_flags {
            let new_index = if is_block {
                block_i += 1;
                pairs as u64 + block_i - 1
            } else {
                pair_i += 1;
                pair_i - 1
            };
            renamed.push((terminals + new_index) as Symbol);
        }

        let translate = |s: Symbol| -> Symbol {
            if u64::from(s) < terminals {
                s
            } else {
                renamed[(u64::from(s) - terminals) as usize]
            }
        };

        let rules = &self.non_terminals;
        let flags = &self.block_flags;
        let rewritten = workers.map_chunks(rules.len(), |range| {
            rules[range.clone()]
                .iter()
                .zip(&flags[range])
                .map(|(nt, &is_block)| {
                    let second = if is_block { nt.second } else { translate(nt.second) };
                    NonTerminal::new(translate(nt.first), second, nt.len)
                })
                .collect::<Vec<_>>()
        });

        let mut pair_rules = Vec::with_capacity(pairs);
        let mut block_rules = Vec::with_capacity(self.size() - pairs);
        for (nt, &is_block) in rewritten.into_iter().flatten().zip(flags) {
            if is_block {
                block_rules.push(nt);
            } else {
                pair_rules.push(nt);
            }
        }
        pair_rules.append(&mut block_rules);

        if !self.is_empty {
            self.root = translate(self.root);
        }
        self.non_terminals = pair_rules;
        self.block_flags = (0..self.non_terminals.len()).map(|i| i >= pairs).collect();
        self.block_boundary = pairs;
        self.layout = RuleLayout::BlocksLast;
    }

    // ========================================================================
    // Decompression
    // ========================================================================

    /// Lazily iterates over the derived terminal symbols.
    pub fn iter(&self) -> DeriveIter<'_> {
        DeriveIter::new(self)
    }

    /// Derives the full text as symbols.
    pub fn derive(&self) -> Vec<Symbol> {
        let mut out = Vec::with_capacity(self.text_len() as usize);
        out.extend(self.iter());
        out
    }

    /// Derives the full text, one character per terminal.
    pub fn derive_text(&self) -> String {
        self.iter().map(terminal_char).collect()
    }

    /// Extracts `len` symbols starting at position `i`.
    ///
    /// The range is clamped to the end of the text.
    pub fn extract_symbols(&self, i: u64, len: u64) -> Vec<Symbol> {
        let text_len = self.text_len();
        let mut out = Vec::new();
        if self.is_empty || i >= text_len || len == 0 {
            return out;
        }
        let len = len.min(text_len - i);
        out.reserve(len as usize);
        self.extract_into(&mut out, self.root, i, len);
        out
    }

    /// Extracts `len` characters starting at position `i`.
    pub fn extract(&self, i: u64, len: u64) -> String {
        self.extract_symbols(i, len)
            .into_iter()
            .map(terminal_char)
            .collect()
    }

    /// Appends `len` symbols of the expansion of `symbol` starting at `i`.
    ///
    /// Requires `i + len <= len_of(symbol)`.
    fn extract_into(&self, out: &mut Vec<Symbol>, symbol: Symbol, i: u64, len: u64) {
        if len == 0 {
            return;
        }
        let Some(index) = self.rule_index(symbol) else {
            out.push(symbol);
            return;
        };
        let rule = self.non_terminals[index];
        let first_len = self.len_of(rule.first);

        if self.block_flags[index] {
            let mut offset = i % first_len;
            let mut remaining = len;
            while remaining > 0 {
                let take = remaining.min(first_len - offset);
                self.extract_into(out, rule.first, offset, take);
                remaining -= take;
                offset = 0;
            }
        } else if i < first_len {
            let take = len.min(first_len - i);
            self.extract_into(out, rule.first, i, take);
            self.extract_into(out, rule.second, 0, len - take);
        } else {
            self.extract_into(out, rule.second, i - first_len, len);
        }
    }

    // ========================================================================
    // Invariants
    // ========================================================================

    /// Returns true if every rule only references symbols created before it.
    pub fn is_topologically_sorted(&self) -> bool {
        self.non_terminals
            .iter()
            .enumerate()
            .all(|(i, nt)| {
                let bound = self.terminals + i as u64;
                u64::from(nt.first) < bound
                    && (self.block_flags[i] || u64::from(nt.second) < bound)
            })
    }

    /// Returns true if every reference and the root name an existing symbol.
    pub fn references_valid(&self) -> bool {
        let bound = self.next_symbol();
        let rules_ok = self
            .non_terminals
            .iter()
            .zip(&self.block_flags)
            .all(|(nt, &is_block)| {
                u64::from(nt.first) < bound && (is_block || u64::from(nt.second) < bound)
            });
        rules_ok && (self.is_empty || u64::from(self.root) < bound)
    }

    /// Validates a grammar in any layout: block counts, references, the
    /// absence of cycles and the stored lengths.
    ///
    /// Rules are visited in post-order with an explicit stack, so every
    /// child length is verified before its parents use it.
    fn check_rules(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Visit {
            New,
            Active,
            Done,
        }

        let bound = self.next_symbol();
        let reference = |symbol: Symbol| {
            if u64::from(symbol) < bound {
                Ok(())
            } else {
                Err(RecompressionError::InvalidReference { symbol, bound })
            }
        };
        for (nt, &is_block) in self.non_terminals.iter().zip(&self.block_flags) {
            reference(nt.first)?;
            if is_block {
                if nt.second < 2 {
                    return Err(RecompressionError::InvalidBlockCount { count: nt.second });
                }
            } else {
                reference(nt.second)?;
            }
        }
        if !self.is_empty {
            reference(self.root)?;
        }

        let mut state = vec![Visit::New; self.size()];
        let mut stack = Vec::new();
        for start in 0..self.size() {
            if state[start] != Visit::New {
                continue;
            }
            stack.push(start);
            while let Some(&index) = stack.last() {
                let rule = self.non_terminals[index];
                let is_block = self.block_flags[index];
                match state[index] {
                    Visit::New => {
                        state[index] = Visit::Active;
                        let children = [Some(rule.first), (!is_block).then_some(rule.second)];
                        for child in children.into_iter().flatten() {
                            let Some(c) = self.rule_index(child) else {
                                continue;
                            };
                            match state[c] {
                                Visit::New => stack.push(c),
                                Visit::Active => {
                                    return Err(RecompressionError::CyclicRule { symbol: child })
                                }
                                Visit::Done => {}
                            }
                        }
                    }
                    Visit::Active => {
                        stack.pop();
                        state[index] = Visit::Done;
                        let derived = if is_block {
                            self.len_of(rule.first).checked_mul(u64::from(rule.second))
                        } else {
                            self.len_of(rule.first).checked_add(self.len_of(rule.second))
                        };
                        if derived != Some(rule.len) {
                            return Err(RecompressionError::LengthMismatch {
                                symbol: (self.terminals + index as u64) as Symbol,
                                stored: rule.len,
                            });
                        }
                    }
                    Visit::Done => {
                        stack.pop();
                    }
                }
            }
        }
        Ok(())
    }

    /// Height of the derivation tree of the root (0 for a terminal root).
    pub fn depth(&self) -> usize {
        if self.is_empty {
            return 0;
        }
        let mut memo = vec![None; self.size()];
        self.depth_of(self.root, &mut memo)
    }

    fn depth_of(&self, symbol: Symbol, memo: &mut [Option<usize>]) -> usize {
        let Some(index) = self.rule_index(symbol) else {
            return 0;
        };
        if let Some(depth) = memo[index] {
            return depth;
        }
        let rule = self.non_terminals[index];
        let mut depth = self.depth_of(rule.first, memo);
        if !self.block_flags[index] {
            depth = depth.max(self.depth_of(rule.second, memo));
        }
        memo[index] = Some(depth + 1);
        depth + 1
    }

    /// Returns statistics about the grammar.
    pub fn stats(&self) -> RlslpStats {
        let block_rules = self.block_count();
        RlslpStats {
            terminals: self.terminals,
            productions: self.size(),
            block_rules,
            pair_rules: self.size() - block_rules,
            text_len: self.text_len(),
            depth: self.depth(),
        }
    }
}

impl fmt::Display for Rlslp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "root: {}", self.root)?;
        writeln!(f, "number of terminals: {}", self.terminals)?;
        writeln!(f, "non-terminals:")?;
        for (i, nt) in self.non_terminals.iter().enumerate() {
            let kind = if self.block_flags[i] { "block" } else { "pair" };
            writeln!(
                f,
                "{} ({}): {} ({},{}) len: {}",
                i,
                self.terminals + i as u64,
                kind,
                nt.first,
                nt.second,
                nt.len
            )?;
        }
        Ok(())
    }
}

/// Statistics about an RLSLP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RlslpStats {
    pub terminals: u64,
    /// Total number of rules
    pub productions: usize,
    pub block_rules: usize,
    pub pair_rules: usize,
    /// Length of the derived text
    pub text_len: u64,
    /// Height of the derivation tree
    pub depth: usize,
}

impl RlslpStats {
    /// Returns the number of rules per text symbol as a percentage.
    ///
    /// Lower is better.
    pub fn compression_ratio(&self) -> f64 {
        if self.text_len == 0 {
            0.0
        } else {
            (self.productions as f64 / self.text_len as f64) * 100.0
        }
    }
}
