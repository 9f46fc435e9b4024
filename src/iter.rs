use crate::rlslp::Rlslp;
use crate::symbol::Symbol;

/// Iterator that derives the text of an RLSLP one terminal at a time.
///
/// Uses a stack bounded by the grammar depth, so even texts far larger
/// than memory can be streamed.
pub struct DeriveIter<'a> {
    grammar: &'a Rlslp,
    /// Work left to do, innermost on top.
    stack: Vec<Frame>,
}

/// Stack entry for tracking position during rule expansion.
#[derive(Debug, Clone, Copy)]
enum Frame {
    /// Symbol still to be expanded.
    Pending(Symbol),
    /// Block rule with `remaining` copies of `symbol` still to emit.
    Repeat { symbol: Symbol, remaining: Symbol },
}

impl<'a> DeriveIter<'a> {
    pub(crate) fn new(grammar: &'a Rlslp) -> Self {
        let mut stack = Vec::new();
        if !grammar.is_empty() {
            stack.push(Frame::Pending(grammar.root()));
        }
        Self { grammar, stack }
    }

    /// Descends from `symbol` to its leftmost terminal, pushing the
    /// remainder of each visited rule.
    fn descend(&mut self, mut symbol: Symbol) -> Symbol {
        while let Some(rule) = self.grammar.get(symbol) {
            if self.grammar.is_block(symbol) {
                if rule.count() > 1 {
                    self.stack.push(Frame::Repeat {
                        symbol: rule.first,
                        remaining: rule.count() - 1,
                    });
                }
            } else {
                self.stack.push(Frame::Pending(rule.second));
            }
            symbol = rule.first;
        }
        symbol
    }
}

impl Iterator for DeriveIter<'_> {
    type Item = Symbol;

    fn next(&mut self) -> Option<Self::Item> {
        let symbol = match self.stack.pop()? {
            Frame::Pending(symbol) => symbol,
            Frame::Repeat { symbol, remaining } => {
                if remaining > 1 {
                    self.stack.push(Frame::Repeat {
                        symbol,
                        remaining: remaining - 1,
                    });
                }
                symbol
            }
        };
        Some(self.descend(symbol))
    }
}

impl<'a> IntoIterator for &'a Rlslp {
    type Item = Symbol;
    type IntoIter = DeriveIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
