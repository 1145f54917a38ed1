//! Parser tracing
//!
//! Tracing is an explicit, optional sink handed to
//! [`parse_with_trace`](crate::parser::parse::parse_with_trace). There is no
//! global logger: a parse without a sink does no tracing work at all.

use std::fmt;
use std::io::Write;

use crate::parser::ast::{Diagnostic, LexemeIndex};
use crate::parser::lexer::Lexeme;

/// Receives parser events. Every hook defaults to doing nothing.
pub trait Trace {
    /// A lexeme was appended to the lexeme table.
    fn lexeme(&mut self, _lexi: LexemeIndex, _lexeme: &Lexeme) {}

    /// A state was popped for dispatch. `depth` is the number of states
    /// still pending.
    fn state(&mut self, _state: &dyn fmt::Debug, _lexi: LexemeIndex, _depth: usize) {}

    fn diagnostic(&mut self, _diagnostic: &Diagnostic) {}

    /// Panic-mode recovery skipped the lexemes `from..to`.
    fn recovery(&mut self, _from: LexemeIndex, _to: LexemeIndex) {}
}

/// Writes one line per event. Write errors are ignored; tracing must not
/// change the outcome of a parse.
pub struct WriteTrace<W: Write> {
    out: W,
    states: bool,
}

impl<W: Write> WriteTrace<W> {
    pub fn new(out: W) -> Self {
        Self { out, states: true }
    }

    /// Skip the per-state lines, which dominate the output.
    pub fn without_states(mut self) -> Self {
        self.states = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Trace for WriteTrace<W> {
    fn lexeme(&mut self, lexi: LexemeIndex, lexeme: &Lexeme) {
        let _ = writeln!(
            self.out,
            "lex   #{lexi} {} {}..{}",
            lexeme.terminal, lexeme.span.start, lexeme.span.end
        );
    }

    fn state(&mut self, state: &dyn fmt::Debug, lexi: LexemeIndex, depth: usize) {
        if self.states {
            let _ = writeln!(self.out, "state {state:?} at #{lexi} (pending {depth})");
        }
    }

    fn diagnostic(&mut self, diagnostic: &Diagnostic) {
        let _ = match diagnostic.expected {
            Some(expected) => writeln!(
                self.out,
                "diag  {} at #{} (expected {expected})",
                diagnostic.tag, diagnostic.lexi
            ),
            None => writeln!(self.out, "diag  {} at #{}", diagnostic.tag, diagnostic.lexi),
        };
    }

    fn recovery(&mut self, from: LexemeIndex, to: LexemeIndex) {
        let _ = writeln!(self.out, "skip  #{from}..#{to}");
    }
}
