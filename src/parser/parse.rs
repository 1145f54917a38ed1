//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and the core parsing
//! infrastructure: the error type, the explicit stacks, helper methods, the
//! dispatch loop and panic-mode recovery.
//!
//! # Parser Architecture
//!
//! The parser is a state machine rather than a recursive descent parser.
//! Each grammar continuation is a [`State`]; the dispatch loop pops one state
//! at a time and runs it. Three stacks stand in for the native call stack:
//!
//! - `states`: pending continuations. A rule `A -> B C` pushes `C` then `B`.
//! - `work`: values waiting for a `create_*_node` state (lexeme indices,
//!   node indices, saved precedences, counts of finished runs).
//! - `counts`: one running counter per open variable-arity construct.
//!
//! Nesting depth is therefore bounded by heap memory only.
//!
//! The states themselves are split across files using `impl Parser` blocks:
//! - `declarations`: top-level declarations, `var_decl`, identifier and
//!   expression lists
//! - `expressions`: operands, precedence climbing, grouping and names

use std::collections::TryReserveError;

use thiserror::Error;

use crate::parser::ast::*;
use crate::parser::lexer::{Lexeme, Lexer, Span, Terminal};
use crate::trace::Trace;

/// Fatal parser error.
///
/// Syntax errors are not reported here; they are collected as
/// [`Diagnostic`]s in the returned tree.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("out of memory while growing the parse tables")]
    OutOfMemory(#[from] TryReserveError),
}

/// Append to a table or stack, reporting allocation failure instead of
/// aborting.
pub(crate) fn try_push<T>(vec: &mut Vec<T>, item: T) -> Result<(), ParseError> {
    vec.try_reserve(1)?;
    vec.push(item);
    Ok(())
}

/// Parse a whole source unit.
pub fn parse(source: &[u8]) -> Result<ParseTree, ParseError> {
    parse_with_trace(source, None)
}

/// Parse a whole source unit, reporting lexemes, states, diagnostics and
/// recoveries to `trace`.
pub fn parse_with_trace(
    source: &[u8],
    trace: Option<&mut dyn Trace>,
) -> Result<ParseTree, ParseError> {
    Parser::new(source, trace)?.parse_program()
}

/// Grammar continuations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    MoreTopDecl,
    TopDecl,
    VarDecl,
    IdentifierList,
    IdentifierItem,
    MoreIdentifiers,
    ExpectEqual,
    ExprList,
    ExprListItem,
    MoreExprs,
    EndTopDecl,
    Expression,
    ExprCont,
    CloseGroup,
    Name,
    NamespaceResolution,
    FieldResolution,
    MoreFields,
    CreateVarDeclNode,
    CreateBinOpNode,
    CreateTypedExprNode,
    CreateNameNode,
    Eof,
}

/// Explicit-stack parser for Sprig
pub struct Parser<'t> {
    pub(crate) tree: ParseTree,
    /// Cursor into the lexeme table.
    pub(crate) lexi: LexemeIndex,
    pub(crate) states: Vec<State>,
    pub(crate) work: Vec<usize>,
    pub(crate) counts: Vec<usize>,
    /// Current precedence threshold for binary operators.
    pub(crate) prec: usize,
    /// Stack heights at the start of the current top-level declaration.
    pub(crate) decl_work_len: usize,
    pub(crate) decl_counts_len: usize,
    trace: Option<&'t mut dyn Trace>,
}

impl<'t> Parser<'t> {
    /// Lex `source` and set up the tables with their sentinel entries.
    pub fn new(source: &[u8], mut trace: Option<&'t mut dyn Trace>) -> Result<Self, ParseError> {
        let mut tree = ParseTree::default();

        tree.lexemes.push(Lexeme {
            terminal: Terminal::Error,
            span: Span::default(),
        })?;
        for lexeme in Lexer::new(source) {
            let lexi = tree.lexemes.push(lexeme)?;
            if let Some(trace) = trace.as_deref_mut() {
                trace.lexeme(lexi, &lexeme);
            }
        }

        tree.nodes.push(Node {
            symbol: Symbol::Module,
            lexi: ERROR_LEXEME,
            offset: 0,
        })?;
        tree.nodes.push(Node {
            symbol: Symbol::Error,
            lexi: ERROR_LEXEME,
            offset: 0,
        })?;

        Ok(Self {
            tree,
            lexi: ERROR_LEXEME + 1,
            states: Vec::new(),
            work: Vec::new(),
            counts: Vec::new(),
            prec: 0,
            decl_work_len: 0,
            decl_counts_len: 0,
            trace,
        })
    }

    /// Run the state machine to completion and hand over the tree.
    pub fn parse_program(mut self) -> Result<ParseTree, ParseError> {
        // Running count of top-level declarations, closed by the eof state.
        self.open_count()?;
        self.push_state(State::MoreTopDecl)?;

        while let Some(state) = self.states.pop() {
            if let Some(trace) = self.trace.as_deref_mut() {
                trace.state(&state, self.lexi, self.states.len());
            }

            match state {
                State::MoreTopDecl => self.more_top_decl()?,
                State::TopDecl => self.top_decl()?,
                State::VarDecl => self.var_decl()?,
                State::IdentifierList => self.identifier_list()?,
                State::IdentifierItem => self.identifier_item()?,
                State::MoreIdentifiers => self.more_identifiers()?,
                State::ExpectEqual => self.expect_equal()?,
                State::ExprList => self.expr_list()?,
                State::ExprListItem => self.expr_list_item()?,
                State::MoreExprs => self.more_exprs()?,
                State::EndTopDecl => self.end_top_decl()?,
                State::Expression => self.expression()?,
                State::ExprCont => self.expr_cont()?,
                State::CloseGroup => self.close_group()?,
                State::Name => self.name()?,
                State::NamespaceResolution => self.namespace_resolution()?,
                State::FieldResolution => self.field_resolution()?,
                State::MoreFields => self.more_fields()?,
                State::CreateVarDeclNode => self.create_var_decl_node()?,
                State::CreateBinOpNode => self.create_binop_node()?,
                State::CreateTypedExprNode => self.create_typed_expr_node()?,
                State::CreateNameNode => self.create_name_node()?,
                State::Eof => self.finish_module()?,
            }
        }

        Ok(self.tree)
    }

    /// Write the root's declaration list. This is the only data written
    /// after the fact, since the count is not known until the end.
    fn finish_module(&mut self) -> Result<(), ParseError> {
        let count = self.counts.pop().unwrap_or(0);
        let start = self.work.len() - count;
        let offset = self.write_runs(&[(start, count)])?;
        self.work.truncate(start);
        self.tree.nodes.set_root_offset(offset);
        Ok(())
    }

    // ===== Recovery =====

    /// Panic-mode recovery: abandon the current top-level declaration.
    ///
    /// Unwinds the state stack to the `more_top_decl` anchor, drops every
    /// value the declaration had pushed, then skips lexemes until a
    /// declaration keyword or a `;` outside any brackets, or the end of file.
    pub(crate) fn skip_to_next_top_decl(&mut self) {
        while self
            .states
            .last()
            .is_some_and(|&state| state != State::MoreTopDecl)
        {
            self.states.pop();
        }
        self.work.truncate(self.decl_work_len);
        self.counts.truncate(self.decl_counts_len);
        self.prec = 0;

        let from = self.lexi;
        let mut depth = 0usize;
        loop {
            let terminal = self.terminal();
            if terminal == Terminal::Eof {
                break;
            }
            if terminal.is_opening_delimiter() {
                depth += 1;
            } else if terminal.is_closing_delimiter() {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && terminal == Terminal::Semicolon {
                self.advance();
                break;
            } else if depth == 0 && terminal.starts_declaration() {
                break;
            }
            self.advance();
        }

        if let Some(trace) = self.trace.as_deref_mut() {
            trace.recovery(from, self.lexi);
        }
    }

    /// Record a diagnostic at the current lexeme. Parsing always continues.
    pub(crate) fn diag(
        &mut self,
        tag: DiagnosticTag,
        expected: Option<Terminal>,
    ) -> Result<(), ParseError> {
        let diagnostic = Diagnostic {
            tag,
            lexi: self.lexi,
            expected,
        };
        try_push(&mut self.tree.diagnostics, diagnostic)?;
        if let Some(trace) = self.trace.as_deref_mut() {
            trace.diagnostic(&diagnostic);
        }
        Ok(())
    }

    // ===== Stack helpers =====

    pub(crate) fn push_state(&mut self, state: State) -> Result<(), ParseError> {
        try_push(&mut self.states, state)
    }

    /// Push continuations so that they run in the order given.
    pub(crate) fn push_states(&mut self, states: &[State]) -> Result<(), ParseError> {
        self.states.try_reserve(states.len())?;
        self.states.extend(states.iter().rev());
        Ok(())
    }

    pub(crate) fn push_work(&mut self, value: usize) -> Result<(), ParseError> {
        try_push(&mut self.work, value)
    }

    pub(crate) fn pop_work(&mut self) -> usize {
        self.work.pop().expect("work stack underflow")
    }

    pub(crate) fn open_count(&mut self) -> Result<(), ParseError> {
        try_push(&mut self.counts, 0)
    }

    pub(crate) fn bump_count(&mut self) {
        if let Some(count) = self.counts.last_mut() {
            *count += 1;
        }
    }

    /// Close the innermost count and leave it on the work stack, after the
    /// items it counted.
    pub(crate) fn close_count(&mut self) -> Result<(), ParseError> {
        let count = self.counts.pop().expect("counts stack underflow");
        self.push_work(count)
    }

    /// Locate the count-prefixed run that ends just below `end` on the work
    /// stack. Returns the index of its first item and its length.
    pub(crate) fn run_before(&self, end: usize) -> (usize, usize) {
        let count = self.work[end - 1];
        (end - 1 - count, count)
    }

    /// Copy runs of work-stack items into the data array, each prefixed by
    /// its count. Returns the offset of the first count.
    pub(crate) fn write_runs(&mut self, runs: &[(usize, usize)]) -> Result<DataIndex, ParseError> {
        let offset = self.tree.data.len();
        let total: usize = runs.iter().map(|&(_, count)| count + 1).sum();
        self.tree.data.try_reserve(total)?;
        for &(start, count) in runs {
            self.tree.data.push(count);
            self.tree
                .data
                .extend_from_slice(&self.work[start..start + count]);
        }
        Ok(offset)
    }

    pub(crate) fn write_pair(&mut self, first: usize, second: usize) -> Result<DataIndex, ParseError> {
        let offset = self.tree.data.len();
        self.tree.data.try_reserve(2)?;
        self.tree.data.push(first);
        self.tree.data.push(second);
        Ok(offset)
    }

    pub(crate) fn add_node(
        &mut self,
        symbol: Symbol,
        lexi: LexemeIndex,
        offset: DataIndex,
    ) -> Result<NodeIndex, ParseError> {
        self.tree.nodes.push(Node {
            symbol,
            lexi,
            offset,
        })
    }

    // ===== Lexeme helpers =====

    pub(crate) fn terminal(&self) -> Terminal {
        self.tree.lexemes.terminal(self.lexi)
    }

    /// Terminal `n` lexemes ahead; the end of file repeats forever.
    pub(crate) fn peek_terminal(&self, n: usize) -> Terminal {
        let last = self.tree.lexemes.len() - 1;
        self.tree.lexemes.terminal((self.lexi + n).min(last))
    }

    pub(crate) fn check(&self, terminal: Terminal) -> bool {
        self.terminal() == terminal
    }

    pub(crate) fn match_terminal(&mut self, terminal: Terminal) -> bool {
        if self.check(terminal) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current lexeme and return its index. Never moves past
    /// the end of file.
    pub(crate) fn advance(&mut self) -> LexemeIndex {
        let lexi = self.lexi;
        if !self.check(Terminal::Eof) {
            self.lexi += 1;
        }
        lexi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(tree: &ParseTree) -> Vec<Symbol> {
        tree.iter().map(|(nodi, _)| tree.symbol(nodi)).collect()
    }

    #[test]
    fn test_sentinels_are_reserved() {
        let tree = parse(b"").unwrap();
        assert_eq!(tree.lexemes.terminal(ERROR_LEXEME), Terminal::Error);
        assert_eq!(tree.lexemes.terminal(1), Terminal::Eof);
        assert_eq!(tree.nodes.symbol(ROOT_NODE), Symbol::Module);
        assert_eq!(tree.nodes.symbol(ERROR_NODE), Symbol::Error);
        assert!(tree.as_module(ROOT_NODE).decls.is_empty());
        assert!(tree.diagnostics.is_empty());
    }

    #[test]
    fn test_parse_simple_declaration() {
        let tree = parse(b"let x = 1 + 2 * 3;").unwrap();
        assert!(tree.diagnostics.is_empty());
        assert_eq!(
            symbols(&tree),
            vec![
                Symbol::Module,
                Symbol::VarDecl,
                Symbol::Add,
                Symbol::LiteralInt,
                Symbol::Mul,
                Symbol::LiteralInt,
                Symbol::LiteralInt,
            ]
        );
    }

    #[test]
    fn test_left_associative_subtraction() {
        let tree = parse(b"let a = 1 - 2 - 3;").unwrap();
        let decl = tree.as_module(ROOT_NODE).decls[0];
        let outer = tree.as_binop(tree.as_vardecl(decl).exprs[0]);
        assert_eq!(outer.op, Symbol::Sub);
        assert_eq!(tree.symbol(outer.lhs), Symbol::Sub);
        assert_eq!(tree.symbol(outer.rhs), Symbol::LiteralInt);
    }

    #[test]
    fn test_group_overrides_precedence() {
        let tree = parse(b"let a = (1 + 2) * 3;").unwrap();
        assert!(tree.diagnostics.is_empty());
        let decl = tree.as_module(ROOT_NODE).decls[0];
        let mul = tree.as_binop(tree.as_vardecl(decl).exprs[0]);
        assert_eq!(mul.op, Symbol::Mul);
        assert_eq!(tree.symbol(mul.lhs), Symbol::Add);
    }
}
