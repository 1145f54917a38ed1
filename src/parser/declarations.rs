//! Declaration states
//!
//! This module handles the top level of a Sprig module:
//!
//! - the declaration loop and its recovery anchor
//! - variable declarations: `[pub] let a, b = expr, expr;`
//! - identifier lists and expression lists
//!
//! # Grammar
//!
//! ```text
//! module          ::= top_decl* eof
//! top_decl        ::= "pub"? var_decl ";"
//! var_decl        ::= "let" identifier_list "=" expr_list
//! identifier_list ::= identifier ("," identifier)*
//! expr_list       ::= expression ("," expression)*
//! ```
//!
//! All states are implemented as `pub(crate)` methods on the [`Parser`]
//! struct.

use crate::parser::ast::*;
use crate::parser::lexer::Terminal;
use crate::parser::parse::{ParseError, Parser, State};

impl Parser<'_> {
    pub(crate) fn more_top_decl(&mut self) -> Result<(), ParseError> {
        if self.check(Terminal::Eof) {
            self.push_state(State::Eof)
        } else {
            self.push_states(&[State::TopDecl, State::MoreTopDecl])
        }
    }

    pub(crate) fn top_decl(&mut self) -> Result<(), ParseError> {
        self.decl_work_len = self.work.len();
        self.decl_counts_len = self.counts.len();
        self.prec = 0;

        self.match_terminal(Terminal::Pub);

        match self.terminal() {
            Terminal::Let => self.push_states(&[State::VarDecl, State::EndTopDecl]),
            _ => {
                self.diag(DiagnosticTag::ExpectedTopLevelDecl, None)?;
                // Step over the offending lexeme so recovery cannot stop on it.
                self.advance();
                self.skip_to_next_top_decl();
                Ok(())
            }
        }
    }

    /// `let` has been seen by `top_decl`.
    pub(crate) fn var_decl(&mut self) -> Result<(), ParseError> {
        let let_lexi = self.advance();
        self.push_work(let_lexi)?;
        self.push_states(&[
            State::IdentifierList,
            State::ExpectEqual,
            State::ExprList,
            State::CreateVarDeclNode,
        ])
    }

    pub(crate) fn identifier_list(&mut self) -> Result<(), ParseError> {
        self.open_count()?;
        self.push_state(State::IdentifierItem)
    }

    pub(crate) fn identifier_item(&mut self) -> Result<(), ParseError> {
        self.bump_count();
        if self.check(Terminal::Identifier) {
            let lexi = self.advance();
            self.push_work(lexi)?;
        } else {
            self.diag(DiagnosticTag::ExpectedLexeme, Some(Terminal::Identifier))?;
            self.push_work(ERROR_LEXEME)?;
        }
        self.push_state(State::MoreIdentifiers)
    }

    pub(crate) fn more_identifiers(&mut self) -> Result<(), ParseError> {
        if self.match_terminal(Terminal::Comma) {
            self.push_state(State::IdentifierItem)
        } else {
            self.close_count()
        }
    }

    pub(crate) fn expect_equal(&mut self) -> Result<(), ParseError> {
        if !self.match_terminal(Terminal::Equal) {
            self.diag(DiagnosticTag::ExpectedLexeme, Some(Terminal::Equal))?;
            self.skip_to_next_top_decl();
        }
        Ok(())
    }

    pub(crate) fn expr_list(&mut self) -> Result<(), ParseError> {
        self.open_count()?;
        self.push_state(State::ExprListItem)
    }

    pub(crate) fn expr_list_item(&mut self) -> Result<(), ParseError> {
        self.bump_count();
        self.push_states(&[State::Expression, State::MoreExprs])
    }

    pub(crate) fn more_exprs(&mut self) -> Result<(), ParseError> {
        if self.match_terminal(Terminal::Comma) {
            self.push_state(State::ExprListItem)
        } else {
            self.close_count()
        }
    }

    pub(crate) fn end_top_decl(&mut self) -> Result<(), ParseError> {
        if self.match_terminal(Terminal::Semicolon) {
            self.bump_count();
        } else {
            self.diag(DiagnosticTag::UndelimitedTopVar, None)?;
            self.skip_to_next_top_decl();
        }
        Ok(())
    }

    /// Work stack: `[let, ids.., id_count, exprs.., expr_count]`.
    pub(crate) fn create_var_decl_node(&mut self) -> Result<(), ParseError> {
        let (exprs_start, expr_count) = self.run_before(self.work.len());
        let (ids_start, id_count) = self.run_before(exprs_start);
        let offset = self.write_runs(&[(exprs_start, expr_count), (ids_start, id_count)])?;

        let let_lexi = self.work[ids_start - 1];
        self.work.truncate(ids_start - 1);

        let nodi = self.add_node(Symbol::VarDecl, let_lexi, offset)?;
        self.push_work(nodi)
    }
}
