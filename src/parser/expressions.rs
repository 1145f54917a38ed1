//! Expression states
//!
//! Operands, binary operators, grouping, type annotations and names.
//!
//! # Precedence climbing
//!
//! The current threshold lives in `Parser::prec`. When `expr_cont` sees a
//! binary operator that binds tighter than the threshold it pushes the
//! operator lexeme and the old threshold, raises the threshold and runs
//! another `expression`. `create_binop_node` then pops
//! `[rhs, old_prec, op, lhs]` and restores the threshold. Operators of equal
//! precedence stop the inner expression, which makes every operator left
//! associative.
//!
//! ```text
//! expression ::= literal | "(" expression ")" | name | expression op expression
//!              | expression ":" name
//! name       ::= (identifier "::")* identifier ("." identifier)*
//!              | "this" ("." identifier)*
//!              | "." identifier ("." identifier)*
//! ```

use crate::parser::ast::*;
use crate::parser::lexer::Terminal;
use crate::parser::parse::{ParseError, Parser, State};

/// Binding power of the `:` type annotation; below every binary operator.
const TYPE_ANNOTATION_PREC: usize = 1;

impl Parser<'_> {
    /// Parse one operand and leave its node index on the work stack.
    pub(crate) fn expression(&mut self) -> Result<(), ParseError> {
        let terminal = self.terminal();

        if terminal.is_literal() {
            if let Some(symbol) = Symbol::from_terminal(terminal) {
                let lexi = self.advance();
                let nodi = self.add_node(symbol, lexi, 0)?;
                self.push_work(nodi)?;
                return self.push_state(State::ExprCont);
            }
        }

        match terminal {
            Terminal::LParen => {
                self.advance();
                self.push_work(self.prec)?;
                self.prec = 0;
                self.push_states(&[State::Expression, State::CloseGroup, State::ExprCont])
            }
            Terminal::Identifier | Terminal::This | Terminal::Dot => {
                self.push_states(&[State::Name, State::ExprCont])
            }
            invalid if invalid.is_invalid() => {
                self.diag(DiagnosticTag::UnexpectedLexeme, None)?;
                self.advance();
                self.push_work(ERROR_NODE)?;
                self.push_state(State::ExprCont)
            }
            _ => {
                self.diag(DiagnosticTag::ExpectedExpression, None)?;
                self.push_work(ERROR_NODE)
            }
        }
    }

    /// Continue an operand with a binary operator or a type annotation, if
    /// one binds tighter than the current threshold.
    pub(crate) fn expr_cont(&mut self) -> Result<(), ParseError> {
        let terminal = self.terminal();

        if let Some(prec) = terminal.binary_precedence().map(usize::from) {
            if prec > self.prec {
                let op = self.advance();
                self.push_work(op)?;
                self.push_work(self.prec)?;
                self.prec = prec;
                return self.push_states(&[
                    State::Expression,
                    State::CreateBinOpNode,
                    State::ExprCont,
                ]);
            }
        } else if terminal == Terminal::Colon && TYPE_ANNOTATION_PREC > self.prec {
            let colon = self.advance();
            self.push_work(colon)?;
            return self.push_states(&[State::Name, State::CreateTypedExprNode, State::ExprCont]);
        }

        Ok(())
    }

    /// Work stack: `[saved_prec, value]`.
    pub(crate) fn close_group(&mut self) -> Result<(), ParseError> {
        if !self.match_terminal(Terminal::RParen) {
            self.diag(DiagnosticTag::ExpectedLexeme, Some(Terminal::RParen))?;
            self.skip_to_next_top_decl();
            return Ok(());
        }
        let value = self.pop_work();
        self.prec = self.pop_work();
        self.push_work(value)
    }

    /// Work stack: `[lhs, op, old_prec, rhs]`.
    pub(crate) fn create_binop_node(&mut self) -> Result<(), ParseError> {
        let rhs = self.pop_work();
        self.prec = self.pop_work();
        let op = self.pop_work();
        let lhs = self.pop_work();

        let Some(symbol) = Symbol::from_terminal(self.tree.lexemes.terminal(op)) else {
            unreachable!("lexeme {op} is not a binary operator");
        };
        let offset = self.write_pair(lhs, rhs)?;
        let nodi = self.add_node(symbol, op, offset)?;
        self.push_work(nodi)
    }

    /// Work stack: `[expr, colon, type]`.
    pub(crate) fn create_typed_expr_node(&mut self) -> Result<(), ParseError> {
        let ty = self.pop_work();
        let colon = self.pop_work();
        let expr = self.pop_work();

        let offset = self.write_pair(expr, ty)?;
        let nodi = self.add_node(Symbol::TypedExpr, colon, offset)?;
        self.push_work(nodi)
    }

    pub(crate) fn name(&mut self) -> Result<(), ParseError> {
        match self.terminal() {
            Terminal::Identifier => {
                self.push_work(self.lexi)?;
                self.open_count()?;
                self.push_states(&[
                    State::NamespaceResolution,
                    State::FieldResolution,
                    State::CreateNameNode,
                ])
            }
            // `.x` is shorthand for `this.x`
            Terminal::Dot => {
                let dot = self.advance();
                self.push_work(dot)?;
                self.push_work(0)?;
                self.open_count()?;
                self.push_states(&[State::FieldResolution, State::CreateNameNode])
            }
            Terminal::This => {
                let this = self.advance();
                self.push_work(this)?;
                self.push_work(0)?;
                self.open_count()?;
                self.push_states(&[State::MoreFields, State::CreateNameNode])
            }
            _ => {
                self.diag(DiagnosticTag::ExpectedLexeme, Some(Terminal::Identifier))?;
                self.push_work(ERROR_NODE)
            }
        }
    }

    /// Consume `identifier ::` segments, then switch the open count over to
    /// the field segments.
    pub(crate) fn namespace_resolution(&mut self) -> Result<(), ParseError> {
        if self.check(Terminal::Identifier) && self.peek_terminal(1) == Terminal::ColonColon {
            let segment = self.advance();
            self.advance();
            self.push_work(segment)?;
            self.bump_count();
            return self.push_state(State::NamespaceResolution);
        }
        self.close_count()?;
        self.open_count()
    }

    pub(crate) fn field_resolution(&mut self) -> Result<(), ParseError> {
        self.bump_count();
        if self.check(Terminal::Identifier) {
            let field = self.advance();
            self.push_work(field)?;
        } else {
            self.diag(DiagnosticTag::ExpectedLexeme, Some(Terminal::Identifier))?;
            self.push_work(ERROR_LEXEME)?;
        }
        self.push_state(State::MoreFields)
    }

    pub(crate) fn more_fields(&mut self) -> Result<(), ParseError> {
        if self.match_terminal(Terminal::Dot) {
            self.push_state(State::FieldResolution)
        } else {
            self.close_count()
        }
    }

    /// Work stack: `[first, ns.., ns_count, fields.., field_count]`.
    pub(crate) fn create_name_node(&mut self) -> Result<(), ParseError> {
        let (fields_start, field_count) = self.run_before(self.work.len());
        let (ns_start, ns_count) = self.run_before(fields_start);
        let offset = self.write_runs(&[(ns_start, ns_count), (fields_start, field_count)])?;

        let first = self.work[ns_start - 1];
        self.work.truncate(ns_start - 1);

        let nodi = self.add_node(Symbol::Name, first, offset)?;
        self.push_work(nodi)
    }
}
