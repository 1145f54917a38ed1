//! Sprig source code parser
//!
//! This module transforms Sprig source bytes into a flat [`ParseTree`]:
//! - [`lexer`]: Tokenization (source bytes → lexemes)
//! - [`parse`]: The explicit-stack parser engine and its entry points
//! - [`ast`]: Tree storage, node kinds, diagnostics and per-kind decoders
//! - [`iter`]: Depth-first traversal and the textual dump
//!
//! # Supported Grammar
//!
//! Top-level variable declarations with expression initializers:
//! - `[pub] let a, b = expr, expr;`
//! - literals, parenthesized groups, binary operators with precedence
//! - namespaced paths `ns::ns::field.field`, `this.field` and `.field`
//! - type annotations `expr : Type`
//!
//! # Parser Implementation
//!
//! A state machine driven by explicit stacks instead of recursive descent,
//! with precedence climbing for binary operators and panic-mode recovery at
//! top-level declarations. Nothing in the pipeline recurses natively.
//!
//! [`ParseTree`]: ast::ParseTree

pub mod ast;
mod declarations;
mod expressions;
pub mod iter;
pub mod lexer;
pub mod parse;

pub use ast::ParseTree;
pub use parse::{parse, parse_with_trace, ParseError};
