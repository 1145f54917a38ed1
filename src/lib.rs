//! # Introduction
//!
//! Sprig is a small statically/gradually typed language. This crate is its
//! front end: it turns source bytes into a syntactically validated,
//! index-addressed tree and reports every independent syntax error it finds
//! in a single pass.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Lexeme table → Parser (state machine) → ParseTree
//! ```
//!
//! 1. [`parser::lexer`]: classifies bytes into lexemes; never fails, malformed
//!    input becomes `Invalid*` lexemes.
//! 2. [`parser::parse`]: explicit-stack parser with precedence climbing and
//!    panic-mode recovery.
//! 3. [`parser::ast`]: the flat tree: node and lexeme tables, the shared
//!    data array and diagnostics, read through the `as_*` decoders.
//! 4. [`parser::iter`]: pre-order traversal and tree dump.
//! 5. [`trace`]: optional event sink for debugging a parse.
//!
//! ## Example
//!
//! ```
//! use sprig::parser::ast::{Symbol, ROOT_NODE};
//!
//! let source = b"let a, b = 1 + 2, config.pos;";
//! let tree = sprig::parser::parse(source).unwrap();
//! assert!(tree.diagnostics.is_empty());
//!
//! let decl = tree.as_module(ROOT_NODE).decls[0];
//! let view = tree.as_vardecl(decl);
//! assert_eq!(view.identifiers.len(), 2);
//! assert_eq!(tree.symbol(view.exprs[0]), Symbol::Add);
//! ```

pub mod parser;
pub mod trace;
