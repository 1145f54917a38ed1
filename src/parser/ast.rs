//! Flat parse tree storage
//!
//! The tree is a set of index-addressed tables instead of heap-linked nodes:
//!
//! - a structure-of-arrays node table (`symbol`, defining lexeme, data offset)
//! - a structure-of-arrays lexeme table (`terminal`, span)
//! - one shared `data` array holding each composite node's payload as
//!   count-prefixed runs of indices
//! - the diagnostics collected while parsing
//!
//! Node 0 is always the [`Symbol::Module`] root and node 1 the
//! [`Symbol::Error`] sentinel; lexeme 0 is the [`Terminal::Error`] sentinel.
//! Recovery plugs holes with the sentinels, so every index stored in the tree
//! resolves.
//!
//! # Data layouts
//!
//! ```text
//! module     [decl_count, decl_nodi * decl_count]
//! var_decl   [expr_count, expr_nodi * expr_count, id_count, id_lexi * id_count]
//! binary op  [lhs_nodi, rhs_nodi]
//! typed_expr [expr_nodi, type_nodi]
//! name       [ns_count, ns_lexi * ns_count, field_count, field_lexi * field_count]
//! ```
//!
//! The `as_*` decoders on [`ParseTree`] are the only code that reads `data`.
//! They must agree with the `create_*_node` states of the parser.

use std::borrow::Cow;
use std::fmt;

use super::lexer::{Lexeme, Span, Terminal};
use super::parse::{try_push, ParseError};

pub type NodeIndex = usize;
pub type LexemeIndex = usize;
pub type DataIndex = usize;

pub const ROOT_NODE: NodeIndex = 0;
pub const ERROR_NODE: NodeIndex = 1;
pub const ERROR_LEXEME: LexemeIndex = 0;

/// Node kinds.
///
/// The literal and binary blocks mirror the matching blocks of [`Terminal`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Module,
    VarDecl,
    TypedExpr,
    Name,
    /// Sentinel node standing in for a missing operand or item.
    Error,

    // Literals
    LiteralInt,
    LiteralFloat,
    LiteralString,
    LiteralChar,
    LiteralTrue,
    LiteralFalse,

    // Binary operators
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl Symbol {
    const ALL: [Symbol; 29] = [
        Symbol::Module,
        Symbol::VarDecl,
        Symbol::TypedExpr,
        Symbol::Name,
        Symbol::Error,
        Symbol::LiteralInt,
        Symbol::LiteralFloat,
        Symbol::LiteralString,
        Symbol::LiteralChar,
        Symbol::LiteralTrue,
        Symbol::LiteralFalse,
        Symbol::Add,
        Symbol::Sub,
        Symbol::Mul,
        Symbol::Div,
        Symbol::Mod,
        Symbol::Eq,
        Symbol::Ne,
        Symbol::Lt,
        Symbol::Le,
        Symbol::Gt,
        Symbol::Ge,
        Symbol::And,
        Symbol::Or,
        Symbol::BitAnd,
        Symbol::BitOr,
        Symbol::BitXor,
        Symbol::Shl,
        Symbol::Shr,
    ];

    /// Distance between a literal/operator terminal and its symbol.
    pub const TERMINAL_OFFSET: u8 = Symbol::LiteralInt as u8 - Terminal::LiteralInt as u8;

    /// The literal or binary operator symbol for `terminal`, if it has one.
    pub fn from_terminal(terminal: Terminal) -> Option<Symbol> {
        if terminal.is_literal() || terminal.is_binary_operator() {
            Some(Self::ALL[(terminal as u8 + Self::TERMINAL_OFFSET) as usize])
        } else {
            None
        }
    }

    pub fn is_literal(self) -> bool {
        (Symbol::LiteralInt as u8..=Symbol::LiteralFalse as u8).contains(&(self as u8))
    }

    pub fn is_binary(self) -> bool {
        (Symbol::Add as u8..=Symbol::Shr as u8).contains(&(self as u8))
    }

    pub fn name(self) -> &'static str {
        match self {
            Symbol::Module => "module",
            Symbol::VarDecl => "var_decl",
            Symbol::TypedExpr => "typed_expr",
            Symbol::Name => "name",
            Symbol::Error => "error",
            Symbol::LiteralInt => "literal_int",
            Symbol::LiteralFloat => "literal_float",
            Symbol::LiteralString => "literal_string",
            Symbol::LiteralChar => "literal_char",
            Symbol::LiteralTrue => "literal_true",
            Symbol::LiteralFalse => "literal_false",
            Symbol::Add => "add",
            Symbol::Sub => "sub",
            Symbol::Mul => "mul",
            Symbol::Div => "div",
            Symbol::Mod => "mod",
            Symbol::Eq => "eq",
            Symbol::Ne => "ne",
            Symbol::Lt => "lt",
            Symbol::Le => "le",
            Symbol::Gt => "gt",
            Symbol::Ge => "ge",
            Symbol::And => "and",
            Symbol::Or => "or",
            Symbol::BitAnd => "bit_and",
            Symbol::BitOr => "bit_or",
            Symbol::BitXor => "bit_xor",
            Symbol::Shl => "shl",
            Symbol::Shr => "shr",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One tree element, as read back from the [`NodeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub symbol: Symbol,
    pub lexi: LexemeIndex,
    pub offset: DataIndex,
}

/// Lexemes stored as parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexemeTable {
    terminals: Vec<Terminal>,
    spans: Vec<Span>,
}

impl LexemeTable {
    pub fn len(&self) -> usize {
        self.terminals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty()
    }

    pub fn terminal(&self, lexi: LexemeIndex) -> Terminal {
        self.terminals[lexi]
    }

    pub fn span(&self, lexi: LexemeIndex) -> Span {
        self.spans[lexi]
    }

    pub fn get(&self, lexi: LexemeIndex) -> Lexeme {
        Lexeme {
            terminal: self.terminals[lexi],
            span: self.spans[lexi],
        }
    }

    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub(crate) fn push(&mut self, lexeme: Lexeme) -> Result<LexemeIndex, ParseError> {
        let lexi = self.terminals.len();
        try_push(&mut self.terminals, lexeme.terminal)?;
        try_push(&mut self.spans, lexeme.span)?;
        Ok(lexi)
    }
}

/// Nodes stored as parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeTable {
    symbols: Vec<Symbol>,
    lexis: Vec<LexemeIndex>,
    offsets: Vec<DataIndex>,
}

impl NodeTable {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbol(&self, nodi: NodeIndex) -> Symbol {
        self.symbols[nodi]
    }

    pub fn lexi(&self, nodi: NodeIndex) -> LexemeIndex {
        self.lexis[nodi]
    }

    pub fn offset(&self, nodi: NodeIndex) -> DataIndex {
        self.offsets[nodi]
    }

    pub fn get(&self, nodi: NodeIndex) -> Node {
        Node {
            symbol: self.symbols[nodi],
            lexi: self.lexis[nodi],
            offset: self.offsets[nodi],
        }
    }

    pub(crate) fn push(&mut self, node: Node) -> Result<NodeIndex, ParseError> {
        let nodi = self.symbols.len();
        try_push(&mut self.symbols, node.symbol)?;
        try_push(&mut self.lexis, node.lexi)?;
        try_push(&mut self.offsets, node.offset)?;
        Ok(nodi)
    }

    /// Point the root at its declaration list once the whole file is parsed.
    pub(crate) fn set_root_offset(&mut self, offset: DataIndex) {
        self.offsets[ROOT_NODE] = offset;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticTag {
    ExpectedTopLevelDecl,
    ExpectedExpression,
    /// A specific terminal was required; see [`Diagnostic::expected`].
    ExpectedLexeme,
    /// A top-level variable declaration is not closed by `;`.
    UndelimitedTopVar,
    /// A malformed lexeme reached the parser.
    UnexpectedLexeme,
}

impl DiagnosticTag {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticTag::ExpectedTopLevelDecl => "expected_top_level_decl",
            DiagnosticTag::ExpectedExpression => "expected_expression",
            DiagnosticTag::ExpectedLexeme => "expected_lexeme",
            DiagnosticTag::UndelimitedTopVar => "undelimited_top_var",
            DiagnosticTag::UnexpectedLexeme => "unexpected_lexeme",
        }
    }
}

impl fmt::Display for DiagnosticTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    pub tag: DiagnosticTag,
    /// The lexeme the parser was looking at.
    pub lexi: LexemeIndex,
    pub expected: Option<Terminal>,
}

impl Diagnostic {
    /// Human readable message, given the terminal found at `lexi`.
    pub fn message(&self, found: Terminal) -> String {
        match (self.tag, self.expected) {
            (DiagnosticTag::ExpectedTopLevelDecl, _) => {
                format!("expected a top-level declaration, found {found}")
            }
            (DiagnosticTag::ExpectedExpression, _) => format!("expected expression, found {found}"),
            (DiagnosticTag::ExpectedLexeme, Some(expected)) => {
                format!("expected {expected}, found {found}")
            }
            (DiagnosticTag::ExpectedLexeme, None) => format!("unexpected {found}"),
            (DiagnosticTag::UndelimitedTopVar, _) => {
                format!("expected ';' after top-level variable declaration, found {found}")
            }
            (DiagnosticTag::UnexpectedLexeme, _) => format!("unexpected {found}"),
        }
    }
}

/// Decoded `module` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleView<'a> {
    pub decls: &'a [NodeIndex],
}

/// Decoded `var_decl` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarDeclView<'a> {
    pub exprs: &'a [NodeIndex],
    pub identifiers: &'a [LexemeIndex],
    /// Declared with a leading `pub`.
    pub is_public: bool,
}

/// Decoded binary operator node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinOpView {
    pub op: Symbol,
    pub lhs: NodeIndex,
    pub rhs: NodeIndex,
}

/// Decoded `typed_expr` node: `expr : ty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedExprView {
    pub expr: NodeIndex,
    pub ty: NodeIndex,
}

/// Decoded `name` node: `ns::ns::field.field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameView<'a> {
    pub namespaces: &'a [LexemeIndex],
    pub fields: &'a [LexemeIndex],
    /// The path starts at `this`, spelled out or as a leading `.`.
    pub implicit_this: bool,
}

/// The result of one parse: node table, lexeme table, data array and
/// diagnostics. Check `diagnostics.is_empty()` before trusting the tree for
/// semantic use; it is navigable either way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseTree {
    pub nodes: NodeTable,
    pub lexemes: LexemeTable,
    pub(crate) data: Vec<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseTree {
    pub fn symbol(&self, nodi: NodeIndex) -> Symbol {
        self.nodes.symbol(nodi)
    }

    /// Terminal of the lexeme that defines `nodi`.
    pub fn terminal(&self, nodi: NodeIndex) -> Terminal {
        self.lexemes.terminal(self.nodes.lexi(nodi))
    }

    /// Source text of a lexeme.
    pub fn lexeme_text<'s>(&self, source: &'s [u8], lexi: LexemeIndex) -> Cow<'s, str> {
        String::from_utf8_lossy(self.lexemes.span(lexi).slice(source))
    }

    pub fn as_module(&self, nodi: NodeIndex) -> ModuleView<'_> {
        let node = self.expect_symbol(nodi, Symbol::Module);
        let (decls, _) = self.run(node.offset);
        ModuleView { decls }
    }

    pub fn as_vardecl(&self, nodi: NodeIndex) -> VarDeclView<'_> {
        let node = self.expect_symbol(nodi, Symbol::VarDecl);
        let (exprs, next) = self.run(node.offset);
        let (identifiers, _) = self.run(next);
        let is_public = node.lexi > 0 && self.lexemes.terminal(node.lexi - 1) == Terminal::Pub;
        VarDeclView {
            exprs,
            identifiers,
            is_public,
        }
    }

    pub fn as_binop(&self, nodi: NodeIndex) -> BinOpView {
        let node = self.nodes.get(nodi);
        assert!(
            node.symbol.is_binary(),
            "node {nodi} is {}, not a binary operator",
            node.symbol
        );
        let [lhs, rhs] = self.pair(node.offset);
        BinOpView {
            op: node.symbol,
            lhs,
            rhs,
        }
    }

    pub fn as_typed_expr(&self, nodi: NodeIndex) -> TypedExprView {
        let node = self.expect_symbol(nodi, Symbol::TypedExpr);
        let [expr, ty] = self.pair(node.offset);
        TypedExprView { expr, ty }
    }

    pub fn as_name(&self, nodi: NodeIndex) -> NameView<'_> {
        let node = self.expect_symbol(nodi, Symbol::Name);
        let (namespaces, next) = self.run(node.offset);
        let (fields, _) = self.run(next);
        let implicit_this = matches!(self.lexemes.terminal(node.lexi), Terminal::This | Terminal::Dot);
        NameView {
            namespaces,
            fields,
            implicit_this,
        }
    }

    /// Child nodes of `nodi` in source order. Lexeme payloads (identifiers,
    /// path segments) are not nodes and are not included.
    pub fn children(&self, nodi: NodeIndex) -> &[NodeIndex] {
        let node = self.nodes.get(nodi);
        match node.symbol {
            Symbol::Module => self.as_module(nodi).decls,
            Symbol::VarDecl => self.as_vardecl(nodi).exprs,
            Symbol::TypedExpr => &self.data[node.offset..node.offset + 2],
            symbol if symbol.is_binary() => &self.data[node.offset..node.offset + 2],
            _ => &[],
        }
    }

    fn expect_symbol(&self, nodi: NodeIndex, symbol: Symbol) -> Node {
        let node = self.nodes.get(nodi);
        assert_eq!(node.symbol, symbol, "node {nodi} has the wrong symbol");
        node
    }

    /// Read a count-prefixed run starting at `offset`; returns the run and the
    /// offset just past it.
    fn run(&self, offset: DataIndex) -> (&[usize], DataIndex) {
        let count = self.data[offset];
        let start = offset + 1;
        (&self.data[start..start + count], start + count)
    }

    fn pair(&self, offset: DataIndex) -> [usize; 2] {
        [self.data[offset], self.data[offset + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_terminal_alignment() {
        let pairs = [
            (Terminal::LiteralInt, Symbol::LiteralInt),
            (Terminal::LiteralFloat, Symbol::LiteralFloat),
            (Terminal::LiteralString, Symbol::LiteralString),
            (Terminal::LiteralChar, Symbol::LiteralChar),
            (Terminal::LiteralTrue, Symbol::LiteralTrue),
            (Terminal::LiteralFalse, Symbol::LiteralFalse),
            (Terminal::Plus, Symbol::Add),
            (Terminal::Minus, Symbol::Sub),
            (Terminal::Star, Symbol::Mul),
            (Terminal::Slash, Symbol::Div),
            (Terminal::Percent, Symbol::Mod),
            (Terminal::EqualEqual, Symbol::Eq),
            (Terminal::BangEqual, Symbol::Ne),
            (Terminal::Less, Symbol::Lt),
            (Terminal::LessEqual, Symbol::Le),
            (Terminal::Greater, Symbol::Gt),
            (Terminal::GreaterEqual, Symbol::Ge),
            (Terminal::AmpAmp, Symbol::And),
            (Terminal::PipePipe, Symbol::Or),
            (Terminal::Amp, Symbol::BitAnd),
            (Terminal::Pipe, Symbol::BitOr),
            (Terminal::Caret, Symbol::BitXor),
            (Terminal::LessLess, Symbol::Shl),
            (Terminal::GreaterGreater, Symbol::Shr),
        ];
        for (terminal, symbol) in pairs {
            assert_eq!(Symbol::from_terminal(terminal), Some(symbol), "{terminal:?}");
        }
    }

    #[test]
    fn test_symbol_table_order() {
        for (i, symbol) in Symbol::ALL.iter().enumerate() {
            assert_eq!(*symbol as usize, i);
        }
    }

    #[test]
    fn test_non_operator_terminals_have_no_symbol() {
        for terminal in [Terminal::Equal, Terminal::Identifier, Terminal::Let, Terminal::Eof, Terminal::Error] {
            assert_eq!(Symbol::from_terminal(terminal), None);
        }
    }

    #[test]
    fn test_range_checks() {
        assert!(Symbol::LiteralString.is_literal());
        assert!(!Symbol::Name.is_literal());
        assert!(!Symbol::Add.is_literal());
        assert!(Symbol::Add.is_binary());
        assert!(Symbol::Shr.is_binary());
        assert!(!Symbol::LiteralFalse.is_binary());
        assert!(!Symbol::TypedExpr.is_binary());
    }

    #[test]
    fn test_diagnostic_message() {
        let diagnostic = Diagnostic {
            tag: DiagnosticTag::ExpectedLexeme,
            lexi: 3,
            expected: Some(Terminal::RParen),
        };
        assert_eq!(diagnostic.message(Terminal::Semicolon), "expected ')', found ';'");
        assert_eq!(DiagnosticTag::UndelimitedTopVar.to_string(), "undelimited_top_var");
    }

    #[test]
    #[should_panic(expected = "wrong symbol")]
    fn test_decoder_rejects_wrong_symbol() {
        let tree = crate::parser::parse::parse(b"let a = 1;").unwrap();
        let decl = tree.as_module(ROOT_NODE).decls[0];
        tree.as_name(decl);
    }
}
