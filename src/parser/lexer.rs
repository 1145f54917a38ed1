//! Lexer (tokenizer) for Sprig source code
//!
//! Converts a raw byte source into a flat stream of [`Lexeme`]s consumed by
//! the parser. The lexer never fails: malformed input becomes a lexeme
//! carrying one of the `Invalid*` [`Terminal`] kinds, so the parser can treat
//! lexical errors as ordinary unexpected tokens.

use rustc_hash::FxHashMap;
use std::fmt;

/// All token kinds produced by the lexer.
///
/// The literal block and the binary operator block must stay in the same
/// order as the matching blocks of [`Symbol`](super::ast::Symbol):
/// literal and operator symbols are derived from their terminal by a fixed
/// offset.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    // Literals
    LiteralInt,
    LiteralFloat,
    LiteralString,
    LiteralChar,
    LiteralTrue,
    LiteralFalse,

    // Binary operators, loosely grouped by precedence
    Plus,           // +
    Minus,          // -
    Star,           // *
    Slash,          // /
    Percent,        // %
    EqualEqual,     // ==
    BangEqual,      // !=
    Less,           // <
    LessEqual,      // <=
    Greater,        // >
    GreaterEqual,   // >=
    AmpAmp,         // &&
    PipePipe,       // ||
    Amp,            // &
    Pipe,           // |
    Caret,          // ^
    LessLess,       // <<
    GreaterGreater, // >>

    // Punctuation
    Equal,      // =
    Bang,       // !
    Tilde,      // ~
    Question,   // ?
    Arrow,      // ->
    Comma,      // ,
    Semicolon,  // ;
    Colon,      // :
    ColonColon, // ::
    Dot,        // .
    LParen,     // (
    RParen,     // )
    LBracket,   // [
    RBracket,   // ]
    LBrace,     // {
    RBrace,     // }

    Identifier,

    // Keywords
    Let,
    Const,
    Fn,
    Type,
    Struct,
    Interface,
    Enum,
    If,
    Else,
    For,
    While,
    Switch,
    Case,
    Default,
    Return,
    Break,
    Continue,
    Pub,
    Mod,
    Use,
    This,

    // Structural
    Eof,
    /// Reserved for the sentinel lexeme at index 0.
    Error,

    // Malformed input
    InvalidCharacter,
    InvalidCarriageReturn,
    InvalidLeadingZero,
    InvalidDigit,
    InvalidRepeatedSeparator,
    InvalidSeparatorPeriod,
    InvalidExtraPeriod,
    InvalidTrailingSeparator,
    InvalidUnterminatedString,
    InvalidUnterminatedChar,
}

impl Terminal {
    pub fn is_literal(self) -> bool {
        (Terminal::LiteralInt as u8..=Terminal::LiteralFalse as u8).contains(&(self as u8))
    }

    pub fn is_binary_operator(self) -> bool {
        (Terminal::Plus as u8..=Terminal::GreaterGreater as u8).contains(&(self as u8))
    }

    pub fn is_invalid(self) -> bool {
        self as u8 >= Terminal::InvalidCharacter as u8
    }

    /// Binding power of a binary operator; higher binds tighter.
    ///
    /// Precedence 1 is reserved for the `:` type annotation and 0 is the
    /// threshold of a fresh expression, so every operator starts above both.
    pub fn binary_precedence(self) -> Option<u8> {
        let prec = match self {
            Terminal::PipePipe => 2,
            Terminal::AmpAmp => 3,
            Terminal::EqualEqual
            | Terminal::BangEqual
            | Terminal::Less
            | Terminal::LessEqual
            | Terminal::Greater
            | Terminal::GreaterEqual => 4,
            Terminal::Pipe => 5,
            Terminal::Caret => 6,
            Terminal::Amp => 7,
            Terminal::LessLess | Terminal::GreaterGreater => 8,
            Terminal::Plus | Terminal::Minus => 9,
            Terminal::Star | Terminal::Slash | Terminal::Percent => 10,
            _ => return None,
        };
        Some(prec)
    }

    /// Keywords that can begin a top-level declaration. Panic-mode recovery
    /// resynchronizes on these.
    pub fn starts_declaration(self) -> bool {
        matches!(
            self,
            Terminal::Let
                | Terminal::Const
                | Terminal::Fn
                | Terminal::Type
                | Terminal::Struct
                | Terminal::Interface
                | Terminal::Enum
                | Terminal::Pub
                | Terminal::Mod
                | Terminal::Use
        )
    }

    pub fn is_opening_delimiter(self) -> bool {
        matches!(self, Terminal::LParen | Terminal::LBracket | Terminal::LBrace)
    }

    pub fn is_closing_delimiter(self) -> bool {
        matches!(self, Terminal::RParen | Terminal::RBracket | Terminal::RBrace)
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Terminal::LiteralInt => "integer literal",
            Terminal::LiteralFloat => "float literal",
            Terminal::LiteralString => "string literal",
            Terminal::LiteralChar => "char literal",
            Terminal::LiteralTrue => "'true'",
            Terminal::LiteralFalse => "'false'",
            Terminal::Plus => "'+'",
            Terminal::Minus => "'-'",
            Terminal::Star => "'*'",
            Terminal::Slash => "'/'",
            Terminal::Percent => "'%'",
            Terminal::EqualEqual => "'=='",
            Terminal::BangEqual => "'!='",
            Terminal::Less => "'<'",
            Terminal::LessEqual => "'<='",
            Terminal::Greater => "'>'",
            Terminal::GreaterEqual => "'>='",
            Terminal::AmpAmp => "'&&'",
            Terminal::PipePipe => "'||'",
            Terminal::Amp => "'&'",
            Terminal::Pipe => "'|'",
            Terminal::Caret => "'^'",
            Terminal::LessLess => "'<<'",
            Terminal::GreaterGreater => "'>>'",
            Terminal::Equal => "'='",
            Terminal::Bang => "'!'",
            Terminal::Tilde => "'~'",
            Terminal::Question => "'?'",
            Terminal::Arrow => "'->'",
            Terminal::Comma => "','",
            Terminal::Semicolon => "';'",
            Terminal::Colon => "':'",
            Terminal::ColonColon => "'::'",
            Terminal::Dot => "'.'",
            Terminal::LParen => "'('",
            Terminal::RParen => "')'",
            Terminal::LBracket => "'['",
            Terminal::RBracket => "']'",
            Terminal::LBrace => "'{'",
            Terminal::RBrace => "'}'",
            Terminal::Identifier => "identifier",
            Terminal::Let => "'let'",
            Terminal::Const => "'const'",
            Terminal::Fn => "'fn'",
            Terminal::Type => "'type'",
            Terminal::Struct => "'struct'",
            Terminal::Interface => "'interface'",
            Terminal::Enum => "'enum'",
            Terminal::If => "'if'",
            Terminal::Else => "'else'",
            Terminal::For => "'for'",
            Terminal::While => "'while'",
            Terminal::Switch => "'switch'",
            Terminal::Case => "'case'",
            Terminal::Default => "'default'",
            Terminal::Return => "'return'",
            Terminal::Break => "'break'",
            Terminal::Continue => "'continue'",
            Terminal::Pub => "'pub'",
            Terminal::Mod => "'mod'",
            Terminal::Use => "'use'",
            Terminal::This => "'this'",
            Terminal::Eof => "end of file",
            Terminal::Error => "<error>",
            Terminal::InvalidCharacter => "invalid character",
            Terminal::InvalidCarriageReturn => "carriage return without newline",
            Terminal::InvalidLeadingZero => "number with a leading zero",
            Terminal::InvalidDigit => "non-decimal digit in number",
            Terminal::InvalidRepeatedSeparator => "repeated digit separator",
            Terminal::InvalidSeparatorPeriod => "digit separator before period",
            Terminal::InvalidExtraPeriod => "extra period in float",
            Terminal::InvalidTrailingSeparator => "trailing digit separator",
            Terminal::InvalidUnterminatedString => "unterminated string literal",
            Terminal::InvalidUnterminatedChar => "unterminated char literal",
        };
        f.write_str(text)
    }
}

/// Half-open byte range into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The bytes this span covers, or an empty slice when the span does not
    /// belong to `source`.
    pub fn slice<'s>(&self, source: &'s [u8]) -> &'s [u8] {
        source.get(self.start..self.end).unwrap_or(&[])
    }
}

/// One scanned token: its kind and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub terminal: Terminal,
    pub span: Span,
}

/// 1-based line and column, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Locate a byte offset. Columns count bytes.
    pub fn from_offset(source: &[u8], offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |nl| nl + 1);
        Self::new(line, offset - line_start + 1)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

fn keyword_table() -> FxHashMap<&'static [u8], Terminal> {
    let entries: [(&'static [u8], Terminal); 23] = [
        (b"let", Terminal::Let),
        (b"const", Terminal::Const),
        (b"fn", Terminal::Fn),
        (b"type", Terminal::Type),
        (b"struct", Terminal::Struct),
        (b"interface", Terminal::Interface),
        (b"enum", Terminal::Enum),
        (b"if", Terminal::If),
        (b"else", Terminal::Else),
        (b"for", Terminal::For),
        (b"while", Terminal::While),
        (b"switch", Terminal::Switch),
        (b"case", Terminal::Case),
        (b"default", Terminal::Default),
        (b"return", Terminal::Return),
        (b"break", Terminal::Break),
        (b"continue", Terminal::Continue),
        (b"pub", Terminal::Pub),
        (b"mod", Terminal::Mod),
        (b"use", Terminal::Use),
        (b"this", Terminal::This),
        (b"true", Terminal::LiteralTrue),
        (b"false", Terminal::LiteralFalse),
    ];
    entries.into_iter().collect()
}

/// Lexer for Sprig source code.
///
/// Yields every lexeme of the source followed by exactly one
/// [`Terminal::Eof`], then `None`.
pub struct Lexer<'a> {
    source: &'a [u8],
    position: usize,
    keywords: FxHashMap<&'static [u8], Terminal>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source bytes.
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            position: 0,
            keywords: keyword_table(),
            finished: false,
        }
    }

    fn next_lexeme(&mut self) -> Lexeme {
        let start = self.position;
        let Some(byte) = self.advance() else {
            return Lexeme {
                terminal: Terminal::Eof,
                span: Span::new(start, start),
            };
        };

        let terminal = match byte {
            b'\r' => Terminal::InvalidCarriageReturn,
            b'"' => self.quoted(b'"', Terminal::LiteralString, Terminal::InvalidUnterminatedString),
            b'\'' => self.quoted(b'\'', Terminal::LiteralChar, Terminal::InvalidUnterminatedChar),
            b'0'..=b'9' => self.number(byte),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier_or_keyword(start),

            b'+' => Terminal::Plus,
            b'*' => Terminal::Star,
            b'/' => Terminal::Slash,
            b'%' => Terminal::Percent,
            b'^' => Terminal::Caret,
            b'~' => Terminal::Tilde,
            b'?' => Terminal::Question,
            b',' => Terminal::Comma,
            b';' => Terminal::Semicolon,
            b'.' => Terminal::Dot,
            b'(' => Terminal::LParen,
            b')' => Terminal::RParen,
            b'[' => Terminal::LBracket,
            b']' => Terminal::RBracket,
            b'{' => Terminal::LBrace,
            b'}' => Terminal::RBrace,
            b'-' => self.either(b'>', Terminal::Arrow, Terminal::Minus),
            b'=' => self.either(b'=', Terminal::EqualEqual, Terminal::Equal),
            b'!' => self.either(b'=', Terminal::BangEqual, Terminal::Bang),
            b':' => self.either(b':', Terminal::ColonColon, Terminal::Colon),
            b'&' => self.either(b'&', Terminal::AmpAmp, Terminal::Amp),
            b'|' => self.either(b'|', Terminal::PipePipe, Terminal::Pipe),
            b'<' => {
                if self.eat(b'=') {
                    Terminal::LessEqual
                } else {
                    self.either(b'<', Terminal::LessLess, Terminal::Less)
                }
            }
            b'>' => {
                if self.eat(b'=') {
                    Terminal::GreaterEqual
                } else {
                    self.either(b'>', Terminal::GreaterGreater, Terminal::Greater)
                }
            }

            _ => {
                // Swallow the rest of a multi-byte UTF-8 sequence.
                while self.peek().is_some_and(|b| b & 0xC0 == 0x80) {
                    self.advance();
                }
                Terminal::InvalidCharacter
            }
        };

        Lexeme {
            terminal,
            span: Span::new(start, self.position),
        }
    }

    /// Consume `second` if it is next and pick the two-byte terminal.
    fn either(&mut self, second: u8, matched: Terminal, single: Terminal) -> Terminal {
        if self.eat(second) {
            matched
        } else {
            single
        }
    }

    fn quoted(&mut self, quote: u8, ok: Terminal, unterminated: Terminal) -> Terminal {
        while let Some(byte) = self.peek() {
            match byte {
                b'\n' => return unterminated,
                b'\\' => {
                    self.advance();
                    if self.peek().is_some_and(|b| b != b'\n') {
                        self.advance();
                    }
                }
                _ => {
                    self.advance();
                    if byte == quote {
                        return ok;
                    }
                }
            }
        }
        unterminated
    }

    /// Scan a numeric literal. The whole run of digits, letters, separators
    /// and in-number periods is consumed; the first anomaly decides the kind.
    fn number(&mut self, first: u8) -> Terminal {
        let mut error = None;
        if first == b'0' && self.peek().is_some_and(|b| b.is_ascii_digit() || b == b'_') {
            error = Some(Terminal::InvalidLeadingZero);
        }

        let mut is_float = false;
        let mut last_separator = false;
        while let Some(byte) = self.peek() {
            match byte {
                b'0'..=b'9' => last_separator = false,
                b'_' => {
                    if last_separator {
                        error.get_or_insert(Terminal::InvalidRepeatedSeparator);
                    }
                    last_separator = true;
                }
                b'.' => {
                    let digit_follows = self.peek_ahead(1).is_some_and(|b| b.is_ascii_digit());
                    if last_separator {
                        error.get_or_insert(Terminal::InvalidSeparatorPeriod);
                    } else if !digit_follows {
                        break;
                    } else if is_float {
                        error.get_or_insert(Terminal::InvalidExtraPeriod);
                    }
                    is_float = true;
                    last_separator = false;
                }
                b'a'..=b'z' | b'A'..=b'Z' => {
                    error.get_or_insert(Terminal::InvalidDigit);
                    last_separator = false;
                }
                _ => break,
            }
            self.advance();
        }

        if last_separator {
            error.get_or_insert(Terminal::InvalidTrailingSeparator);
        }

        match error {
            Some(invalid) => invalid,
            None if is_float => Terminal::LiteralFloat,
            None => Terminal::LiteralInt,
        }
    }

    fn identifier_or_keyword(&mut self, start: usize) -> Terminal {
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.advance();
        }

        let text = &self.source[start..self.position];
        self.keywords
            .get(text)
            .copied()
            .unwrap_or(Terminal::Identifier)
    }

    /// Skip whitespace and comments. A lone carriage return is left in place
    /// so it can be reported.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\n') => {
                    self.advance();
                }
                Some(b'\r') if self.peek_ahead(1) == Some(b'\n') => {
                    self.position += 2;
                }
                Some(b'/') if self.peek_ahead(1) == Some(b'/') => {
                    while self.peek().is_some_and(|b| b != b'\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<u8> {
        self.source.get(self.position + n).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.position += 1;
        Some(byte)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Lexeme;

    fn next(&mut self) -> Option<Lexeme> {
        if self.finished {
            return None;
        }
        self.skip_trivia();
        let lexeme = self.next_lexeme();
        if lexeme.terminal == Terminal::Eof {
            self.finished = true;
        }
        Some(lexeme)
    }
}
