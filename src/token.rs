use std::{fmt, ops::Range};

use crate::lexer;

#[derive(Copy, Clone)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct Token {
    pub kind: TokenKind,
    span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token { kind, span }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Returns the lexeme of this token.
    pub fn text<'src>(&self, src: &'src str) -> &'src str {
        self.span.substr(src)
    }

    pub fn wrap<T>(&self, inner: T) -> Spanned<T> {
        self.span.wrap(inner)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.span)
    }
}

/// A 1-based line and column pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const START: Position = Position { line: 1, column: 1 };
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Span {
    pub len: u32,
    pub lo: usize,
    /// Position of the first character.
    pub pos: Position,
}

impl Span {
    pub fn new_of_bounds(Range { start: lo, end: hi }: Range<usize>, pos: Position) -> Span {
        debug_assert!(hi >= lo);
        Self::new_of_length(lo, u32::try_from(hi - lo).unwrap(), pos)
    }

    pub fn new_of_length(lo: usize, len: u32, pos: Position) -> Span {
        Span { len, lo, pos }
    }

    pub fn hi(&self) -> usize {
        self.lo + self.len as usize
    }

    pub fn range(&self) -> Range<usize> {
        self.lo..self.hi()
    }

    pub fn substr<'src>(&self, src: &'src str) -> &'src str {
        &src[self.range()]
    }

    /// Returns a span which starts at `self` and ends at `other`.
    pub fn to(&self, other: Span) -> Span {
        debug_assert!(other.hi() >= self.lo);
        Span::new_of_bounds(self.lo..other.hi(), self.pos)
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { span: self, inner }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, len: {}, at {})", self.len, self.pos)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = self.hi();
        write!(f, "{lo}..{hi}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub inner: T,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// `dikha_bhai`
    Print,
    /// `dekh`
    Function,
    /// `wapas.kro`
    Return,
    /// `aur`
    And,
    /// `ya`
    Or,
    /// `khali`, the none literal.
    Khali,

    Number,
    String,
    Float,
    Boolean,

    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,

    Identifier,
    Eof,
    Error(lexer::Error),
}

impl TokenKind {
    pub fn is_error(&self) -> bool {
        matches!(self, TokenKind::Error(_))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let s = match self {
            Print => "`dikha_bhai`",
            Function => "`dekh`",
            Return => "`wapas.kro`",
            And => "`aur`",
            Or => "`ya`",
            Khali => "`khali`",
            Number => "number",
            String => "string",
            Float => "float",
            Boolean => "boolean",
            LParen => "`(`",
            RParen => "`)`",
            LBrace => "`{`",
            RBrace => "`}`",
            Comma => "`,`",
            Identifier => "identifier",
            Eof => "end of input",
            Error(_) => "invalid token",
        };
        f.write_str(s)
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "dikha_bhai" => TokenKind::Print,
    "dikha" => TokenKind::Print,
    "bhai" => TokenKind::Print,
    "dekh" => TokenKind::Function,
    "wapas.kro" => TokenKind::Return,
    "aur" => TokenKind::And,
    "ya" => TokenKind::Or,
    "khali" => TokenKind::Khali,
    "true" => TokenKind::Boolean,
    "false" => TokenKind::Boolean,
};
