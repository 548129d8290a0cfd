use std::str::Chars;

use crate::token::{Position, Span, Token, TokenKind, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 8_192;

/// Opens and closes a block comment.
const BLOCK_COMMENT_FENCE: &str = "mt-padh!";

/// A convenience function that lexes the whole input, up to and including the
/// first [`TokenKind::Eof`].
pub fn lex_in_new(src: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    tokens.extend(Lexer::new(src));
    tokens
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnterminatedString,
    UnexpectedCharacter,
    UnterminatedComment,
}

/// The awara lexer.
///
/// Tokens are produced on demand through [`Lexer::next_token`]. Once the input
/// is exhausted, every further call returns an [`TokenKind::Eof`] token.
///
/// As an [`Iterator`], the lexer stops right after yielding the first `Eof`.
pub struct Lexer<'src> {
    src: &'src str,
    iter: Chars<'src>,
    cursor: usize,
    pos: Position,
    current_lo: usize,
    current_pos: Position,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Lexer<'src> {
        Lexer {
            src,
            iter: src.chars(),
            cursor: 0,
            pos: Position::START,
            current_lo: 0,
            current_pos: Position::START,
            finished: false,
        }
    }

    /// Skips whitespace and comments, then scans the next token.
    pub fn next_token(&mut self) -> Token {
        if let Err(error) = self.skip_trivia() {
            return self.produce(TokenKind::Error(error));
        }
        self.mark();
        let kind = self.scan_token_kind();
        self.produce(kind)
    }

    fn scan_token_kind(&mut self) -> TokenKind {
        use TokenKind::*;
        if self.is_at_end() {
            return Eof;
        }
        match self.advance() {
            '(' => LParen,
            ')' => RParen,
            '{' => LBrace,
            '}' => RBrace,
            ',' => Comma,
            '"' => self.string(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier_or_keyword(),
            c if c.is_ascii_digit() => self.number(),
            _ => Error(self::Error::UnexpectedCharacter),
        }
    }

    /// Scans up to the closing quotation mark. A backslash escapes the next
    /// character, so `\"` doesn't close the string. Escapes are kept verbatim
    /// in the lexeme; see [`unescape`].
    fn string(&mut self) -> TokenKind {
        let mut is_escaping = false;
        loop {
            if self.is_at_end() {
                return TokenKind::Error(Error::UnterminatedString);
            }
            match (is_escaping, self.advance()) {
                (false, '"') => return TokenKind::String,
                (false, '\\') => is_escaping = true,
                (_, _) => is_escaping = false,
            }
        }
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        let valid_identifier_suffix = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.';

        while valid_identifier_suffix(self.peek()) {
            self.advance();
        }
        KEYWORDS
            .get(self.substr())
            .copied()
            .unwrap_or(TokenKind::Identifier)
    }

    /// A `.` only continues the literal (as a float) if a digit follows it.
    /// Otherwise it is left for the next scan.
    fn number(&mut self) -> TokenKind {
        self.digits();
        if self.peek() == '.' && self.peek_second().is_ascii_digit() {
            self.advance();
            self.digits();
            return TokenKind::Float;
        }
        TokenKind::Number
    }

    fn digits(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
    }

    fn skip_trivia(&mut self) -> Result<(), Error> {
        loop {
            match self.peek() {
                c if c.is_ascii_whitespace() => {
                    self.advance();
                }
                '/' if self.peek_second() == '/' => self.line_comment(),
                _ if self.rest().starts_with(BLOCK_COMMENT_FENCE) => self.block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn block_comment(&mut self) -> Result<(), Error> {
        self.mark();
        self.advance_by(BLOCK_COMMENT_FENCE.len());
        loop {
            if self.is_at_end() {
                return Err(Error::UnterminatedComment);
            }
            if self.rest().starts_with(BLOCK_COMMENT_FENCE) {
                self.advance_by(BLOCK_COMMENT_FENCE.len());
                return Ok(());
            }
            self.advance();
        }
    }
}

impl Lexer<'_> {
    /// Starts a new token "mark".
    fn mark(&mut self) {
        self.current_lo = self.cursor;
        self.current_pos = self.pos;
    }

    /// Returns the next character and advances the iterator, keeping track of
    /// line and column.
    fn advance(&mut self) -> char {
        let Some(c) = self.iter.next() else {
            return '\0';
        };
        self.cursor += c.len_utf8();
        if c == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        c
    }

    /// Advances over `n` bytes of ASCII text.
    fn advance_by(&mut self, n: usize) {
        let target = self.cursor + n;
        while self.cursor < target {
            self.advance();
        }
    }

    /// Returns the next character without advancing the iterator.
    fn peek(&self) -> char {
        self.iter.clone().next().unwrap_or('\0')
    }

    /// Returns the character after the next one without advancing.
    fn peek_second(&self) -> char {
        self.iter.clone().nth(1).unwrap_or('\0')
    }

    fn is_at_end(&self) -> bool {
        self.cursor >= self.src.len()
    }

    /// Returns the not yet scanned input.
    fn rest(&self) -> &str {
        &self.src[self.cursor..]
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(self.current_lo..self.cursor, self.current_pos)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        &self.src[self.current_lo..self.cursor]
    }

    /// Produces a token using the marked bounds.
    fn produce(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.span())
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        self.finished = token.is_eof();
        Some(token)
    }
}

pub mod extract {
    use super::*;

    /// Returns the string literal's contents, without the quotes. Escape
    /// sequences are left untouched.
    pub fn string(token: Token, src: &str) -> &str {
        debug_assert_eq!(token.kind, TokenKind::String);
        let text = token.text(src);
        &text[1..text.len() - 1]
    }
}

/// Performs the escape sequences of a raw string literal.
pub fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    let mut buf = String::with_capacity(raw.len());
    let mut escaped = false;
    for char in raw.chars() {
        let char = match (escaped, char) {
            (true, 'b') => '\x08', // backspace
            (true, 't') => '\t',   // tab
            (true, 'n') => '\n',   // newline
            (true, 'f') => '\x0c', // form feed
            (false, '\\') => {
                escaped = true;
                continue;
            }
            (_, char) => char,
        };
        escaped = false;
        buf.push(char);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_demo_program_no_errors() {
        let input = include_str!("../demos/big.awara");
        let has_errors = lex_in_new(input).into_iter().any(|t| t.kind.is_error());
        assert!(!has_errors);
    }

    #[test]
    fn tests_with_span() {
        use TokenKind::*;
        let cases = cases!(match .. {
            "(){}," => [
                (LParen, 0..1),
                (RParen, 1..2),
                (LBrace, 2..3),
                (RBrace, 3..4),
                (Comma, 4..5),
                (Eof, 5..5),
            ],
            "dikha_bhai dikha bhai dekh wapas.kro aur ya khali" => [
                (Print, 0..10),
                (Print, 11..16),
                (Print, 17..21),
                (Function, 22..26),
                (Return, 27..36),
                (And, 37..40),
                (Or, 41..43),
                (Khali, 44..49),
                (Eof, 49..49),
            ],
            "true false True khali_ wapas _x a.b.c int" => [
                (Boolean, 0..4),
                (Boolean, 5..10),
                (Identifier, 11..15),
                (Identifier, 16..22),
                (Identifier, 23..28),
                (Identifier, 29..31),
                (Identifier, 32..37),
                (Identifier, 38..41),
                (Eof, 41..41),
            ],
            "1 12 007 123.45 0.5" => [
                (Number, 0..1),
                (Number, 2..4),
                (Number, 5..8),
                (Float, 9..15),
                (Float, 16..19),
                (Eof, 19..19),
            ],
            "123." => [
                (Number, 0..3),
                (Error(self::Error::UnexpectedCharacter), 3..4),
                (Eof, 4..4),
            ],
            "12.x" => [
                (Number, 0..2),
                (Error(self::Error::UnexpectedCharacter), 2..3),
                (Identifier, 3..4),
                (Eof, 4..4),
            ],
            r#""" "oi bhai" "a\"b" "\\""# => [
                (String, 0..2),
                (String, 3..12),
                (String, 13..19),
                (String, 20..24),
                (Eof, 24..24),
            ],
            r#"("abc"# => [
                (LParen, 0..1),
                (Error(self::Error::UnterminatedString), 1..5),
                (Eof, 5..5),
            ],
            "1 // comment (\n2 mt-padh! ( } \n \" mt-padh! 3" => [
                (Number, 0..1),
                (Number, 15..16),
                (Number, 43..44),
                (Eof, 44..44),
            ],
            "// only a comment" => [(Eof, 17..17)],
            "// a\0b\n1" => [(Number, 7..8), (Eof, 8..8)],
            "1 mt-padh! never closed" => [
                (Number, 0..1),
                (Error(self::Error::UnterminatedComment), 2..23),
                (Eof, 23..23),
            ],
            "a + b" => [
                (Identifier, 0..1),
                (Error(self::Error::UnexpectedCharacter), 2..3),
                (Identifier, 4..5),
                (Eof, 5..5),
            ],
        });

        for (input, expected) in cases {
            let lexed: Vec<_> = lex_in_new(input)
                .into_iter()
                .map(|t| (t.kind, t.span().range()))
                .collect();
            assert_eq!(&lexed, expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_float_text() {
        let src = "123.45";
        let tokens = lex_in_new(src);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].text(src), "123.45");
    }

    #[test]
    fn test_positions() {
        let src = "dikha_bhai 1\n  dekh f(\"a\nb\") }";
        let positions: Vec<_> = lex_in_new(src)
            .into_iter()
            .map(|t| (t.text(src).to_string(), t.span().pos.line, t.span().pos.column))
            .collect();
        let expected: Vec<_> = [
            ("dikha_bhai", 1, 1),
            ("1", 1, 12),
            ("dekh", 2, 3),
            ("f", 2, 8),
            ("(", 2, 9),
            ("\"a\nb\"", 2, 10),
            (")", 3, 3),
            ("}", 3, 5),
            ("", 3, 6),
        ]
        .into_iter()
        .map(|(s, l, c)| (s.to_string(), l, c))
        .collect();
        assert_eq!(positions, expected);
    }

    #[test]
    fn test_unexpected_character_position() {
        let tokens = lex_in_new("dikha_bhai 1\n   @");
        let error = tokens[2];
        assert_eq!(error.kind, TokenKind::Error(Error::UnexpectedCharacter));
        assert_eq!(error.span().pos, Position { line: 2, column: 4 });
    }

    #[test]
    fn test_eof_is_idempotent() {
        let mut lexer = Lexer::new("khali");
        assert_eq!(lexer.next_token().kind, TokenKind::Khali);
        for _ in 0..3 {
            let token = lexer.next_token();
            assert!(token.is_eof());
            assert_eq!(token.span().range(), 5..5);
        }
    }

    #[test]
    fn test_iterator_stops_after_eof() {
        let mut lexer = Lexer::new("1");
        assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::Number));
        assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::Eof));
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("plain"), "plain");
        assert_eq!(unescape(r"a\nb"), "a\nb");
        assert_eq!(unescape(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(unescape(r"back\\slash"), "back\\slash");
        assert_eq!(unescape(r"\q"), "q");
    }

    macro_rules! cases {
        (match .. {
            $($str:expr => [$(($kind:expr, $range:expr)),* $(,)?]),* $(,)?
        }) => {{
            &[$((
                $str,
                vec![$(($kind, $range)),*],
            )),*]
        }};
    }
    use cases;
}
