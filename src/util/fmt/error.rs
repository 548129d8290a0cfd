use std::fmt;

use crate::{
    codegen, gc, lexer,
    parser::{self, Production},
    pipeline,
    token::{Spanned, TokenKind},
};

impl fmt::Display for Spanned<parser::Error> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Spanned { span, inner: error } = self;

        if f.alternate() {
            write!(f, "{}: ", span.pos)?;
        }

        use parser::Error::*;
        match error {
            UnexpectedToken {
                expected,
                actual,
                lexeme,
            } => {
                let expected = match expected {
                    Production::Statement => "a statement",
                    Production::Expression => "an expression",
                };
                let actual = Found(*actual, lexeme);
                write!(f, "expected {expected}, but got {actual}")
            }
            MissingExpectedToken {
                expected,
                actual,
                lexeme,
            } => {
                let actual = Found(*actual, lexeme);
                write!(f, "expected {expected}, but got {actual}")
            }
            Lexer(error) => write!(f, "{error}"),
        }
    }
}

impl fmt::Display for Spanned<codegen::Error> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Spanned { span, inner: error } = self;

        if f.alternate() {
            write!(f, "{}: ", span.pos)?;
        }

        use codegen::Error::*;
        match error {
            MalformedLiteral { raw } => write!(f, "malformed number literal `{raw}`"),
            UnlowerableType { name } => write!(f, "cannot lower parameter type `{name}`"),
            MissingValue => write!(f, "expression produced no value"),
            InvalidOperands { op, lhs, rhs } => {
                write!(f, "invalid operands to `{op}`: {lhs} and {rhs}")
            }
            DuplicateFunction { name } => write!(f, "function `{name}` is already defined"),
            DuplicateParameter { name } => write!(f, "parameter `{name}` is already defined"),
        }
    }
}

impl fmt::Display for lexer::Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            lexer::Error::UnterminatedString => "unterminated string",
            lexer::Error::UnexpectedCharacter => "unexpected character",
            lexer::Error::UnterminatedComment => "unterminated block comment",
        })
    }
}

impl fmt::Display for gc::Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            gc::Error::OutOfMemory { size } => {
                write!(f, "out of memory while allocating {size} bytes")
            }
        }
    }
}

impl std::error::Error for gc::Error {}

impl fmt::Display for pipeline::Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            pipeline::Error::Parse(error) => fmt::Display::fmt(error, f),
            pipeline::Error::Codegen(error) => fmt::Display::fmt(error, f),
        }
    }
}

impl std::error::Error for pipeline::Error {}

/// The offending token, with its lexeme when the kind alone is ambiguous.
struct Found<'a>(TokenKind, &'a str);

impl fmt::Display for Found<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Found(kind, lexeme) = *self;
        match kind {
            TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::String
            | TokenKind::Float
            | TokenKind::Boolean => write!(f, "{kind} `{lexeme}`"),
            _ => write!(f, "{kind}"),
        }
    }
}
