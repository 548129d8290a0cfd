use crate::{
    ast::{
        BinaryOperator, Expr, ExprKind, FunctionDecl, Ident, Literal, LiteralKind, Param, Print,
        Program, Stmt, TypeName,
    },
    lexer::{self, extract, Lexer},
    token::{Spanned, Token, TokenKind},
};

pub type ParseResult<T> = Result<T, Spanned<Error>>;

/// Parses a whole compilation unit. Fails on the first error.
pub fn parse_program(src: &str) -> ParseResult<Program> {
    let mut p = Parser::new(src)?;
    p.parse_program()
}

/// Parses a single expression, which must span the whole input.
pub fn parse_expr(src: &str) -> ParseResult<Expr> {
    let mut p = Parser::new(src)?;
    let expr = p.parse_expr()?;
    p.consume(TokenKind::Eof)?;
    Ok(expr)
}

struct Parser<'src> {
    src: &'src str,
    lexer: Lexer<'src>,
    /// The single token of lookahead.
    current: Token,
}

impl Parser<'_> {
    fn parse_program(&mut self) -> ParseResult<Program> {
        let mut stmts = Vec::with_capacity(16);
        while !self.is(TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Program { stmts })
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind {
            TokenKind::Print => self.parse_print().map(Stmt::Print),
            TokenKind::Function => self.parse_function().map(Stmt::Function),
            _ => Err(self.unexpected(Production::Statement)),
        }
    }

    fn parse_print(&mut self) -> ParseResult<Print> {
        let keyword = self.consume(TokenKind::Print)?;
        let expr = self.parse_expr()?;
        let span = keyword.span().to(expr.span);
        Ok(Print { expr, span })
    }

    fn parse_function(&mut self) -> ParseResult<FunctionDecl> {
        let keyword = self.consume(TokenKind::Function)?;
        let name = self.parse_ident()?;

        self.consume(TokenKind::LParen)?;
        let mut params = Vec::new();
        if self.is(TokenKind::Identifier) {
            loop {
                params.push(self.parse_param()?);
                if !self.take(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen)?;

        self.consume(TokenKind::LBrace)?;
        let mut body = Vec::new();
        let mut return_expr = None;
        while !self.is(TokenKind::RBrace) && !self.is(TokenKind::Eof) {
            // A return may only close the body.
            if self.take(TokenKind::Return)? {
                return_expr = Some(self.parse_expr()?);
                break;
            }
            body.push(self.parse_stmt()?);
        }
        let end = self.consume(TokenKind::RBrace)?;

        Ok(FunctionDecl {
            name,
            params,
            body,
            return_expr,
            span: keyword.span().to(end.span()),
        })
    }

    fn parse_param(&mut self) -> ParseResult<Param> {
        let name = self.parse_ident()?;
        let ty = self.parse_type()?;
        Ok(Param { name, ty })
    }

    fn parse_type(&mut self) -> ParseResult<TypeName> {
        self.parse_ident().map(TypeName)
    }

    fn parse_ident(&mut self) -> ParseResult<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(Ident {
            name: token.text(self.src).into(),
            span: token.span(),
        })
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> ParseResult<Expr> {
        let mut lhs = self.parse_primary()?;

        // Tokens without binding power are not operators, and thus end the
        // expression.
        while let Some((lbp, rbp)) = Self::infix_binding_power(self.peek().kind) {
            if lbp < min_bp {
                break;
            }
            let op = match self.advance()?.kind {
                TokenKind::And => BinaryOperator::And,
                TokenKind::Or => BinaryOperator::Or,
                _ => unreachable!(),
            };
            let rhs = self.parse_expr_bp(rbp)?;

            let span = lhs.span.to(rhs.span);
            let kind = ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
            lhs = Expr { kind, span };
        }

        Ok(lhs)
    }

    /// Only literals may appear in primary position.
    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let kind = match self.peek().kind {
            TokenKind::Number => LiteralKind::Number,
            TokenKind::String => LiteralKind::String,
            TokenKind::Boolean => LiteralKind::Boolean,
            TokenKind::Khali => LiteralKind::Khali,
            _ => return Err(self.unexpected(Production::Expression)),
        };
        let token = self.advance()?;
        let raw = match kind {
            LiteralKind::String => extract::string(token, self.src),
            _ => token.text(self.src),
        };
        Ok(Expr {
            kind: ExprKind::Literal(Literal {
                kind,
                raw: raw.into(),
            }),
            span: token.span(),
        })
    }

    fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
        let bp = match kind {
            // Level 1: Logical connectives (right-associative)
            TokenKind::And | TokenKind::Or => (2, 1),

            _ => return None,
        };
        Some(bp)
    }
}

impl<'src> Parser<'src> {
    /// Constructs a new parser, loading the first token.
    fn new(src: &'src str) -> ParseResult<Parser<'src>> {
        let mut lexer = Lexer::new(src);
        let current = lexer.next_token();
        check_lexed(current)?;
        Ok(Parser {
            src,
            lexer,
            current,
        })
    }

    /// Returns the current token.
    #[inline]
    fn peek(&self) -> Token {
        self.current
    }

    /// Returns the current token and loads the next one. Fails if the lexer
    /// produced an error token.
    fn advance(&mut self) -> ParseResult<Token> {
        let next = self.lexer.next_token();
        let c = std::mem::replace(&mut self.current, next);
        check_lexed(next)?;
        Ok(c)
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> ParseResult<bool> {
        if self.is(expect) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Advances if the current token matches the provided one, returning it.
    /// If not, fails.
    fn consume(&mut self, expect: TokenKind) -> ParseResult<Token> {
        if self.is(expect) {
            return self.advance();
        }
        let c = self.peek();
        Err(c.wrap(Error::MissingExpectedToken {
            expected: expect,
            actual: c.kind,
            lexeme: c.text(self.src).into(),
        }))
    }

    fn unexpected(&self, expected: Production) -> Spanned<Error> {
        let c = self.peek();
        c.wrap(Error::UnexpectedToken {
            expected,
            actual: c.kind,
            lexeme: c.text(self.src).into(),
        })
    }
}

fn check_lexed(token: Token) -> ParseResult<()> {
    match token.kind {
        TokenKind::Error(error) => Err(token.wrap(Error::Lexer(error))),
        _ => Ok(()),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// No production starts with the current token.
    UnexpectedToken {
        expected: Production,
        actual: TokenKind,
        lexeme: Box<str>,
    },
    /// A specific token was required.
    MissingExpectedToken {
        expected: TokenKind,
        actual: TokenKind,
        lexeme: Box<str>,
    },
    Lexer(lexer::Error),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Production {
    Statement,
    Expression,
}
