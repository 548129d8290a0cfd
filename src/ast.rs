// program ::= stmt*
// stmt ::= print | function
// print ::= 'dikha_bhai' expr
// function ::= 'dekh' ID '(' [param (',' param)*] ')' '{' stmt* ['wapas.kro' expr] '}'
// param ::= ID ID
// expr ::= expr 'aur' expr
//        | expr 'ya' expr
//        | number
//        | string
//        | boolean
//        | 'khali'

// Precedence
//
// aur ya (right-associative)

use std::fmt;

use crate::token::Span;

#[derive(Debug, PartialEq, Default)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, PartialEq)]
pub enum Stmt {
    Print(Print),
    Function(FunctionDecl),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Print(print) => print.span,
            Stmt::Function(function) => function.span,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Print {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Ident,
    /// List of parameters, in declaration order.
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    /// Parsed from a trailing `wapas.kro`, but not lowered.
    pub return_expr: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub ty: TypeName,
}

#[derive(Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Binary {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    /// The lexeme, exactly as written. Quotes are stripped from strings, but
    /// escape sequences are not performed.
    pub raw: Box<str>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    String,
    Boolean,
    Khali,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    And,
    Or,
}

impl BinaryOperator {
    /// Returns the operator's spelling in source.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::And => "aur",
            BinaryOperator::Or => "ya",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq)]
pub struct TypeName(pub Ident);

impl TypeName {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn span(&self) -> Span {
        self.0.span
    }
}

#[derive(Debug, PartialEq)]
pub struct Ident {
    pub name: Box<str>,
    pub span: Span,
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
