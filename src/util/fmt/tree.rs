use std::io::Write;

use crate::ast::*;

const INDENT_WIDTH: usize = 2;

pub fn print_program_string(program: &Program) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, program).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_expr_string(expr: &Expr) -> String {
    let mut buf = Vec::with_capacity(512);
    print_expr(&mut buf, 0, expr).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_program(w: &mut impl Write, program: &Program) -> std::io::Result<()> {
    for stmt in &program.stmts {
        print_stmt(w, 0, stmt)?;
    }
    Ok(())
}

fn print_stmt(w: &mut impl Write, i: usize, stmt: &Stmt) -> std::io::Result<()> {
    sp(w, i)?;
    match stmt {
        Stmt::Print(Print { expr, span }) => {
            writeln!(w, "print ({span})")?;
            print_expr(w, i + 1, expr)?;
        }
        Stmt::Function(FunctionDecl {
            name,
            params,
            body,
            return_expr,
            span,
        }) => {
            write!(w, "function {name}(")?;
            for (idx, param) in params.iter().enumerate() {
                if idx > 0 {
                    write!(w, ", ")?;
                }
                write!(w, "{}: {}", param.name, param.ty)?;
            }
            writeln!(w, ") ({span})")?;
            for stmt in body {
                print_stmt(w, i + 1, stmt)?;
            }
            if let Some(expr) = return_expr {
                sp(w, i + 1)?;
                writeln!(w, "return")?;
                print_expr(w, i + 2, expr)?;
            }
        }
    }
    Ok(())
}

pub fn print_expr(w: &mut impl Write, i: usize, expr: &Expr) -> std::io::Result<()> {
    sp(w, i)?;
    let span = expr.span;
    match &expr.kind {
        ExprKind::Literal(Literal { kind, raw }) => {
            writeln!(w, "literal {kind:?} {raw:?} ({span})")?;
        }
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op} ({span})")?;
            print_expr(w, i + 1, lhs)?;
            print_expr(w, i + 1, rhs)?;
        }
    }
    Ok(())
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:i$}", "", i = i * INDENT_WIDTH)
}
