use std::fmt::{self, Write};

use super::*;

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;

        if !self.strings.is_empty() {
            writeln!(f)?;
        }
        for (idx, s) in self.strings.iter().enumerate() {
            // Includes the NUL terminator.
            let len = s.len() + 1;
            writeln!(
                f,
                "{} = private unnamed_addr constant [{len} x i8] c\"{}\\00\"",
                StringId(idx),
                Escaped(s),
            )?;
        }

        if !self.declarations.is_empty() {
            writeln!(f)?;
        }
        for declaration in &self.declarations {
            writeln!(f, "{declaration}")?;
        }

        for function in &self.functions {
            writeln!(f)?;
            write!(f, "{function}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "declare {} @{}(", self.return_type, self.name)?;
        for (i, ty) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty}")?;
        }
        f.write_char(')')
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "define {} @{}(", self.return_type, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} %{}", param.ty, param.name)?;
        }
        writeln!(f, ") {{")?;

        for block in &self.blocks {
            writeln!(f, "{}:", block.label)?;
            for inst in &block.instructions {
                writeln!(f, "  {inst}")?;
            }
            if let Some(terminator) = &block.terminator {
                writeln!(f, "  {terminator}")?;
            }
        }

        writeln!(f, "}}")
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Binary {
                dest,
                op,
                ty,
                lhs,
                rhs,
            } => write!(f, "%{dest} = {op} {ty} {lhs}, {rhs}"),
            Instruction::Call {
                dest,
                ret,
                callee,
                args,
            } => {
                if let Some(dest) = dest {
                    write!(f, "%{dest} = ")?;
                }
                write!(f, "call {ret} @{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {arg}", arg.ty())?;
                }
                f.write_char(')')
            }
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Ret(None) => f.write_str("ret void"),
            Terminator::Ret(Some(value)) => write!(f, "ret {} {value}", value.ty()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::ConstInt { ty: Type::I1, value } => write!(f, "{}", *value != 0),
            Value::ConstInt { value, .. } => write!(f, "{value}"),
            Value::Null => f.write_str("null"),
            Value::String(id) => write!(f, "{id}"),
            Value::Temp { id, .. } => write!(f, "%{id}"),
        }
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => f.write_str("@.str"),
            n => write!(f, "@.str.{n}"),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Type::Void => "void",
            Type::I1 => "i1",
            Type::I32 => "i32",
            Type::Ptr => "ptr",
        })
    }
}

/// Byte-wise escaping of a constant's contents: printable ASCII is kept, except
/// for `"` and `\`, everything else becomes `\XX`.
struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.0.as_bytes() {
            if (b' '..=b'~').contains(&b) && b != b'"' && b != b'\\' {
                f.write_char(char::from(b))?;
            } else {
                write!(f, "\\{b:02X}")?;
            }
        }
        Ok(())
    }
}
