use crate::{
    ast::{BinaryOperator, Program},
    ir::{Module, Type},
    token::Spanned,
};

mod generator;

pub use generator::CodeGenerator;

pub const DEFAULT_MODULE_NAME: &str = "awara";

/// Runtime entry point which prints a value.
pub const PRINT_ENTRY_POINT: &str = "dikha_bhai";

/// Runtime entry point which hands a heap value to the collector.
pub const GC_REGISTER_ENTRY_POINT: &str = "GC_register";

/// Runtime entry point which formats an `i32` as a new string.
pub const INT_TO_STRING_ENTRY_POINT: &str = "awara_int_to_str";

/// Runtime entry point which formats an `i1` as `true` or `false`.
pub const BOOL_TO_STRING_ENTRY_POINT: &str = "awara_bool_to_str";

/// Lowers the program into a new module named [`DEFAULT_MODULE_NAME`].
pub fn generate(program: &Program) -> Result<Module, Spanned<Error>> {
    CodeGenerator::new(DEFAULT_MODULE_NAME).generate(program)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A number literal which doesn't fit in an `i32`.
    MalformedLiteral { raw: Box<str> },
    /// A parameter type other than `int` or `string`.
    UnlowerableType { name: Box<str> },
    MissingValue,
    InvalidOperands {
        op: BinaryOperator,
        lhs: Type,
        rhs: Type,
    },
    DuplicateFunction { name: Box<str> },
    DuplicateParameter { name: Box<str> },
}
