/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The code generator walks the AST, lowering it into an IR module.
pub mod codegen;

/// The garbage collector manages the heap objects used by generated code.
pub mod gc;

/// The runtime services generated code calls into.
pub mod runtime;

pub mod ast;
pub mod ir;
pub mod pipeline;
pub mod token;

pub mod util {
    pub mod fmt;
    #[cfg(test)]
    pub(crate) mod test_utils;
}
