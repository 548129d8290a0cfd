//! Human-readable renderings: error messages and AST trees.

pub mod error;
pub mod tree;
