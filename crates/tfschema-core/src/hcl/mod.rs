//! Front end for the native configuration syntax: parsing through `hcl-rs`
//! and a constant evaluator for literal sub-expressions.

pub mod ast;
pub mod eval;
pub mod parser;
pub mod source;

pub use ast::*;
pub use eval::evaluate;
pub use parser::{parse, parse_expression};
pub use source::Source;
