pub mod ast;
pub mod expand;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;

pub use ast::{Pipeline, Stage, StageKind};
pub use parser::parse_line;
