//! Abstract Syntax Tree (AST) consumed by the code generator
//!
//! The tree is produced and validated by the front end; this crate only reads
//! it. Statements and expressions are closed enums so every lowering site has
//! to match them exhaustively.

mod constraint;
mod nodes;

pub use constraint::*;
pub use nodes::*;
