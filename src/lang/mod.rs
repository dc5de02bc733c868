//! # Sapling syntax tree
//!
//! Produced by the parser and consumed by the bytecode compiler.
//!
//! - `expr`: expression trees built by precedence climbing.
//! - `stmt`: the closed set of statement kinds; loop kinds carry their body.
//! - `routine`: routines, their parameter interface and sequence types.
//! - `tree`: the loaded program (routines plus the global constant table).

pub mod expr;
pub mod routine;
pub mod stmt;
pub mod tree;

pub use expr::{BinOp, Expr};
pub use routine::{ParamInterface, Routine, SeqType};
pub use stmt::Stmt;
pub use tree::SourceTree;
