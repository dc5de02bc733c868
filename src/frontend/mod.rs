//! Source text to syntax tree: tokenizer, parser and the `use` loader.

pub mod error;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod token;

pub use error::{LexerError, Location, ParseError};
pub use loader::Loader;
