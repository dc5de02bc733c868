use std::path::PathBuf;

use thiserror::Error;

use crate::bytecode::compile_error::CompileError;
use crate::bytecode::text::LoadError;
use crate::frontend::error::{LexerError, ParseError};
use crate::runtime::runtime_error::RuntimeError;

/// Any failure between reading source text and finishing execution.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("lexer error: {0}")]
    Lexer(#[from] LexerError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("cannot load program: {0}")]
    Load(#[from] LoadError),

    #[error("cannot decode program: {0}")]
    Binary(#[from] postcard::Error),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub type Result<T> = std::result::Result<T, Error>;
