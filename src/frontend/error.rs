use std::path::PathBuf;

use thiserror::Error;

/// Location of a diagnostic: optional source path plus 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: Option<PathBuf>,
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for Location {
    /// Formats as `path:line:col`, or `line:col` when the path is unknown.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}:{}:{}", path.display(), self.line, self.col),
            None => write!(f, "{}:{}", self.line, self.col),
        }
    }
}

#[derive(Debug, Error)]
#[error("{location}: {message}")]
pub struct LexerError {
    pub message: String,
    pub location: Location,
}

/// A parsing error with source location.
///
/// For EOF-ish errors (missing `}`, `)`, `;`) the parser falls back to the
/// span of the last consumed token so locations are never `0:0`.
#[derive(Debug, Error)]
#[error("{location}: {message}")]
pub struct ParseError {
    pub message: String,
    pub location: Location,
}

impl From<LexerError> for ParseError {
    fn from(e: LexerError) -> Self {
        ParseError {
            message: e.message,
            location: e.location,
        }
    }
}
