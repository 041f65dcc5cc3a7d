//! Error types for loading, locating and editing YAML documents.
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// The source text is not valid YAML. Raised at load time, and when a splice would
    /// leave the buffer unparseable (in which case the buffer is left untouched).
    #[error("YAML syntax error at line {line}, column {column}: {message}\nInput was:\n{text}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
        text: String,
    },

    #[error("Invalid path `{path}` at index {position}: {message}")]
    PathSyntax {
        path: String,
        position: usize,
        message: String,
    },

    #[error("Unknown anchor `{name}`")]
    UnknownAnchor { name: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Unsupported edit: {0}")]
    UnsupportedEdit(String),

    #[error("Path `{path}` does not match any node")]
    NotFound { path: String },

    /// A tree-shape invariant was violated. This is a bug, not a usage error.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn path_syntax(path: &str, position: usize, message: impl Into<String>) -> Self {
        Self::PathSyntax {
            path: path.to_string(),
            position,
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
