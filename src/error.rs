use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Every way a single input line can fail.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Semantic error: {0}")]
    Semantic(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        QueryError::Syntax(msg.into())
    }

    pub fn semantic(msg: impl Into<String>) -> Self {
        QueryError::Semantic(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        QueryError::Validation(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        QueryError::Io { path: path.into(), source }
    }

    /// CSV failures are reported as I/O failures on the backing file.
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        QueryError::Io { path: path.into(), source: source.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, QueryError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}
