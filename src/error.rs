//! Error taxonomy of the loading stages.

use rusqlite::ErrorCode;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Cannot open database {path:?}: {source}")]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Malformed input in {path:?}: {reason}")]
    MalformedInput { path: PathBuf, reason: String },

    #[error("Constraint violation while loading {path:?}: {source}")]
    ConstraintViolation {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EtlError {
    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        EtlError::MalformedInput {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Classifies a SQLite error raised while loading `path`.
    pub fn from_db(path: &Path, source: rusqlite::Error) -> Self {
        if is_constraint_violation(&source) {
            EtlError::ConstraintViolation {
                path: path.to_path_buf(),
                source,
            }
        } else {
            EtlError::Database(source)
        }
    }
}

pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

pub type EtlResult<T> = std::result::Result<T, EtlError>;
