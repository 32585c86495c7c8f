//! Note persistence collaborators.
//!
//! # Responsibility
//! - Define the `NoteStore` seam the editor session reads and writes through.
//! - Provide vault-file and SQLite implementations.
//!
//! # Invariants
//! - Stores exchange serialized markup only; they never see document trees.
//! - A failed write leaves the previous stored content in place.
//!
//! # See also
//! - `crate::codec` for the markup format.
//! - `crate::db` for SQLite bootstrap.

mod sqlite;
mod vault;

pub use sqlite::SqliteNoteStore;
pub use vault::VaultNoteStore;

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    NotFound(String),
    InvalidPath(String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Db(DbError),
}

impl StoreError {
    /// Stable code used in log lines and notifications.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "note_not_found",
            Self::InvalidPath(_) => "invalid_note_path",
            Self::Io { .. } => "io_error",
            Self::Db(err) => err.code(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "note not found: {path}"),
            Self::InvalidPath(path) => write!(f, "invalid note path `{path}`"),
            Self::Io { path, source } => write!(f, "io error at {}: {source}", path.display()),
            Self::Db(err) => write!(f, "note database error: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidPath(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Query(value))
    }
}

/// Reads and writes serialized notes by vault-relative path.
pub trait NoteStore {
    /// Returns the stored markup for `path`.
    fn read(&self, path: &str) -> StoreResult<String>;
    /// Replaces the stored markup for `path`, creating it when missing.
    fn write(&self, path: &str, content: &str) -> StoreResult<()>;
}
