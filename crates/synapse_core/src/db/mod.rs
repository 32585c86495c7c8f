//! SQLite backing for `SqliteNoteStore`.
//!
//! # Responsibility
//! - Hand out connections whose `notes` table is migrated and ready.
//! - Classify failures by the stage that produced them.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - Every `DbError` carries a stable `code()` for logs and notifications.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// The database file (or in-memory handle) could not be opened.
    Open {
        target: String,
        source: rusqlite::Error,
    },
    /// A migration script failed; nothing from it was committed.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A note query or connection pragma failed.
    Query(rusqlite::Error),
}

impl DbError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Open { .. } => "db_open_failed",
            Self::Migration { .. } => "db_migration_failed",
            Self::UnsupportedSchemaVersion { .. } => "db_version_unsupported",
            Self::Query(_) => "db_query_failed",
        }
    }

    /// Whether retrying later could succeed (lock contention).
    pub fn is_busy(&self) -> bool {
        let source = match self {
            Self::Open { source, .. } | Self::Migration { source, .. } | Self::Query(source) => {
                source
            }
            Self::UnsupportedSchemaVersion { .. } => return false,
        };
        matches!(
            source.sqlite_error_code(),
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
        )
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { target, source } => write!(f, "cannot open note database {target}: {source}"),
            Self::Migration { version, source } => {
                write!(f, "note database migration {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "note database version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Query(err) => write!(f, "note query failed: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } | Self::Query(source) => {
                Some(source)
            }
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Query(value)
    }
}
