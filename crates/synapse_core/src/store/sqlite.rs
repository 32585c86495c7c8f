//! Note store over the migrated `notes` table.

use super::{NoteStore, StoreError, StoreResult};
use crate::db::{open_db, open_db_in_memory};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Notes stored as rows of the migrated `notes` table.
pub struct SqliteNoteStore {
    conn: Connection,
}

impl SqliteNoteStore {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Every stored note path, sorted.
    pub fn paths(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT path FROM notes ORDER BY path;")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn ensure_path(path: &str) -> StoreResult<()> {
    if path.trim().is_empty() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

impl NoteStore for SqliteNoteStore {
    fn read(&self, path: &str) -> StoreResult<String> {
        ensure_path(path)?;
        self.conn
            .query_row(
                "SELECT content FROM notes WHERE path = ?1;",
                [path],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn write(&self, path: &str, content: &str) -> StoreResult<()> {
        ensure_path(path)?;
        self.conn.execute(
            "INSERT INTO notes (path, content, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(path) DO UPDATE SET
                content = excluded.content,
                updated_at = excluded.updated_at;",
            params![path, content],
        )?;
        debug!(
            "event=note_write module=store status=ok backend=sqlite bytes={}",
            content.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteNoteStore;
    use crate::store::{NoteStore, StoreError};

    #[test]
    fn write_upserts_and_read_returns_latest() {
        let store = SqliteNoteStore::open_in_memory().expect("store");
        store.write("a.json", "one").expect("first write");
        store.write("a.json", "two").expect("second write");
        assert_eq!(store.read("a.json").expect("read"), "two");
        assert_eq!(store.paths().expect("paths"), vec!["a.json".to_string()]);
        assert!(matches!(store.read("b.json"), Err(StoreError::NotFound(_))));
    }
}
