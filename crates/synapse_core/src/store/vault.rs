//! File-backed note store.
//!
//! # Invariants
//! - Every resolved file lies below the vault root.
//! - Writes create missing parent directories.

use super::{NoteStore, StoreError, StoreResult};
use log::debug;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Notes stored as files below a vault root directory.
#[derive(Debug, Clone)]
pub struct VaultNoteStore {
    root: PathBuf,
}

impl VaultNoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a vault-relative path to a file path, rejecting escapes.
    fn file_path(&self, path: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(path);
        let plain = !path.trim().is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !plain {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl NoteStore for VaultNoteStore {
    fn read(&self, path: &str) -> StoreResult<String> {
        let file = self.file_path(path)?;
        std::fs::read_to_string(&file).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                StoreError::NotFound(path.to_string())
            } else {
                StoreError::Io { path: file, source }
            }
        })
    }

    fn write(&self, path: &str, content: &str) -> StoreResult<()> {
        let file = self.file_path(path)?;
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&file, content).map_err(|source| StoreError::Io {
            path: file.clone(),
            source,
        })?;
        debug!(
            "event=note_write module=store status=ok backend=vault bytes={}",
            content.len()
        );
        Ok(())
    }
}
