//! Core engine for Synapse structured notes.
//! Schema-checked document trees, transactional edits, input rules, block
//! commands, search/replace and decorations, behind one editor session.

pub mod codec;
pub mod commands;
pub mod config;
pub mod db;
pub mod decoration;
pub mod index;
pub mod logging;
pub mod model;
pub mod rules;
pub mod schema;
pub mod search;
pub mod session;
pub mod store;
pub mod transform;

pub use codec::{parse, serialize, CodecError};
pub use commands::BlockCommand;
pub use config::{ConfigError, EditorConfig};
pub use decoration::{DecorationKind, DecorationSet, Surface};
pub use index::{index_document, NoteIndex};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::{Node, PositionError, Selection};
pub use rules::InputRuleSet;
pub use schema::{Schema, SchemaError};
pub use search::{search, MatchRange, SearchState};
pub use session::{EditorEvent, EditorSession, LinkTarget, SessionError};
pub use store::{NoteStore, SqliteNoteStore, StoreError, StoreResult, VaultNoteStore};
pub use transform::{apply_transaction, Transaction, TransactionError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
