//! Editor session: the context handle owning one open note.
//!
//! # Responsibility
//! - Own the current document, selection and stored marks.
//! - Route text input through input rules and block commands through the
//!   transaction engine.
//! - Keep search state and decorations in step with every dispatch.
//! - Load and save notes through a `NoteStore` on a debounced schedule.
//!
//! # Invariants
//! - The document only changes through `dispatch`; a rejected transaction
//!   leaves document, selection and decorations untouched.
//! - Store failures are reported as notifications and never alter the
//!   in-memory document.
//! - Listeners belong to one session and never see another session's events.

mod events;
mod save;

pub use events::{EditorEvent, EventBus, LinkTarget, ListenerId, NotificationLevel};
pub use save::SaveScheduler;

use crate::codec::{self, CodecError};
use crate::commands::BlockCommand;
use crate::config::{ConfigError, EditorConfig};
use crate::decoration::{self, DecorationSet, Surface, TransientState};
use crate::model::mark::MarkSet;
use crate::model::node::Node;
use crate::model::selection::Selection;
use crate::rules::{text_input_transaction, InputRuleSet};
use crate::schema::Schema;
use crate::search::{MatchRange, SearchHighlight, SearchState, SEARCH_META_KEY};
use crate::store::{NoteStore, StoreError};
use crate::transform::{apply_transaction, Transaction, TransactionError};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Stable per-session identity used in log context.
pub type SessionId = Uuid;

#[derive(Debug)]
pub enum SessionError {
    Config(ConfigError),
    Codec(CodecError),
    Store(StoreError),
    Transaction(TransactionError),
    NoActiveNote,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Transaction(err) => write!(f, "{err}"),
            Self::NoActiveNote => write!(f, "no note is open in this session"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Transaction(err) => Some(err),
            Self::NoActiveNote => None,
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<CodecError> for SessionError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<TransactionError> for SessionError {
    fn from(value: TransactionError) -> Self {
        Self::Transaction(value)
    }
}

pub struct EditorSession {
    id: SessionId,
    schema: Arc<Schema>,
    config: EditorConfig,
    rules: InputRuleSet,
    doc: Node,
    selection: Selection,
    stored_marks: Option<MarkSet>,
    note_path: Option<String>,
    search: SearchState,
    search_highlight: Option<SearchHighlight>,
    surfaces: BTreeSet<Surface>,
    decorations: DecorationSet,
    bus: EventBus,
    scheduler: SaveScheduler,
}

impl EditorSession {
    /// Starts a session on `doc` with the cursor at the start of the content.
    pub fn new(schema: Arc<Schema>, config: EditorConfig, doc: Node) -> Result<Self, SessionError> {
        config.validate()?;
        let mut surfaces = BTreeSet::new();
        if config.block_handles {
            surfaces.insert(Surface::BlockHandles);
        }
        if config.outline {
            surfaces.insert(Surface::Outline);
        }
        let selection = initial_selection(&doc);
        let mut session = Self {
            id: Uuid::new_v4(),
            rules: InputRuleSet::builtin(config.input_rule_lookback),
            search: SearchState::new(config.search_case_sensitive),
            scheduler: SaveScheduler::new(config.save_debounce()),
            schema,
            config,
            doc,
            selection,
            stored_marks: None,
            note_path: None,
            search_highlight: None,
            surfaces,
            decorations: DecorationSet::default(),
            bus: EventBus::new(),
        };
        session.recompute_decorations();
        info!(
            "event=session_start module=session status=ok session_id={}",
            session.id
        );
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn stored_marks(&self) -> Option<&MarkSet> {
        self.stored_marks.as_ref()
    }

    pub fn decorations(&self) -> &DecorationSet {
        &self.decorations
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn note_path(&self) -> Option<&str> {
        self.note_path.as_deref()
    }

    pub fn is_save_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&EditorEvent) + 'static) -> ListenerId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Applies `transaction` and refreshes everything derived from the document.
    ///
    /// # Errors
    /// Returns the engine's error; the session is left exactly as before.
    pub fn dispatch(&mut self, transaction: Transaction) -> Result<(), TransactionError> {
        let applied = match apply_transaction(&self.schema, &self.doc, &transaction) {
            Ok(applied) => applied,
            Err(err) => {
                warn!(
                    "event=session_dispatch module=session status=rejected session_id={} failed_step={}",
                    self.id,
                    err.step_index()
                );
                return Err(err);
            }
        };
        let doc_changed = transaction.doc_changed();
        self.doc = applied.doc;

        let size = self.doc.content().size();
        self.selection = match transaction.selection() {
            Some(selection) => selection,
            None => Selection::new(
                applied.mapping.map(self.selection.anchor),
                applied.mapping.map(self.selection.head),
            ),
        }
        .clamp(size);

        if let Some(marks) = transaction.stored_marks() {
            self.stored_marks = Some(marks.clone());
        } else if doc_changed {
            self.stored_marks = None;
        }

        if doc_changed && self.surfaces.contains(&Surface::Search) {
            self.search.refresh(&self.doc);
            self.search_highlight = Some(self.search.highlight());
        }
        if let Some(highlight) = transaction.meta(SEARCH_META_KEY).and_then(SearchHighlight::from_meta) {
            self.search_highlight = Some(highlight);
        }

        if doc_changed {
            self.scheduler.note_edit(Instant::now());
        }
        self.recompute_decorations();
        debug!(
            "event=session_dispatch module=session status=ok session_id={} steps={} doc_changed={}",
            self.id,
            transaction.steps().len(),
            doc_changed
        );
        Ok(())
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<(), TransactionError> {
        self.dispatch(Transaction::new().set_selection(selection))
    }

    /// Types `text` over the selection, letting input rules rewrite it.
    ///
    /// Returns the name of the rule that fired, if any.
    pub fn insert_text(&mut self, text: &str) -> Result<Option<&'static str>, TransactionError> {
        let (from, to) = (self.selection.from(), self.selection.to());
        if let Some(matched) = self
            .rules
            .handle_text_input(&self.schema, &self.doc, from, to, text)
        {
            match self.dispatch(matched.transaction) {
                Ok(()) => return Ok(Some(matched.rule)),
                Err(err) => debug!(
                    "event=input_rule module=session status=fallback session_id={} rule={} error={}",
                    self.id, matched.rule, err
                ),
            }
        }
        let transaction = text_input_transaction(
            &self.schema,
            &self.doc,
            from,
            to,
            text,
            self.stored_marks.as_ref(),
        )
        .map_err(|source| TransactionError::InvalidPosition { step: 0, source })?;
        self.dispatch(transaction)?;
        Ok(None)
    }

    /// Deletes the selection, or the character before the cursor.
    ///
    /// Returns `false` at the start of a textblock.
    pub fn delete_backward(&mut self) -> Result<bool, TransactionError> {
        let (from, to) = (self.selection.from(), self.selection.to());
        if from != to {
            self.dispatch(
                Transaction::new()
                    .delete(from, to)
                    .set_selection(Selection::cursor(from)),
            )?;
            return Ok(true);
        }
        let resolved = self
            .doc
            .resolve(from)
            .map_err(|source| TransactionError::InvalidPosition { step: 0, source })?;
        if !resolved.parent().is_textblock() || resolved.parent_offset() == 0 {
            return Ok(false);
        }
        self.dispatch(
            Transaction::new()
                .delete(from - 1, from)
                .set_selection(Selection::cursor(from - 1)),
        )?;
        Ok(true)
    }

    /// Runs a block command on the current selection.
    ///
    /// Returns `false` when the command does not apply here.
    pub fn run_command(&mut self, command: BlockCommand) -> bool {
        let Some(transaction) = command.run(&self.doc, self.selection) else {
            return false;
        };
        match self.dispatch(transaction) {
            Ok(()) => true,
            Err(err) => {
                debug!(
                    "event=block_command module=session status=rejected session_id={} command={} error={}",
                    self.id,
                    command.as_str(),
                    err
                );
                false
            }
        }
    }

    pub fn open_surface(&mut self, surface: Surface) {
        if !self.surfaces.insert(surface) {
            return;
        }
        if surface == Surface::Search {
            self.search.refresh(&self.doc);
            self.search_highlight = Some(self.search.highlight());
        }
        self.recompute_decorations();
    }

    pub fn close_surface(&mut self, surface: Surface) {
        if !self.surfaces.remove(&surface) {
            return;
        }
        if surface == Surface::Search {
            self.search.clear_results();
            self.search_highlight = None;
        }
        self.recompute_decorations();
    }

    pub fn is_surface_open(&self, surface: Surface) -> bool {
        self.surfaces.contains(&surface)
    }

    /// Opens the search surface and searches for `term`.
    ///
    /// Returns the number of matches.
    pub fn find(&mut self, term: &str) -> Result<usize, TransactionError> {
        self.surfaces.insert(Surface::Search);
        self.search.set_term(&self.doc, term);
        self.publish_search(None)?;
        Ok(self.search.results().len())
    }

    pub fn set_search_case_sensitive(&mut self, case_sensitive: bool) -> Result<(), TransactionError> {
        self.search.set_case_sensitive(&self.doc, case_sensitive);
        self.publish_search(None)
    }

    pub fn set_replacement(&mut self, replacement: &str) {
        self.search.set_replacement(replacement);
    }

    /// Moves to the next match and selects it.
    pub fn next_match(&mut self) -> Result<Option<MatchRange>, TransactionError> {
        let current = self.search.next();
        self.publish_search(current)?;
        Ok(current)
    }

    /// Moves to the previous match and selects it.
    pub fn prev_match(&mut self) -> Result<Option<MatchRange>, TransactionError> {
        let current = self.search.prev();
        self.publish_search(current)?;
        Ok(current)
    }

    /// Replaces the current match; returns `false` when there is none.
    pub fn replace_current(&mut self) -> Result<bool, TransactionError> {
        let Some(transaction) = self.search.replace_one_transaction(&self.doc) else {
            return Ok(false);
        };
        self.dispatch(transaction)?;
        self.search.refresh(&self.doc);
        self.publish_search(None)?;
        Ok(true)
    }

    /// Replaces every match in one transaction; returns how many were replaced.
    pub fn replace_all(&mut self) -> Result<usize, TransactionError> {
        let Some(transaction) = self.search.replace_all_transaction(&self.doc) else {
            return Ok(0);
        };
        let replaced = transaction.steps().len();
        self.dispatch(transaction)?;
        self.search.finish_replace_all();
        self.publish_search(None)?;
        info!(
            "event=search_replace_all module=session status=ok session_id={} replaced={}",
            self.id, replaced
        );
        Ok(replaced)
    }

    fn publish_search(&mut self, select: Option<MatchRange>) -> Result<(), TransactionError> {
        let mut transaction = Transaction::new();
        if let Some(meta) = self.search.highlight().to_meta() {
            transaction = transaction.set_meta(SEARCH_META_KEY, meta);
        }
        if let Some(range) = select {
            transaction = transaction.set_selection(Selection::new(range.from, range.to));
        }
        self.dispatch(transaction)
    }

    /// Emits `LinkActivated` for the link mark at `pos`.
    pub fn activate_link(&mut self, pos: usize) -> Option<LinkTarget> {
        let target = self.link_at(pos)?;
        info!(
            "event=link_activated module=session status=ok session_id={} has_heading={} has_block_ref={}",
            self.id,
            target.heading.is_some(),
            target.block_ref.is_some()
        );
        self.bus.emit(&EditorEvent::LinkActivated(target.clone()));
        Some(target)
    }

    fn link_at(&self, pos: usize) -> Option<LinkTarget> {
        let link = self.schema.mark_id("link")?;
        let resolved = self.doc.resolve(pos).ok()?;
        [resolved.node_after(), resolved.node_before()]
            .into_iter()
            .flatten()
            .find_map(|node| node.marks().find(link).cloned())
            .and_then(|mark| {
                let attrs = mark.attrs();
                let text = |key: &str| {
                    attrs
                        .get(key)
                        .and_then(|value| value.as_str())
                        .map(str::to_string)
                };
                Some(LinkTarget {
                    note_title: text("note_title")?,
                    heading: text("heading"),
                    block_ref: text("block_ref"),
                })
            })
    }

    /// Loads `path` from `store`, replacing the current document.
    ///
    /// # Errors
    /// Store and codec failures are also emitted as notifications; the
    /// current document is kept.
    pub fn open_note(&mut self, store: &dyn NoteStore, path: &str) -> Result<(), SessionError> {
        let loaded = store
            .read(path)
            .map_err(SessionError::from)
            .and_then(|markup| Ok(codec::parse(&self.schema, &markup)?));
        let doc = match loaded {
            Ok(doc) => doc,
            Err(err) => {
                self.report_failure("note_open", &err);
                return Err(err);
            }
        };

        self.selection = initial_selection(&doc);
        self.doc = doc;
        self.stored_marks = None;
        self.note_path = Some(path.to_string());
        self.scheduler.cancel();
        self.search.refresh(&self.doc);
        if self.surfaces.contains(&Surface::Search) {
            self.search_highlight = Some(self.search.highlight());
        }
        self.recompute_decorations();
        info!(
            "event=note_open module=session status=ok session_id={} size={}",
            self.id,
            self.doc.content().size()
        );
        Ok(())
    }

    /// Serializes the document and writes it to the open note's path.
    pub fn save_now(&mut self, store: &dyn NoteStore) -> Result<(), SessionError> {
        let path = self.note_path.clone().ok_or(SessionError::NoActiveNote)?;
        let written = codec::serialize(&self.schema, &self.doc)
            .map_err(SessionError::from)
            .and_then(|markup| Ok(store.write(&path, &markup)?));
        match written {
            Ok(()) => {
                self.scheduler.cancel();
                info!(
                    "event=note_save module=session status=ok session_id={}",
                    self.id
                );
                Ok(())
            }
            Err(err) => {
                self.scheduler.note_edit(Instant::now());
                self.report_failure("note_save", &err);
                Err(err)
            }
        }
    }

    /// Saves when the debounce deadline has passed at `now`.
    ///
    /// Returns `true` when a save was written.
    pub fn poll_save(&mut self, now: Instant, store: &dyn NoteStore) -> Result<bool, SessionError> {
        if !self.scheduler.poll(now) {
            return Ok(false);
        }
        self.save_now(store)?;
        Ok(true)
    }

    /// Flushes a pending save immediately.
    pub fn on_focus_lost(&mut self, store: &dyn NoteStore) -> Result<bool, SessionError> {
        if !self.scheduler.flush() {
            return Ok(false);
        }
        self.save_now(store)?;
        Ok(true)
    }

    fn report_failure(&mut self, event: &str, err: &SessionError) {
        let code = match err {
            SessionError::Store(store) => store.code(),
            SessionError::Codec(_) => "codec_error",
            SessionError::Config(_) => "config_error",
            SessionError::Transaction(_) => "transaction_error",
            SessionError::NoActiveNote => "no_active_note",
        };
        warn!(
            "event={} module=session status=error session_id={} error_code={}",
            event, self.id, code
        );
        self.bus.emit(&EditorEvent::Notification {
            level: NotificationLevel::Error,
            message: err.to_string(),
        });
    }

    fn recompute_decorations(&mut self) {
        let transient = TransientState {
            selection: self.selection,
            search: self
                .surfaces
                .contains(&Surface::Search)
                .then(|| self.search_highlight.clone())
                .flatten(),
            block_handles: self.surfaces.contains(&Surface::BlockHandles),
            outline: self.surfaces.contains(&Surface::Outline),
        };
        self.decorations = decoration::compute(&self.schema, &self.doc, &transient);
    }
}

fn initial_selection(doc: &Node) -> Selection {
    Selection::cursor(1).clamp(doc.content().size())
}

#[cfg(test)]
mod tests {
    use super::{EditorEvent, EditorSession};
    use crate::commands::BlockCommand;
    use crate::config::EditorConfig;
    use crate::decoration::{DecorationKind, Surface};
    use crate::model::attrs::Attrs;
    use crate::model::mark::MarkSet;
    use crate::model::node::Node;
    use crate::model::selection::Selection;
    use crate::schema::Schema;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    fn session(texts: &[&str]) -> EditorSession {
        let schema = Arc::new(Schema::notes().expect("schema"));
        let blocks = texts
            .iter()
            .map(|text| {
                let content = if text.is_empty() {
                    vec![]
                } else {
                    vec![Node::text(*text, MarkSet::new())]
                };
                schema
                    .node("paragraph", Attrs::new(), content)
                    .expect("paragraph")
            })
            .collect();
        let doc = schema.node("doc", Attrs::new(), blocks).expect("doc");
        EditorSession::new(schema, EditorConfig::default(), doc).expect("session")
    }

    #[test]
    fn typing_moves_cursor_and_schedules_save() {
        let mut session = session(&[""]);
        assert_eq!(session.insert_text("a").expect("type"), None);
        assert_eq!(session.insert_text("b").expect("type"), None);
        assert_eq!(session.document().text_content(), "ab");
        assert_eq!(session.selection(), Selection::cursor(3));
        assert!(session.is_save_pending());
        assert!(session.delete_backward().expect("delete"));
        assert_eq!(session.document().text_content(), "a");
    }

    #[test]
    fn rejected_dispatch_keeps_state() {
        let mut session = session(&["abc"]);
        let before = session.document().clone();
        let tr = crate::transform::Transaction::new()
            .insert_text(1, "x", MarkSet::new())
            .delete(0, 99);
        assert!(session.dispatch(tr).is_err());
        assert_eq!(session.document(), &before);
        assert!(!session.is_save_pending());
    }

    #[test]
    fn find_publishes_highlights_and_close_clears_them() {
        let mut session = session(&["plan the plan"]);
        assert_eq!(session.find("plan").expect("find"), 2);
        assert_eq!(
            session
                .decorations()
                .of_kind(DecorationKind::SearchMatchCurrent)
                .count(),
            1
        );
        session.close_surface(Surface::Search);
        assert_eq!(
            session
                .decorations()
                .of_kind(DecorationKind::SearchMatch)
                .count(),
            0
        );
    }

    #[test]
    fn move_command_is_noop_at_boundary() {
        let mut session = session(&["one", "two"]);
        assert!(!session.run_command(BlockCommand::MoveUp));
        assert!(session.run_command(BlockCommand::MoveDown));
        assert_eq!(
            session.document().child(1).text_content(),
            "one"
        );
    }

    #[test]
    fn listeners_are_scoped_to_their_session() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut first = session(&[""]);
        let mut second = session(&[""]);
        let sink = Rc::clone(&seen);
        first.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        for c in "[[Plan]]".chars() {
            second.insert_text(&c.to_string()).expect("type");
        }
        let end = second.document().content().size() - 1;
        assert!(second.activate_link(end).is_some());
        assert!(seen.borrow().is_empty());
        assert_ne!(first.id(), second.id());

        let mine = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&mine);
        second.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        second.activate_link(end);
        assert!(matches!(mine.borrow().first(), Some(EditorEvent::LinkActivated(target)) if target.note_title == "Plan"));
    }
}
