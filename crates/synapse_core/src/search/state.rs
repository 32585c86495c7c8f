//! Find/replace panel state.
//!
//! # Responsibility
//! - Track term, replacement, case flag and the current match.
//! - Build replace transactions against the session document.
//!
//! # Invariants
//! - `current` is 1-based and 0 only when there are no results.
//! - `refresh` keeps `current` within the new results.

use super::{search, MatchRange, SearchHighlight};
use crate::model::mark::MarkSet;
use crate::model::node::Node;
use crate::transform::Transaction;

/// Find/replace panel state for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    term: String,
    replacement: String,
    case_sensitive: bool,
    results: Vec<MatchRange>,
    /// 1-based; 0 means no current match.
    current: usize,
}

impl SearchState {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            ..Self::default()
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn results(&self) -> &[MatchRange] {
        &self.results
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_match(&self) -> Option<MatchRange> {
        self.current
            .checked_sub(1)
            .and_then(|index| self.results.get(index))
            .copied()
    }

    /// Sets the term and searches from the first match.
    pub fn set_term(&mut self, doc: &Node, term: &str) {
        self.term = term.to_string();
        self.results = search(doc, &self.term, self.case_sensitive);
        self.current = usize::from(!self.results.is_empty());
    }

    pub fn set_replacement(&mut self, replacement: &str) {
        self.replacement = replacement.to_string();
    }

    pub fn set_case_sensitive(&mut self, doc: &Node, case_sensitive: bool) {
        self.case_sensitive = case_sensitive;
        self.refresh(doc);
    }

    /// Re-runs the search on a new document, keeping the current index in range.
    pub fn refresh(&mut self, doc: &Node) {
        self.results = search(doc, &self.term, self.case_sensitive);
        self.current = if self.results.is_empty() {
            0
        } else {
            self.current.clamp(1, self.results.len())
        };
    }

    /// Advances to the next match, wrapping to the first.
    pub fn next(&mut self) -> Option<MatchRange> {
        if self.results.is_empty() {
            return None;
        }
        self.current = self.current % self.results.len() + 1;
        self.current_match()
    }

    /// Steps back to the previous match, wrapping to the last.
    pub fn prev(&mut self) -> Option<MatchRange> {
        if self.results.is_empty() {
            return None;
        }
        self.current = if self.current <= 1 {
            self.results.len()
        } else {
            self.current - 1
        };
        self.current_match()
    }

    /// Results in the shape the decoration engine consumes.
    pub fn highlight(&self) -> SearchHighlight {
        SearchHighlight {
            matches: self.results.clone(),
            current: self.current,
        }
    }

    /// Builds the transaction replacing the current match.
    ///
    /// The replacement keeps the marks of the match's first character.
    pub fn replace_one_transaction(&self, doc: &Node) -> Option<Transaction> {
        let current = self.current_match()?;
        let marks = marks_at(doc, current.from);
        Some(
            Transaction::new()
                .replace_with_text(current.from, current.to, &self.replacement, marks)
                .set_meta("search_replace", "one"),
        )
    }

    /// Builds one transaction replacing every match, last match first.
    ///
    /// Matches overlapping an already replaced one are skipped.
    pub fn replace_all_transaction(&self, doc: &Node) -> Option<Transaction> {
        if self.results.is_empty() {
            return None;
        }
        let mut transaction = Transaction::new();
        let mut boundary = usize::MAX;
        for range in self.results.iter().rev() {
            if range.to > boundary {
                continue;
            }
            let marks = marks_at(doc, range.from);
            transaction =
                transaction.replace_with_text(range.from, range.to, &self.replacement, marks);
            boundary = range.from;
        }
        Some(transaction.set_meta("search_replace", "all"))
    }

    /// Clears results and term once a replace-all has been applied.
    pub fn finish_replace_all(&mut self) {
        self.term.clear();
        self.results.clear();
        self.current = 0;
    }

    /// Drops results without forgetting the term (panel closed).
    pub fn clear_results(&mut self) {
        self.results.clear();
        self.current = 0;
    }
}

fn marks_at(doc: &Node, pos: usize) -> MarkSet {
    doc.resolve(pos)
        .ok()
        .and_then(|resolved| resolved.node_after())
        .map(|node| node.marks().clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::SearchState;
    use crate::model::attrs::Attrs;
    use crate::model::mark::MarkSet;
    use crate::model::node::Node;
    use crate::schema::Schema;
    use crate::transform::apply_transaction;

    fn doc(schema: &Schema, text: &str) -> Node {
        let paragraph = schema
            .node("paragraph", Attrs::new(), vec![Node::text(text, MarkSet::new())])
            .expect("paragraph");
        schema.node("doc", Attrs::new(), vec![paragraph]).expect("doc")
    }

    #[test]
    fn next_and_prev_wrap_around() {
        let schema = Schema::notes().expect("schema");
        let doc = doc(&schema, "a b a b a");
        let mut state = SearchState::new(false);
        state.set_term(&doc, "a");
        assert_eq!(state.current_index(), 1);
        state.next();
        state.next();
        assert_eq!(state.current_index(), 3);
        state.next();
        assert_eq!(state.current_index(), 1);
        state.prev();
        assert_eq!(state.current_index(), 3);
    }

    #[test]
    fn replace_one_then_refresh_moves_to_following_match() {
        let schema = Schema::notes().expect("schema");
        let base = doc(&schema, "foo foo");
        let mut state = SearchState::new(false);
        state.set_term(&base, "foo");
        state.set_replacement("x");
        let tr = state.replace_one_transaction(&base).expect("current match");
        let applied = apply_transaction(&schema, &base, &tr).expect("apply");
        state.refresh(&applied.doc);
        assert_eq!(applied.doc.text_content(), "x foo");
        assert_eq!(state.results().len(), 1);
        assert_eq!(state.current_index(), 1);
    }

    #[test]
    fn replace_all_skips_overlapping_matches() {
        let schema = Schema::notes().expect("schema");
        let base = doc(&schema, "aaa");
        let mut state = SearchState::new(true);
        state.set_term(&base, "aa");
        state.set_replacement("b");
        let tr = state.replace_all_transaction(&base).expect("matches");
        assert_eq!(tr.steps().len(), 1);
        let applied = apply_transaction(&schema, &base, &tr).expect("apply");
        assert_eq!(applied.doc.text_content(), "ab");
    }
}
