//! In-document search and replace.
//!
//! # Responsibility
//! - Find term occurrences as document position ranges.
//! - Keep the find/replace panel state (term, results, current match).
//!
//! # Invariants
//! - Matches are reported in document order.
//! - Overlapping matches are all reported; the scan advances one character.
//! - Matches never cross textblock or inline atom boundaries.
//!
//! # See also
//! - `crate::decoration` for how results are highlighted.

mod state;

pub use state::SearchState;

use crate::model::node::Node;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transaction meta key carrying a [`SearchHighlight`].
pub const SEARCH_META_KEY: &str = "search";

/// Half-open match range in document positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchRange {
    pub from: usize,
    pub to: usize,
}

/// Search results as published to the decoration engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHighlight {
    pub matches: Vec<MatchRange>,
    /// 1-based index of the current match; 0 when there is none.
    pub current: usize,
}

impl SearchHighlight {
    pub fn to_meta(&self) -> Option<Value> {
        serde_json::to_value(self).ok()
    }

    pub fn from_meta(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

fn fold(c: char, case_sensitive: bool) -> char {
    if case_sensitive {
        return c;
    }
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}

/// Scans every textblock for `term`.
pub fn search(doc: &Node, term: &str, case_sensitive: bool) -> Vec<MatchRange> {
    let needle: Vec<char> = term.chars().map(|c| fold(c, case_sensitive)).collect();
    let mut matches = Vec::new();
    if needle.is_empty() {
        return matches;
    }

    doc.descendants(|node, pos, _| {
        if !node.is_textblock() {
            return true;
        }
        let content_start = pos + 1;
        let mut run: Vec<char> = Vec::new();
        let mut run_start = content_start;
        let mut offset = content_start;
        for child in node.content() {
            match child.text_str() {
                Some(text) => {
                    if run.is_empty() {
                        run_start = offset;
                    }
                    run.extend(text.chars().map(|c| fold(c, case_sensitive)));
                }
                None => {
                    scan_run(&run, run_start, &needle, &mut matches);
                    run.clear();
                }
            }
            offset += child.size();
        }
        scan_run(&run, run_start, &needle, &mut matches);
        false
    });
    matches
}

fn scan_run(run: &[char], run_start: usize, needle: &[char], matches: &mut Vec<MatchRange>) {
    if run.len() < needle.len() {
        return;
    }
    for index in 0..=run.len() - needle.len() {
        if run[index..index + needle.len()] == *needle {
            matches.push(MatchRange {
                from: run_start + index,
                to: run_start + index + needle.len(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{fold, search, MatchRange};
    use crate::model::attrs::Attrs;
    use crate::model::mark::MarkSet;
    use crate::model::node::Node;
    use crate::schema::Schema;

    fn doc(schema: &Schema, text: &str) -> Node {
        let paragraph = schema
            .node("paragraph", Attrs::new(), vec![Node::text(text, MarkSet::new())])
            .expect("paragraph");
        schema.node("doc", Attrs::new(), vec![paragraph]).expect("doc")
    }

    #[test]
    fn case_folding_is_per_character() {
        assert_eq!(fold('H', false), 'h');
        assert_eq!(fold('H', true), 'H');
        // 'İ' lowercases to two chars and is kept as-is
        assert_eq!(fold('İ', false), 'İ');
    }

    #[test]
    fn overlapping_matches_are_reported() {
        let schema = Schema::notes().expect("schema");
        let matches = search(&doc(&schema, "aaa"), "aa", true);
        assert_eq!(
            matches,
            vec![MatchRange { from: 1, to: 3 }, MatchRange { from: 2, to: 4 }]
        );
    }

    #[test]
    fn matches_span_mark_boundaries_but_not_atoms() {
        let schema = Schema::notes().expect("schema");
        let bold = schema.mark("bold", Attrs::new()).expect("bold");
        let math = schema
            .node("math_inline", Attrs::new(), vec![])
            .expect("math");
        let paragraph = schema
            .node(
                "paragraph",
                Attrs::new(),
                vec![
                    Node::text("he", MarkSet::new()),
                    Node::text("llo", schema.add_mark(&MarkSet::new(), bold)),
                    math,
                    Node::text("lo", MarkSet::new()),
                ],
            )
            .expect("paragraph");
        let doc = schema.node("doc", Attrs::new(), vec![paragraph]).expect("doc");
        assert_eq!(search(&doc, "hello", false), vec![MatchRange { from: 1, to: 6 }]);
        assert_eq!(search(&doc, "lo", false).len(), 2);
    }
}
