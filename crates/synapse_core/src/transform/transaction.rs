//! Transaction builder: ordered steps plus annotations.

use crate::model::attrs::Attrs;
use crate::model::fragment::Fragment;
use crate::model::mark::{Mark, MarkSet};
use crate::model::node::Node;
use crate::model::selection::Selection;
use crate::model::slice::Slice;
use crate::schema::MarkTypeId;
use crate::transform::step::Step;
use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered edit list applied all-or-nothing.
///
/// All step positions refer to the document the transaction is built
/// against; the engine maps each one through the steps before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    steps: Vec<Step>,
    meta: BTreeMap<String, Value>,
    selection: Option<Selection>,
    stored_marks: Option<MarkSet>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Whether the transaction changes the document.
    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn replace(self, from: usize, to: usize, slice: Slice) -> Self {
        self.step(Step::Replace { from, to, slice })
    }

    /// Inserts closed nodes at `pos`.
    pub fn insert(self, pos: usize, nodes: Vec<Node>) -> Self {
        self.replace(pos, pos, Slice::closed(Fragment::from_nodes(nodes)))
    }

    pub fn insert_text(self, pos: usize, text: &str, marks: MarkSet) -> Self {
        self.insert(pos, vec![Node::text(text, marks)])
    }

    pub fn delete(self, from: usize, to: usize) -> Self {
        self.replace(from, to, Slice::empty())
    }

    /// Replaces `[from, to)` with a single text run; empty text deletes.
    pub fn replace_with_text(self, from: usize, to: usize, text: &str, marks: MarkSet) -> Self {
        if text.is_empty() {
            return self.delete(from, to);
        }
        self.replace(
            from,
            to,
            Slice::closed(Fragment::from_node(Node::text(text, marks))),
        )
    }

    pub fn set_node_attrs(self, pos: usize, attrs: Attrs) -> Self {
        self.step(Step::SetAttrs { pos, attrs })
    }

    pub fn add_mark(self, from: usize, to: usize, mark: Mark) -> Self {
        self.step(Step::AddMark { from, to, mark })
    }

    pub fn remove_mark(self, from: usize, to: usize, mark_type: MarkTypeId) -> Self {
        self.step(Step::RemoveMark {
            from,
            to,
            mark_type,
        })
    }

    pub fn set_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Explicit selection to adopt after the transaction applies.
    pub fn set_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Marks applied to the next typed text.
    pub fn set_stored_marks(mut self, marks: MarkSet) -> Self {
        self.stored_marks = Some(marks);
        self
    }

    pub fn stored_marks(&self) -> Option<&MarkSet> {
        self.stored_marks.as_ref()
    }
}
