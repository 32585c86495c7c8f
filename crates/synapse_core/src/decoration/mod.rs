//! Decoration engine: derived, non-document overlays.
//!
//! # Responsibility
//! - Compute search highlights, block handles and the heading outline from
//!   a document plus transient UI state.
//!
//! # Invariants
//! - `compute` is pure: equal inputs yield equal outputs.
//! - Decorations never enter the document tree.
//! - Output is sorted by `(from, to, kind)`.

use crate::commands::TopBlock;
use crate::model::node::Node;
use crate::model::selection::Selection;
use crate::schema::Schema;
use crate::search::SearchHighlight;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of overlay, ordered for stable sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DecorationKind {
    SearchMatch,
    SearchMatchCurrent,
    BlockHandle,
    BlockHandleActive,
}

/// One overlay range. Widgets (block handles) have `from == to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
    pub from: usize,
    pub to: usize,
    pub kind: DecorationKind,
    pub attrs: BTreeMap<String, String>,
}

/// Heading entry of the outline panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Position before the heading node.
    pub pos: usize,
    pub level: u8,
    pub text: String,
}

/// Producers whose output can be switched on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Surface {
    Search,
    BlockHandles,
    Outline,
}

/// UI state that decorations derive from, besides the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransientState {
    pub selection: Selection,
    /// `None` when the search surface is closed.
    pub search: Option<SearchHighlight>,
    pub block_handles: bool,
    pub outline: bool,
}

/// Combined producer output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationSet {
    pub decorations: Vec<Decoration>,
    pub outline: Vec<OutlineEntry>,
}

impl DecorationSet {
    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty() && self.outline.is_empty()
    }

    /// Decorations of one kind, in order.
    pub fn of_kind(&self, kind: DecorationKind) -> impl Iterator<Item = &Decoration> + '_ {
        self.decorations
            .iter()
            .filter(move |decoration| decoration.kind == kind)
    }
}

/// Computes every enabled producer and merges the results.
pub fn compute(schema: &Schema, doc: &Node, transient: &TransientState) -> DecorationSet {
    let mut decorations = Vec::new();
    if let Some(search) = transient.search.as_ref() {
        search_decorations(doc, search, &mut decorations);
    }
    if transient.block_handles {
        block_handle_decorations(schema, doc, transient.selection, &mut decorations);
    }
    decorations.sort_by(|a, b| (a.from, a.to, a.kind).cmp(&(b.from, b.to, b.kind)));

    let outline = if transient.outline {
        outline(schema, doc)
    } else {
        Vec::new()
    };
    DecorationSet {
        decorations,
        outline,
    }
}

fn search_decorations(doc: &Node, search: &SearchHighlight, out: &mut Vec<Decoration>) {
    let size = doc.content().size();
    for (index, range) in search.matches.iter().enumerate() {
        if range.to > size || range.from >= range.to {
            continue;
        }
        let kind = if index + 1 == search.current {
            DecorationKind::SearchMatchCurrent
        } else {
            DecorationKind::SearchMatch
        };
        out.push(Decoration {
            from: range.from,
            to: range.to,
            kind,
            attrs: BTreeMap::from([("index".to_string(), (index + 1).to_string())]),
        });
    }
}

fn block_handle_decorations(
    schema: &Schema,
    doc: &Node,
    selection: Selection,
    out: &mut Vec<Decoration>,
) {
    let active = TopBlock::at(doc, selection.head.min(doc.content().size())).map(|block| block.index);
    let mut pos = 0;
    for (index, block) in doc.content().iter().enumerate() {
        let kind = if Some(index) == active {
            DecorationKind::BlockHandleActive
        } else {
            DecorationKind::BlockHandle
        };
        out.push(Decoration {
            from: pos,
            to: pos,
            kind,
            attrs: BTreeMap::from([
                ("block_type".to_string(), schema.type_name(block).to_string()),
                ("index".to_string(), index.to_string()),
            ]),
        });
        pos += block.size();
    }
}

/// Every heading in document order.
pub fn outline(schema: &Schema, doc: &Node) -> Vec<OutlineEntry> {
    let Some(heading) = schema.node_id("heading") else {
        return Vec::new();
    };
    let mut entries = Vec::new();
    doc.descendants(|node, pos, _| {
        if node.element_type() != Some(heading) {
            return !node.is_textblock();
        }
        let level = node
            .attrs()
            .get("level")
            .and_then(|value| value.as_int())
            .unwrap_or(1)
            .clamp(1, 6) as u8;
        entries.push(OutlineEntry {
            pos,
            level,
            text: node.text_content(),
        });
        false
    });
    entries
}
