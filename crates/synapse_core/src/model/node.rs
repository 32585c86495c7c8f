//! Document tree nodes.
//!
//! # Responsibility
//! - Represent elements and text runs as a parent-owned tree.
//! - Provide size/offset arithmetic and range traversal.
//!
//! # Invariants
//! - Children never point at their parent; ancestry is recovered from a
//!   resolved position.
//! - Element sizes: leaf = 1, otherwise `content.size() + 2`. Text size is
//!   its character count.

use crate::model::attrs::Attrs;
use crate::model::fragment::{Fragment, EMPTY_FRAGMENT};
use crate::model::mark::MarkSet;
use crate::model::position::{PositionError, ResolvedPos};
use crate::model::slice::Slice;
use crate::schema::{NodeType, NodeTypeId};

static EMPTY_ATTRS: Attrs = Attrs::new();
static EMPTY_MARKS: MarkSet = MarkSet::new();

/// Tree node: an element or a text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(TextNode),
}

/// Non-text node with a type tag, attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    ty: NodeTypeId,
    attrs: Attrs,
    content: Fragment,
    leaf: bool,
    inline: bool,
    textblock: bool,
}

impl Element {
    /// Builds an element with flags copied from its type.
    ///
    /// Callers validate `attrs` and `content` beforehand.
    pub(crate) fn new(node_type: &NodeType, attrs: Attrs, content: Fragment) -> Self {
        Self {
            ty: node_type.id(),
            attrs,
            content,
            leaf: node_type.is_leaf(),
            inline: node_type.is_inline(),
            textblock: node_type.is_textblock(),
        }
    }

    pub fn type_id(&self) -> NodeTypeId {
        self.ty
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn content(&self) -> &Fragment {
        &self.content
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf
    }
}

/// Text run. Never empty inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    text: String,
    marks: MarkSet,
    len: usize,
}

impl TextNode {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn marks(&self) -> &MarkSet {
        &self.marks
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Characters `[from, to)` of the run.
    pub fn char_slice(&self, from: usize, to: usize) -> &str {
        char_slice(&self.text, from, to)
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
        self.len += text.chars().count();
    }
}

/// Slices a string by character indices, clamping to its length.
pub(crate) fn char_slice(text: &str, from: usize, to: usize) -> &str {
    if from >= to {
        return "";
    }
    let byte_at = |chars: usize| {
        text.char_indices()
            .nth(chars)
            .map_or(text.len(), |(index, _)| index)
    };
    &text[byte_at(from)..byte_at(to)]
}

impl Node {
    /// Builds a text run.
    pub fn text(text: impl Into<String>, marks: MarkSet) -> Node {
        let text = text.into();
        let len = text.chars().count();
        Node::Text(TextNode { text, marks, len })
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    /// Text of a text run; `None` for elements.
    pub fn text_str(&self) -> Option<&str> {
        self.as_text().map(TextNode::text)
    }

    /// Element type id; `None` for text (see `Schema::type_of`).
    pub fn element_type(&self) -> Option<NodeTypeId> {
        self.as_element().map(Element::type_id)
    }

    pub fn attrs(&self) -> &Attrs {
        match self {
            Node::Element(element) => &element.attrs,
            Node::Text(_) => &EMPTY_ATTRS,
        }
    }

    pub fn marks(&self) -> &MarkSet {
        match self {
            Node::Element(_) => &EMPTY_MARKS,
            Node::Text(text) => &text.marks,
        }
    }

    pub fn content(&self) -> &Fragment {
        match self {
            Node::Element(element) => &element.content,
            Node::Text(_) => &EMPTY_FRAGMENT,
        }
    }

    /// Text runs and elements without content slots.
    pub fn is_leaf(&self) -> bool {
        match self {
            Node::Element(element) => element.leaf,
            Node::Text(_) => true,
        }
    }

    pub fn is_inline(&self) -> bool {
        match self {
            Node::Element(element) => element.inline,
            Node::Text(_) => true,
        }
    }

    pub fn is_block(&self) -> bool {
        !self.is_inline()
    }

    pub fn is_textblock(&self) -> bool {
        match self {
            Node::Element(element) => element.textblock,
            Node::Text(_) => false,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Node::Text(text) => text.len,
            Node::Element(element) if element.leaf => 1,
            Node::Element(element) => element.content.size() + 2,
        }
    }

    pub fn child_count(&self) -> usize {
        self.content().child_count()
    }

    /// # Panics
    /// Panics if `index` is out of range.
    pub fn child(&self, index: usize) -> &Node {
        self.content().child(index)
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.content().get(index)
    }

    /// Whether both nodes have the same type, attributes and marks.
    pub fn same_markup(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Text(a), Node::Text(b)) => a.marks == b.marks,
            (Node::Element(a), Node::Element(b)) => a.ty == b.ty && a.attrs == b.attrs,
            _ => false,
        }
    }

    /// Same node with new content. Text runs are returned unchanged.
    pub fn with_content(&self, content: Fragment) -> Node {
        match self {
            Node::Element(element) => Node::Element(Element {
                content,
                ..element.clone()
            }),
            Node::Text(_) => self.clone(),
        }
    }

    /// Same element with new (already validated) attributes.
    pub(crate) fn with_attrs(&self, attrs: Attrs) -> Node {
        match self {
            Node::Element(element) => Node::Element(Element {
                attrs,
                ..element.clone()
            }),
            Node::Text(_) => self.clone(),
        }
    }

    /// Same text with a new mark set. Elements are returned unchanged.
    pub fn with_marks(&self, marks: MarkSet) -> Node {
        match self {
            Node::Text(text) => Node::Text(TextNode {
                marks,
                ..text.clone()
            }),
            Node::Element(_) => self.clone(),
        }
    }

    /// Cuts this node to `[from, to)` of its content (characters for text).
    pub fn cut(&self, from: usize, to: usize) -> Node {
        match self {
            Node::Text(text) => {
                let to = to.min(text.len);
                if from == 0 && to == text.len {
                    return self.clone();
                }
                Node::text(text.char_slice(from, to), text.marks.clone())
            }
            Node::Element(element) => {
                let to = to.min(element.content.size());
                if from == 0 && to == element.content.size() {
                    return self.clone();
                }
                self.with_content(element.content.cut(from, to))
            }
        }
    }

    /// Cuts using positions relative to this node's outer start.
    pub(crate) fn cut_relative(&self, from: usize, to: usize) -> Node {
        match self {
            Node::Text(_) => self.cut(from, to),
            Node::Element(_) => self.cut(from.saturating_sub(1), to.saturating_sub(1)),
        }
    }

    /// Concatenated text of all descendant runs.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) => text.text.clone(),
            Node::Element(element) => {
                let mut out = String::new();
                for child in &element.content {
                    out.push_str(&child.text_content());
                }
                out
            }
        }
    }

    /// Text between two content positions; see [`Fragment::text_between`].
    pub fn text_between(
        &self,
        from: usize,
        to: usize,
        block_separator: Option<&str>,
        leaf_text: &str,
    ) -> String {
        self.content()
            .text_between(from, to, block_separator, leaf_text, self)
    }

    /// Walks descendants overlapping `[from, to)` of this node's content.
    pub fn nodes_between<'a, F>(&'a self, from: usize, to: usize, mut f: F)
    where
        F: FnMut(&'a Node, usize, &'a Node) -> bool,
    {
        self.content().nodes_between(from, to, &mut f, 0, self);
    }

    /// Walks every descendant.
    pub fn descendants<'a, F>(&'a self, f: F)
    where
        F: FnMut(&'a Node, usize, &'a Node) -> bool,
    {
        self.nodes_between(0, self.content().size(), f);
    }

    /// Node starting exactly at `pos`, if any.
    pub fn node_at(&self, mut pos: usize) -> Option<&Node> {
        let mut node = self;
        loop {
            let (index, offset) = node.content().find_index(pos);
            let child = node.maybe_child(index)?;
            if offset == pos || child.is_text() {
                return Some(child);
            }
            pos -= offset + 1;
            node = child;
        }
    }

    /// Resolves a position into its ancestor path.
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos<'_>, PositionError> {
        ResolvedPos::resolve(self, pos)
    }

    /// Content between two positions as an open slice.
    pub fn slice(&self, from: usize, to: usize) -> Result<Slice, PositionError> {
        if from > to {
            return Err(PositionError::InvertedRange { from, to });
        }
        if from == to {
            self.resolve(from)?;
            return Ok(Slice::empty());
        }
        let start_pos = self.resolve(from)?;
        let end_pos = self.resolve(to)?;
        let depth = start_pos.shared_depth(to);
        let start = start_pos.level_start(depth);
        let node = start_pos.level_node(depth);
        let content = node
            .content()
            .cut(start_pos.pos() - start, end_pos.pos() - start);
        Ok(Slice::new(
            content,
            start_pos.depth() - depth,
            end_pos.depth() - depth,
        ))
    }
}
