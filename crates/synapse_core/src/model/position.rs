//! Position resolution.
//!
//! A position is an offset into the flattened document. Resolving it
//! produces the ancestor path computed on demand; nothing is cached on nodes.
//!
//! # Invariants
//! - Depth 0 is the document itself; `depth()` is the innermost ancestor.
//! - `before(d)`/`after(d)` exist only for `1..=depth()`.

use crate::model::mark::MarkSet;
use crate::model::node::Node;
use crate::schema::Schema;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Invalid position or depth requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    OutOfRange { pos: usize, size: usize },
    DepthOutOfRange { depth: usize, max: usize },
    InvertedRange { from: usize, to: usize },
}

impl Display for PositionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { pos, size } => {
                write!(f, "position {pos} outside document of size {size}")
            }
            Self::DepthOutOfRange { depth, max } => {
                write!(f, "depth {depth} not available (valid range 1..={max})")
            }
            Self::InvertedRange { from, to } => write!(f, "range {from}..{to} is inverted"),
        }
    }
}

impl Error for PositionError {}

#[derive(Debug, Clone, Copy)]
struct Level<'a> {
    node: &'a Node,
    index: usize,
    /// Absolute position of the start of child `index`.
    offset: usize,
}

/// A position together with its ancestor path.
#[derive(Debug, Clone)]
pub struct ResolvedPos<'a> {
    pos: usize,
    levels: Vec<Level<'a>>,
    parent_offset: usize,
}

impl<'a> ResolvedPos<'a> {
    pub(crate) fn resolve(doc: &'a Node, pos: usize) -> Result<Self, PositionError> {
        let size = doc.content().size();
        if pos > size {
            return Err(PositionError::OutOfRange { pos, size });
        }

        let mut levels = Vec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = doc;
        loop {
            let (index, offset) = node.content().find_index(parent_offset);
            let rem = parent_offset - offset;
            levels.push(Level {
                node,
                index,
                offset: start + offset,
            });
            if rem == 0 {
                break;
            }
            node = node.child(index);
            if node.is_text() {
                break;
            }
            parent_offset = rem - 1;
            start += offset + 1;
        }

        Ok(Self {
            pos,
            levels,
            parent_offset,
        })
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Offset into the innermost ancestor's content.
    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    pub fn parent(&self) -> &'a Node {
        self.level_node(self.depth())
    }

    pub fn doc(&self) -> &'a Node {
        self.levels[0].node
    }

    fn check_depth(&self, depth: usize) -> Result<(), PositionError> {
        if depth > self.depth() {
            return Err(PositionError::DepthOutOfRange {
                depth,
                max: self.depth(),
            });
        }
        Ok(())
    }

    fn check_block_depth(&self, depth: usize) -> Result<(), PositionError> {
        if depth == 0 {
            return Err(PositionError::DepthOutOfRange {
                depth,
                max: self.depth(),
            });
        }
        self.check_depth(depth)
    }

    /// Ancestor at `depth`.
    pub fn node(&self, depth: usize) -> Result<&'a Node, PositionError> {
        self.check_depth(depth)?;
        Ok(self.level_node(depth))
    }

    /// Index into the ancestor at `depth`.
    pub fn index(&self, depth: usize) -> Result<usize, PositionError> {
        self.check_depth(depth)?;
        Ok(self.level_index(depth))
    }

    /// Start of the content of the ancestor at `depth`.
    pub fn start(&self, depth: usize) -> Result<usize, PositionError> {
        self.check_depth(depth)?;
        Ok(self.level_start(depth))
    }

    /// End of the content of the ancestor at `depth`.
    pub fn end(&self, depth: usize) -> Result<usize, PositionError> {
        self.check_depth(depth)?;
        Ok(self.level_end(depth))
    }

    /// Position directly before the ancestor at `depth`.
    pub fn before(&self, depth: usize) -> Result<usize, PositionError> {
        self.check_block_depth(depth)?;
        Ok(self.level_before(depth))
    }

    /// Position directly after the ancestor at `depth`.
    pub fn after(&self, depth: usize) -> Result<usize, PositionError> {
        self.check_block_depth(depth)?;
        Ok(self.level_before(depth) + self.level_node(depth).size())
    }

    pub(crate) fn level_node(&self, depth: usize) -> &'a Node {
        self.levels[depth].node
    }

    pub(crate) fn level_index(&self, depth: usize) -> usize {
        self.levels[depth].index
    }

    pub(crate) fn level_start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.levels[depth - 1].offset + 1
        }
    }

    pub(crate) fn level_end(&self, depth: usize) -> usize {
        self.level_start(depth) + self.level_node(depth).content().size()
    }

    pub(crate) fn level_before(&self, depth: usize) -> usize {
        self.levels[depth - 1].offset
    }

    /// Offset into the text run the position points into; 0 between nodes.
    pub fn text_offset(&self) -> usize {
        self.pos - self.levels[self.depth()].offset
    }

    /// Node directly after the position, cut if it points into text.
    pub fn node_after(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.level_index(self.depth());
        let child = parent.maybe_child(index)?;
        let offset = self.text_offset();
        if offset > 0 {
            Some(child.cut(offset, child.size()))
        } else {
            Some(child.clone())
        }
    }

    /// Node directly before the position, cut if it points into text.
    pub fn node_before(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.level_index(self.depth());
        let offset = self.text_offset();
        if offset > 0 {
            return Some(parent.child(index).cut(0, offset));
        }
        if index == 0 {
            None
        } else {
            Some(parent.child(index - 1).clone())
        }
    }

    /// Marks that text typed at this position would inherit.
    ///
    /// Non-inclusive marks only carry over when the node after the position
    /// has them too.
    pub fn marks(&self, schema: &Schema) -> MarkSet {
        let parent = self.parent();
        let index = self.level_index(self.depth());
        if parent.content().size() == 0 {
            return MarkSet::new();
        }
        if self.text_offset() > 0 {
            return parent.child(index).marks().clone();
        }

        let before = index.checked_sub(1).and_then(|i| parent.maybe_child(i));
        let after = parent.maybe_child(index);
        let (main, other) = match before {
            Some(before) => (before, after),
            None => match after {
                Some(after) => (after, None),
                None => return MarkSet::new(),
            },
        };

        let mut marks = main.marks().clone();
        for mark in main.marks() {
            let inclusive = schema.mark_type(mark.type_id()).is_inclusive();
            if !inclusive && !other.is_some_and(|node| node.marks().contains(mark)) {
                marks = marks.remove(mark);
            }
        }
        marks
    }

    /// Deepest depth whose content range contains `pos`.
    pub fn shared_depth(&self, pos: usize) -> usize {
        (1..=self.depth())
            .rev()
            .find(|depth| self.level_start(*depth) <= pos && self.level_end(*depth) >= pos)
            .unwrap_or(0)
    }

    /// Whether both positions share the same innermost parent.
    pub fn same_parent(&self, other: &ResolvedPos<'_>) -> bool {
        self.depth() == other.depth() && self.level_start(self.depth()) == other.level_start(other.depth())
    }
}

#[cfg(test)]
mod tests {
    use super::PositionError;
    use crate::model::attrs::Attrs;
    use crate::model::mark::MarkSet;
    use crate::model::node::Node;
    use crate::schema::Schema;

    fn doc(schema: &Schema) -> Node {
        // <doc><blockquote><paragraph>ab</paragraph></blockquote><paragraph>cd</paragraph></doc>
        let inner = schema
            .node("paragraph", Attrs::new(), vec![Node::text("ab", MarkSet::new())])
            .expect("paragraph");
        let quote = schema
            .node("blockquote", Attrs::new(), vec![inner])
            .expect("blockquote");
        let tail = schema
            .node("paragraph", Attrs::new(), vec![Node::text("cd", MarkSet::new())])
            .expect("paragraph");
        schema
            .node("doc", Attrs::new(), vec![quote, tail])
            .expect("doc")
    }

    #[test]
    fn resolves_nested_positions() {
        let schema = Schema::notes().expect("schema");
        let doc = doc(&schema);
        let pos = doc.resolve(3).expect("resolve");
        assert_eq!(pos.depth(), 2);
        assert_eq!(pos.parent_offset(), 1);
        assert_eq!(pos.text_offset(), 1);
        assert_eq!(pos.start(2), Ok(2));
        assert_eq!(pos.end(2), Ok(4));
        assert_eq!(pos.before(1), Ok(0));
        assert_eq!(pos.after(1), Ok(6));
        assert_eq!(pos.before(2), Ok(1));
        assert_eq!(pos.index(0), Ok(0));
        assert_eq!(pos.node_before().and_then(|n| n.text_str().map(str::to_string)), Some("a".into()));
        assert_eq!(pos.node_after().and_then(|n| n.text_str().map(str::to_string)), Some("b".into()));
    }

    #[test]
    fn rejects_depth_zero_boundaries_and_out_of_range() {
        let schema = Schema::notes().expect("schema");
        let doc = doc(&schema);
        let pos = doc.resolve(3).expect("resolve");
        assert!(matches!(pos.before(0), Err(PositionError::DepthOutOfRange { .. })));
        assert!(matches!(pos.after(0), Err(PositionError::DepthOutOfRange { .. })));
        assert!(matches!(pos.node(3), Err(PositionError::DepthOutOfRange { .. })));
        assert!(matches!(
            doc.resolve(11),
            Err(PositionError::OutOfRange { pos: 11, size: 10 })
        ));
    }

    #[test]
    fn shared_depth_finds_common_ancestor() {
        let schema = Schema::notes().expect("schema");
        let doc = doc(&schema);
        let pos = doc.resolve(3).expect("resolve");
        assert_eq!(pos.shared_depth(4), 2);
        assert_eq!(pos.shared_depth(5), 1);
        assert_eq!(pos.shared_depth(8), 0);
    }

    #[test]
    fn non_inclusive_marks_do_not_extend_at_end() {
        let schema = Schema::notes().expect("schema");
        let link = schema
            .mark("link", crate::model::attrs::attrs([("note_title", "A")]))
            .expect("link");
        let linked = Node::text("A", schema.add_mark(&MarkSet::new(), link));
        let paragraph = schema
            .node("paragraph", Attrs::new(), vec![linked])
            .expect("paragraph");
        let doc = schema.node("doc", Attrs::new(), vec![paragraph]).expect("doc");
        assert!(doc.resolve(2).expect("resolve").marks(&schema).is_empty());
    }
}
