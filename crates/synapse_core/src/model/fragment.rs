//! Ordered child sequences with cached offsets.
//!
//! # Invariants
//! - `ends[i]` is the position right after child `i`, relative to the
//!   fragment start. It is rebuilt on every construction.
//! - No empty text children and no two adjacent text children with equal
//!   mark sets.

use crate::model::node::Node;

/// Immutable child sequence of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    children: Vec<Node>,
    ends: Vec<usize>,
}

pub(crate) static EMPTY_FRAGMENT: Fragment = Fragment::empty();

impl Fragment {
    pub const fn empty() -> Self {
        Self {
            children: Vec::new(),
            ends: Vec::new(),
        }
    }

    /// Builds a normalized fragment: empty text dropped, equal-mark text merged.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut children: Vec<Node> = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let Node::Text(text) = &node {
                if text.is_empty() {
                    continue;
                }
                if let Some(Node::Text(last)) = children.last_mut() {
                    if last.marks() == text.marks() {
                        last.push_str(text.text());
                        continue;
                    }
                }
            }
            children.push(node);
        }

        let mut ends = Vec::with_capacity(children.len());
        let mut end = 0;
        for child in &children {
            end += child.size();
            ends.push(end);
        }
        Self { children, ends }
    }

    pub fn from_node(node: Node) -> Self {
        Self::from_nodes(vec![node])
    }

    pub fn size(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// # Panics
    /// Panics if `index` is out of range.
    pub fn child(&self, index: usize) -> &Node {
        &self.children[index]
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.children.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.children.iter()
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.children
    }

    /// Offset of the start of child `index` (or of the end for `child_count`).
    pub fn child_start(&self, index: usize) -> usize {
        if index == 0 {
            0
        } else {
            self.ends[index - 1]
        }
    }

    /// Finds the child whose range contains `pos`.
    ///
    /// Returns `(index, child_start)`. A position on a boundary belongs to
    /// the following child; `pos == size` yields `(child_count, size)`.
    pub fn find_index(&self, pos: usize) -> (usize, usize) {
        let index = self.ends.partition_point(|end| *end <= pos);
        (index, self.child_start(index))
    }

    /// Returns the part of the fragment between two relative positions.
    pub fn cut(&self, from: usize, to: usize) -> Fragment {
        let to = to.min(self.size());
        if from == 0 && to == self.size() {
            return self.clone();
        }
        let mut result = Vec::new();
        if to > from {
            for (index, child) in self.children.iter().enumerate() {
                let start = self.child_start(index);
                if start >= to {
                    break;
                }
                let end = self.ends[index];
                if end <= from {
                    continue;
                }
                if start < from || end > to {
                    result.push(child.cut_relative(from.saturating_sub(start), to - start));
                } else {
                    result.push(child.clone());
                }
            }
        }
        Fragment::from_nodes(result)
    }

    /// Concatenates two fragments, joining text at the seam.
    pub fn append(&self, other: &Fragment) -> Fragment {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut nodes = self.children.clone();
        nodes.extend(other.children.iter().cloned());
        Fragment::from_nodes(nodes)
    }

    /// Returns a copy with child `index` swapped for `node`.
    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        let mut nodes = self.children.clone();
        nodes[index] = node;
        Fragment::from_nodes(nodes)
    }

    /// Calls `f` for each descendant overlapping `[from, to)`.
    ///
    /// `f` receives the node, its absolute start and its parent; returning
    /// `false` skips that node's children.
    pub fn nodes_between<'a, F>(
        &'a self,
        from: usize,
        to: usize,
        f: &mut F,
        node_start: usize,
        parent: &'a Node,
    ) where
        F: FnMut(&'a Node, usize, &'a Node) -> bool,
    {
        for (index, child) in self.children.iter().enumerate() {
            let pos = self.child_start(index);
            if pos >= to {
                break;
            }
            let end = self.ends[index];
            if end > from && f(child, node_start + pos, parent) && child.content().size() > 0 {
                let start = pos + 1;
                child.content().nodes_between(
                    from.saturating_sub(start),
                    (to - start).min(child.content().size()),
                    f,
                    node_start + start,
                    child,
                );
            }
        }
    }

    /// Concatenated text between two relative positions.
    ///
    /// `block_separator` is inserted between textblocks and block leaves;
    /// inline and block leaves contribute `leaf_text`.
    pub fn text_between(
        &self,
        from: usize,
        to: usize,
        block_separator: Option<&str>,
        leaf_text: &str,
        parent: &Node,
    ) -> String {
        let mut text = String::new();
        let mut first = true;
        self.nodes_between(
            from,
            to,
            &mut |node: &Node, pos: usize, _parent: &Node| {
                let node_text = match node {
                    Node::Text(run) => {
                        let start = from.max(pos) - pos;
                        let end = (to - pos).min(run.len());
                        run.char_slice(start, end).to_string()
                    }
                    Node::Element(_) if node.is_leaf() => leaf_text.to_string(),
                    Node::Element(_) => String::new(),
                };
                if let Some(separator) = block_separator {
                    let separates = node.is_textblock() || (node.is_leaf() && !node.is_inline());
                    if separates {
                        if first {
                            first = false;
                        } else {
                            text.push_str(separator);
                        }
                    }
                }
                text.push_str(&node_text);
                true
            },
            0,
            parent,
        );
        text
    }
}

impl<'a> IntoIterator for &'a Fragment {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::Fragment;
    use crate::model::mark::MarkSet;
    use crate::model::node::Node;

    #[test]
    fn from_nodes_merges_equal_text_and_drops_empty() {
        let fragment = Fragment::from_nodes(vec![
            Node::text("ab", MarkSet::new()),
            Node::text("", MarkSet::new()),
            Node::text("cd", MarkSet::new()),
        ]);
        assert_eq!(fragment.child_count(), 1);
        assert_eq!(fragment.size(), 4);
        assert_eq!(fragment.child(0).text_str(), Some("abcd"));
    }

    #[test]
    fn find_index_assigns_boundaries_to_following_child() {
        let fragment = Fragment::from_nodes(vec![Node::text("héllo", MarkSet::new())]);
        assert_eq!(fragment.find_index(0), (0, 0));
        assert_eq!(fragment.find_index(3), (0, 0));
        assert_eq!(fragment.find_index(5), (1, 5));
    }

    #[test]
    fn cut_slices_text_by_characters() {
        let fragment = Fragment::from_nodes(vec![Node::text("héllo wörld", MarkSet::new())]);
        let cut = fragment.cut(1, 8);
        assert_eq!(cut.child(0).text_str(), Some("éllo wö"));
        assert_eq!(cut.size(), 7);
    }
}
