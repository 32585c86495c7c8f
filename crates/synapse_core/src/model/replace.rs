//! Structural replace: remove `[from, to)` and fit an open slice in its place.
//!
//! # Invariants
//! - Every node whose content changes is re-checked against the schema.
//! - Closed nodes carried in by a slice must already satisfy the schema.
//! - Open slice edges are joined only onto nodes with compatible content.

use crate::model::fragment::Fragment;
use crate::model::node::Node;
use crate::model::position::{PositionError, ResolvedPos};
use crate::model::slice::Slice;
use crate::schema::Schema;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why a replace could not produce a valid document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceError {
    Position(PositionError),
    DeeperThanInsertion,
    InconsistentOpenDepths,
    IncompatibleJoin { from: String, onto: String },
    InvalidContent { node: String },
}

impl Display for ReplaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Position(err) => write!(f, "{err}"),
            Self::DeeperThanInsertion => {
                write!(f, "inserted content deeper than insertion position")
            }
            Self::InconsistentOpenDepths => write!(f, "inconsistent open depths"),
            Self::IncompatibleJoin { from, onto } => write!(f, "cannot join `{from}` onto `{onto}`"),
            Self::InvalidContent { node } => {
                write!(f, "replacement leaves invalid content in `{node}`")
            }
        }
    }
}

impl Error for ReplaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Position(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PositionError> for ReplaceError {
    fn from(value: PositionError) -> Self {
        Self::Position(value)
    }
}

type ReplaceResult<T> = Result<T, ReplaceError>;

impl Node {
    /// Returns a copy of this document with `[from, to)` replaced by `slice`.
    pub fn replace(
        &self,
        schema: &Schema,
        from: usize,
        to: usize,
        slice: &Slice,
    ) -> ReplaceResult<Node> {
        if to < from {
            return Err(PositionError::InvertedRange { from, to }.into());
        }
        let start = self.resolve(from)?;
        let end = self.resolve(to)?;
        replace(schema, &start, &end, slice)
    }
}

fn replace(
    schema: &Schema,
    from: &ResolvedPos<'_>,
    to: &ResolvedPos<'_>,
    slice: &Slice,
) -> ReplaceResult<Node> {
    if slice.open_start() > from.depth() {
        return Err(ReplaceError::DeeperThanInsertion);
    }
    if from.depth() + slice.open_end() != to.depth() + slice.open_start() {
        return Err(ReplaceError::InconsistentOpenDepths);
    }
    check_slice_content(schema, slice.content(), slice.open_start(), slice.open_end())?;
    replace_outer(schema, from, to, slice, 0)
}

/// Recursively validates every closed node in a slice. Nodes on the open
/// edges are skipped here; their content is checked when they are joined.
fn check_slice_content(
    schema: &Schema,
    content: &Fragment,
    open_start: usize,
    open_end: usize,
) -> ReplaceResult<()> {
    let last = content.child_count().saturating_sub(1);
    for (index, child) in content.iter().enumerate() {
        if child.is_text() {
            continue;
        }
        let inner_start = if index == 0 { open_start.saturating_sub(1) } else { 0 };
        let inner_end = if index == last { open_end.saturating_sub(1) } else { 0 };
        let is_open = (index == 0 && open_start > 0) || (index == last && open_end > 0);
        if !is_open {
            let ty = schema.type_of(child);
            if !schema.check_content(ty, child.content()) {
                return Err(ReplaceError::InvalidContent {
                    node: schema.node_type(ty).name().to_string(),
                });
            }
        }
        check_slice_content(schema, child.content(), inner_start, inner_end)?;
    }
    Ok(())
}

fn replace_outer(
    schema: &Schema,
    from: &ResolvedPos<'_>,
    to: &ResolvedPos<'_>,
    slice: &Slice,
    depth: usize,
) -> ReplaceResult<Node> {
    let index = from.level_index(depth);
    let node = from.level_node(depth);

    if index == to.level_index(depth) && depth < from.depth() - slice.open_start() {
        let inner = replace_outer(schema, from, to, slice, depth + 1)?;
        return Ok(node.with_content(node.content().replace_child(index, inner)));
    }

    if slice.content().size() == 0 {
        let content = replace_two_way(schema, from, to, depth)?;
        return close(schema, node, content);
    }

    if slice.open_start() == 0
        && slice.open_end() == 0
        && from.depth() == depth
        && to.depth() == depth
    {
        let parent = from.parent();
        let content = parent.content();
        let joined = content
            .cut(0, from.parent_offset())
            .append(slice.content())
            .append(&content.cut(to.parent_offset(), content.size()));
        return close(schema, parent, joined);
    }

    let extra = from.depth() - slice.open_start();
    let wrapper = prepare_slice_for_replace(slice, from, extra);
    let inner_end = wrapper
        .content()
        .size()
        .checked_sub(slice.open_end() + extra)
        .ok_or(ReplaceError::InconsistentOpenDepths)?;
    let start = wrapper.resolve(slice.open_start() + extra)?;
    let end = wrapper.resolve(inner_end)?;
    let content = replace_three_way(schema, from, &start, &end, to, depth)?;
    close(schema, node, content)
}

/// Wraps the slice content in copies of the ancestors of `along` so its
/// open edges can be resolved like document positions.
fn prepare_slice_for_replace(slice: &Slice, along: &ResolvedPos<'_>, extra: usize) -> Node {
    let mut node = along
        .level_node(extra)
        .with_content(slice.content().clone());
    for depth in (0..extra).rev() {
        node = along
            .level_node(depth)
            .with_content(Fragment::from_node(node));
    }
    node
}

fn close(schema: &Schema, node: &Node, content: Fragment) -> ReplaceResult<Node> {
    let ty = schema.type_of(node);
    if !schema.check_content(ty, &content) {
        return Err(ReplaceError::InvalidContent {
            node: schema.node_type(ty).name().to_string(),
        });
    }
    Ok(node.with_content(content))
}

fn check_join(schema: &Schema, main: &Node, sub: &Node) -> ReplaceResult<()> {
    let (main_ty, sub_ty) = (schema.type_of(main), schema.type_of(sub));
    if !schema.compatible_content(main_ty, sub_ty) {
        return Err(ReplaceError::IncompatibleJoin {
            from: schema.node_type(sub_ty).name().to_string(),
            onto: schema.node_type(main_ty).name().to_string(),
        });
    }
    Ok(())
}

fn joinable<'a>(
    schema: &Schema,
    before: &ResolvedPos<'a>,
    after: &ResolvedPos<'_>,
    depth: usize,
) -> ReplaceResult<&'a Node> {
    if before.depth() < depth || after.depth() < depth {
        return Err(ReplaceError::InconsistentOpenDepths);
    }
    let node = before.level_node(depth);
    check_join(schema, node, after.level_node(depth))?;
    Ok(node)
}

fn add_range(
    start: Option<&ResolvedPos<'_>>,
    end: Option<&ResolvedPos<'_>>,
    depth: usize,
    target: &mut Vec<Node>,
) {
    let node: &Node = match (end, start) {
        (Some(end), _) => end.level_node(depth),
        (None, Some(start)) => start.level_node(depth),
        (None, None) => return,
    };
    let end_index = end.map_or(node.child_count(), |end| end.level_index(depth));

    let mut start_index = 0;
    if let Some(start) = start {
        start_index = start.level_index(depth);
        if start.depth() > depth {
            start_index += 1;
        } else if start.text_offset() > 0 {
            target.extend(start.node_after());
            start_index += 1;
        }
    }

    for index in start_index..end_index {
        target.push(node.child(index).clone());
    }

    if let Some(end) = end {
        if end.depth() == depth && end.text_offset() > 0 {
            target.extend(end.node_before());
        }
    }
}

fn replace_three_way(
    schema: &Schema,
    from: &ResolvedPos<'_>,
    start: &ResolvedPos<'_>,
    end: &ResolvedPos<'_>,
    to: &ResolvedPos<'_>,
    depth: usize,
) -> ReplaceResult<Fragment> {
    let open_start = if from.depth() > depth {
        Some(joinable(schema, from, start, depth + 1)?)
    } else {
        None
    };
    let open_end = if to.depth() > depth {
        Some(joinable(schema, end, to, depth + 1)?)
    } else {
        None
    };

    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    match (open_start, open_end) {
        (Some(open_start), Some(open_end))
            if start.level_index(depth) == end.level_index(depth) =>
        {
            check_join(schema, open_start, open_end)?;
            let inner = replace_three_way(schema, from, start, end, to, depth + 1)?;
            content.push(close(schema, open_start, inner)?);
        }
        _ => {
            if let Some(open_start) = open_start {
                let inner = replace_two_way(schema, from, start, depth + 1)?;
                content.push(close(schema, open_start, inner)?);
            }
            add_range(Some(start), Some(end), depth, &mut content);
            if let Some(open_end) = open_end {
                let inner = replace_two_way(schema, end, to, depth + 1)?;
                content.push(close(schema, open_end, inner)?);
            }
        }
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_nodes(content))
}

fn replace_two_way(
    schema: &Schema,
    from: &ResolvedPos<'_>,
    to: &ResolvedPos<'_>,
    depth: usize,
) -> ReplaceResult<Fragment> {
    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    if from.depth() > depth {
        let node = joinable(schema, from, to, depth + 1)?;
        let inner = replace_two_way(schema, from, to, depth + 1)?;
        content.push(close(schema, node, inner)?);
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_nodes(content))
}

#[cfg(test)]
mod tests {
    use super::ReplaceError;
    use crate::model::attrs::Attrs;
    use crate::model::fragment::Fragment;
    use crate::model::mark::MarkSet;
    use crate::model::node::Node;
    use crate::model::slice::Slice;
    use crate::schema::Schema;

    fn paragraph(schema: &Schema, text: &str) -> Node {
        let content = if text.is_empty() {
            vec![]
        } else {
            vec![Node::text(text, MarkSet::new())]
        };
        schema
            .node("paragraph", Attrs::new(), content)
            .expect("paragraph")
    }

    fn doc(schema: &Schema, blocks: Vec<Node>) -> Node {
        schema.node("doc", Attrs::new(), blocks).expect("doc")
    }

    #[test]
    fn inserts_text_inside_a_paragraph() {
        let schema = Schema::notes().expect("schema");
        let before = doc(&schema, vec![paragraph(&schema, "held")]);
        let slice = Slice::closed(Fragment::from_node(Node::text("l", MarkSet::new())));
        let after = before.replace(&schema, 3, 3, &slice).expect("insert");
        assert_eq!(after.text_content(), "helld");
    }

    #[test]
    fn deleting_across_blocks_joins_textblocks() {
        let schema = Schema::notes().expect("schema");
        let before = doc(
            &schema,
            vec![paragraph(&schema, "ab"), paragraph(&schema, "cd")],
        );
        let after = before
            .replace(&schema, 3, 5, &Slice::empty())
            .expect("join");
        assert_eq!(after, doc(&schema, vec![paragraph(&schema, "abcd")]));
    }

    #[test]
    fn open_slice_splits_and_rejoins_paragraph() {
        let schema = Schema::notes().expect("schema");
        let before = doc(&schema, vec![paragraph(&schema, "abcd")]);
        // "x</p><p>y" inserted between b and c
        let slice = Slice::new(
            Fragment::from_nodes(vec![paragraph(&schema, "x"), paragraph(&schema, "y")]),
            1,
            1,
        );
        let after = before.replace(&schema, 3, 3, &slice).expect("split");
        assert_eq!(
            after,
            doc(
                &schema,
                vec![paragraph(&schema, "abx"), paragraph(&schema, "ycd")]
            )
        );
    }

    #[test]
    fn removing_the_only_block_violates_doc_content() {
        let schema = Schema::notes().expect("schema");
        let before = doc(&schema, vec![paragraph(&schema, "ab")]);
        let err = before
            .replace(&schema, 0, 4, &Slice::empty())
            .expect_err("doc needs a block");
        assert_eq!(
            err,
            ReplaceError::InvalidContent {
                node: "doc".to_string()
            }
        );
    }

    #[test]
    fn rejects_closed_slice_nodes_with_invalid_content() {
        let schema = Schema::notes().expect("schema");
        let before = doc(&schema, vec![paragraph(&schema, "ab")]);
        let quote = schema
            .node("blockquote", Attrs::new(), vec![paragraph(&schema, "q")])
            .expect("blockquote")
            .with_content(Fragment::from_node(Node::text("raw", MarkSet::new())));
        let err = before
            .replace(&schema, 0, 0, &Slice::closed(Fragment::from_node(quote)))
            .expect_err("blockquote cannot hold bare text");
        assert_eq!(
            err,
            ReplaceError::InvalidContent {
                node: "blockquote".to_string()
            }
        );
        assert_eq!(before.text_content(), "ab");
    }

    #[test]
    fn rejects_inconsistent_open_depths() {
        let schema = Schema::notes().expect("schema");
        let before = doc(&schema, vec![paragraph(&schema, "ab")]);
        let slice = Slice::new(Fragment::from_node(paragraph(&schema, "x")), 1, 0);
        let err = before.replace(&schema, 2, 2, &slice).expect_err("depth mismatch");
        assert_eq!(err, ReplaceError::InconsistentOpenDepths);
    }
}
