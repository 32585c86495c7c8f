//! Atomic document edits.

use crate::model::attrs::Attrs;
use crate::model::fragment::Fragment;
use crate::model::mark::{Mark, MarkSet};
use crate::model::node::Node;
use crate::model::position::PositionError;
use crate::model::replace::ReplaceError;
use crate::model::slice::Slice;
use crate::schema::{AttrError, MarkTypeId, Schema};
use crate::transform::mapping::{Assoc, Mapping, StepMap};

/// One edit, expressed in the coordinates of the transaction's base document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Remove `[from, to)` and insert `slice` at `from`.
    Replace { from: usize, to: usize, slice: Slice },
    /// Replace the attribute map of the element starting at `pos`.
    SetAttrs { pos: usize, attrs: Attrs },
    /// Add `mark` to every text run in `[from, to)`.
    AddMark { from: usize, to: usize, mark: Mark },
    /// Remove marks of `mark_type` from every text run in `[from, to)`.
    RemoveMark {
        from: usize,
        to: usize,
        mark_type: MarkTypeId,
    },
}

/// Step failure before it is attributed to a transaction index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StepError {
    Position(PositionError),
    Replace(ReplaceError),
    Attrs(AttrError),
    NoNodeAt(usize),
}

impl From<PositionError> for StepError {
    fn from(value: PositionError) -> Self {
        Self::Position(value)
    }
}

impl From<ReplaceError> for StepError {
    fn from(value: ReplaceError) -> Self {
        match value {
            ReplaceError::Position(err) => Self::Position(err),
            other => Self::Replace(other),
        }
    }
}

impl From<AttrError> for StepError {
    fn from(value: AttrError) -> Self {
        Self::Attrs(value)
    }
}

fn map_range(mapping: &Mapping, from: usize, to: usize) -> (usize, usize) {
    let from = mapping.map_assoc(from, Assoc::After);
    let to = mapping.map_assoc(to, Assoc::Before).max(from);
    (from, to)
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Replace { .. } => "replace",
            Self::SetAttrs { .. } => "set_attrs",
            Self::AddMark { .. } => "add_mark",
            Self::RemoveMark { .. } => "remove_mark",
        }
    }

    /// Rewrites the step's positions through prior steps of the same transaction.
    pub fn map(&self, mapping: &Mapping) -> Step {
        if mapping.is_empty() {
            return self.clone();
        }
        match self {
            Self::Replace { from, to, slice } => {
                let (from, to) = map_range(mapping, *from, *to);
                Self::Replace {
                    from,
                    to,
                    slice: slice.clone(),
                }
            }
            Self::SetAttrs { pos, attrs } => Self::SetAttrs {
                pos: mapping.map_assoc(*pos, Assoc::After),
                attrs: attrs.clone(),
            },
            Self::AddMark { from, to, mark } => {
                let (from, to) = map_range(mapping, *from, *to);
                Self::AddMark {
                    from,
                    to,
                    mark: mark.clone(),
                }
            }
            Self::RemoveMark {
                from,
                to,
                mark_type,
            } => {
                let (from, to) = map_range(mapping, *from, *to);
                Self::RemoveMark {
                    from,
                    to,
                    mark_type: *mark_type,
                }
            }
        }
    }

    /// Applies the step to `doc`, returning the new document and its map.
    pub(crate) fn apply(&self, schema: &Schema, doc: &Node) -> Result<(Node, StepMap), StepError> {
        match self {
            Self::Replace { from, to, slice } => {
                let next = doc.replace(schema, *from, *to, slice)?;
                Ok((next, StepMap::new(*from, to - from, slice.size())))
            }
            Self::SetAttrs { pos, attrs } => {
                let node = doc.node_at(*pos).ok_or(StepError::NoNodeAt(*pos))?;
                let ty = node.element_type().ok_or(StepError::NoNodeAt(*pos))?;
                let parsed = schema.check_attrs(ty, attrs)?;
                let updated = node.with_attrs(parsed);
                let slice = Slice::closed(Fragment::from_node(updated));
                let next = doc.replace(schema, *pos, pos + node.size(), &slice)?;
                Ok((next, StepMap::identity()))
            }
            Self::AddMark { from, to, mark } => {
                let next = map_marks(schema, doc, *from, *to, &|marks: &MarkSet| {
                    schema.add_mark(marks, mark.clone())
                })?;
                Ok((next, StepMap::identity()))
            }
            Self::RemoveMark {
                from,
                to,
                mark_type,
            } => {
                let next = map_marks(schema, doc, *from, *to, &|marks: &MarkSet| {
                    marks.remove_type(*mark_type)
                })?;
                Ok((next, StepMap::identity()))
            }
        }
    }
}

/// Rewrites text mark sets in `[from, to)` and replaces the range with the
/// result; runs split at the boundaries and re-merge when marks match.
fn map_marks(
    schema: &Schema,
    doc: &Node,
    from: usize,
    to: usize,
    update: &dyn Fn(&MarkSet) -> MarkSet,
) -> Result<Node, StepError> {
    let old = doc.slice(from, to)?;
    if old.is_empty() {
        return Ok(doc.clone());
    }
    let resolved = doc.resolve(from)?;
    let parent = resolved.level_node(resolved.shared_depth(to));
    let content = map_fragment(schema, old.content(), parent, update);
    let slice = Slice::new(content, old.open_start(), old.open_end());
    Ok(doc.replace(schema, from, to, &slice)?)
}

fn map_fragment(
    schema: &Schema,
    fragment: &Fragment,
    parent: &Node,
    update: &dyn Fn(&MarkSet) -> MarkSet,
) -> Fragment {
    let marks_allowed = schema
        .node_type(schema.type_of(parent))
        .marks_allowed();
    let mapped = fragment
        .iter()
        .map(|child| {
            if child.content().size() > 0 {
                child.with_content(map_fragment(schema, child.content(), child, update))
            } else if child.is_text() && marks_allowed {
                child.with_marks(update(child.marks()))
            } else {
                child.clone()
            }
        })
        .collect();
    Fragment::from_nodes(mapped)
}
