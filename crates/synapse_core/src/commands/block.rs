//! Top-level block operations.
//!
//! # Responsibility
//! - Locate the block around the selection head via `before(1)`.
//!
//! # Invariants
//! - A move is one transaction that also carries the follow-up selection.

use crate::model::node::Node;
use crate::model::selection::Selection;
use crate::transform::Transaction;

/// The top-level block around a position.
#[derive(Debug, Clone, Copy)]
pub struct TopBlock<'a> {
    pub node: &'a Node,
    /// Index among the document's children.
    pub index: usize,
    /// Position before the block.
    pub start: usize,
    /// Position after the block.
    pub end: usize,
}

impl<'a> TopBlock<'a> {
    /// Resolves the top-level block containing (or starting at) `pos`.
    pub fn at(doc: &'a Node, pos: usize) -> Option<Self> {
        let resolved = doc.resolve(pos).ok()?;
        let (node, index, start) = if resolved.depth() >= 1 {
            (
                resolved.node(1).ok()?,
                resolved.index(0).ok()?,
                resolved.before(1).ok()?,
            )
        } else {
            (doc.node_at(pos)?, resolved.index(0).ok()?, pos)
        };
        Some(Self {
            node,
            index,
            start,
            end: start + node.size(),
        })
    }
}

/// Shifts a selection that travels with a moved block.
fn shift(selection: Selection, block: &TopBlock<'_>, offset: isize) -> Selection {
    let moved = |pos: usize| pos.saturating_add_signed(offset);
    let inside = |pos: usize| pos >= block.start && pos <= block.end;
    if inside(selection.anchor) && inside(selection.head) {
        Selection::new(moved(selection.anchor), moved(selection.head))
    } else {
        Selection::cursor(moved(selection.head))
    }
}

/// Inserts a copy of the current block right after it.
pub fn duplicate_block(doc: &Node, selection: Selection) -> Option<Transaction> {
    let block = TopBlock::at(doc, selection.head)?;
    Some(
        Transaction::new()
            .insert(block.end, vec![block.node.clone()])
            .set_meta("command", "duplicate_block"),
    )
}

/// Removes the current block; the cursor lands in its neighbour.
pub fn delete_block(doc: &Node, selection: Selection) -> Option<Transaction> {
    let block = TopBlock::at(doc, selection.head)?;
    let cursor = if block.index + 1 < doc.child_count() {
        let next = doc.child(block.index + 1);
        if next.is_leaf() {
            block.start
        } else {
            block.start + 1
        }
    } else if block.index > 0 {
        let previous = doc.child(block.index - 1);
        if previous.is_leaf() {
            block.start - previous.size()
        } else {
            block.start - 1
        }
    } else {
        block.start
    };
    Some(
        Transaction::new()
            .delete(block.start, block.end)
            .set_selection(Selection::cursor(cursor))
            .set_meta("command", "delete_block"),
    )
}

/// Swaps the current block with the one before it.
pub fn move_block_up(doc: &Node, selection: Selection) -> Option<Transaction> {
    let block = TopBlock::at(doc, selection.head)?;
    if block.index == 0 {
        return None;
    }
    let previous = doc.child(block.index - 1);
    let target = block.start - previous.size();
    Some(
        Transaction::new()
            .delete(block.start, block.end)
            .insert(target, vec![block.node.clone()])
            .set_selection(shift(selection, &block, -(previous.size() as isize)))
            .set_meta("command", "move_block_up"),
    )
}

/// Swaps the current block with the one after it.
pub fn move_block_down(doc: &Node, selection: Selection) -> Option<Transaction> {
    let block = TopBlock::at(doc, selection.head)?;
    if block.index + 1 >= doc.child_count() {
        return None;
    }
    let next = doc.child(block.index + 1);
    let target = block.end + next.size();
    Some(
        Transaction::new()
            .delete(block.start, block.end)
            .insert(target, vec![block.node.clone()])
            .set_selection(shift(selection, &block, next.size() as isize))
            .set_meta("command", "move_block_down"),
    )
}
