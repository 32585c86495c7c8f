//! Block commands: whole top-level block operations.
//!
//! # Responsibility
//! - Resolve the top-level block around the selection head.
//! - Build duplicate/delete/move transactions for it.
//!
//! # Invariants
//! - Commands never mutate; they return a transaction or `None`.
//! - `None` means "not applicable here" (document boundary, no block).

mod block;

pub use block::{delete_block, duplicate_block, move_block_down, move_block_up, TopBlock};

use crate::model::node::Node;
use crate::model::selection::Selection;
use crate::transform::Transaction;

/// Signature shared by every block command.
pub type Command = fn(&Node, Selection) -> Option<Transaction>;

/// Named block commands, for key bindings and menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockCommand {
    Duplicate,
    Delete,
    MoveUp,
    MoveDown,
}

impl BlockCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate_block",
            Self::Delete => "delete_block",
            Self::MoveUp => "move_block_up",
            Self::MoveDown => "move_block_down",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "duplicate_block" => Some(Self::Duplicate),
            "delete_block" => Some(Self::Delete),
            "move_block_up" => Some(Self::MoveUp),
            "move_block_down" => Some(Self::MoveDown),
            _ => None,
        }
    }

    pub fn command(self) -> Command {
        match self {
            Self::Duplicate => duplicate_block,
            Self::Delete => delete_block,
            Self::MoveUp => move_block_up,
            Self::MoveDown => move_block_down,
        }
    }

    pub fn run(self, doc: &Node, selection: Selection) -> Option<Transaction> {
        (self.command())(doc, selection)
    }
}
