//! Document tree model and position addressing.
//!
//! # Responsibility
//! - Define immutable nodes, fragments, marks and open slices.
//! - Resolve integer positions into ancestor paths.
//! - Provide the structural replace used by every transaction step.
//!
//! # Invariants
//! - Trees are owned top-down; there are no parent pointers.
//! - Positions range over `0..=doc.content().size()`.
//!
//! # See also
//! - `crate::transform` for step application and position mapping.

pub mod attrs;
pub mod fragment;
pub mod mark;
pub mod node;
pub mod position;
pub mod replace;
pub mod selection;
pub mod slice;

pub use attrs::{AttrValue, Attrs};
pub use fragment::Fragment;
pub use mark::{Mark, MarkSet};
pub use node::{Element, Node, TextNode};
pub use position::{PositionError, ResolvedPos};
pub use replace::ReplaceError;
pub use selection::Selection;
pub use slice::Slice;
