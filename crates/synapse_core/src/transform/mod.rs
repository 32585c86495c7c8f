//! Transaction engine.
//!
//! # Responsibility
//! - Apply ordered steps to a document, mapping each step's positions
//!   through the steps before it.
//! - Validate every changed parent against the schema.
//!
//! # Invariants
//! - Application is all-or-nothing: on error the input document is
//!   untouched and no partial result escapes.
//! - The returned mapping holds one step map per applied step.
//!
//! # See also
//! - `crate::model::replace` for structural fitting.

pub mod mapping;
pub mod step;
pub mod transaction;

pub use mapping::{Assoc, Mapping, StepMap};
pub use step::Step;
pub use transaction::Transaction;

use crate::model::node::Node;
use crate::model::position::PositionError;
use crate::model::replace::ReplaceError;
use crate::schema::{AttrError, Schema};
use log::{debug, warn};
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Display, Formatter};
use step::StepError;

/// Transaction rejection, tagged with the failing step index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    InvalidPosition { step: usize, source: PositionError },
    InvalidContent { step: usize, source: ReplaceError },
    InvalidAttrs { step: usize, source: AttrError },
    NoNodeAt { step: usize, pos: usize },
}

impl TransactionError {
    fn at_step(step: usize, err: StepError) -> Self {
        match err {
            StepError::Position(source) => Self::InvalidPosition { step, source },
            StepError::Replace(source) => Self::InvalidContent { step, source },
            StepError::Attrs(source) => Self::InvalidAttrs { step, source },
            StepError::NoNodeAt(pos) => Self::NoNodeAt { step, pos },
        }
    }

    /// Index of the step that failed.
    pub fn step_index(&self) -> usize {
        match self {
            Self::InvalidPosition { step, .. }
            | Self::InvalidContent { step, .. }
            | Self::InvalidAttrs { step, .. }
            | Self::NoNodeAt { step, .. } => *step,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPosition { .. } => "invalid_position",
            Self::InvalidContent { .. } => "invalid_content",
            Self::InvalidAttrs { .. } => "invalid_attrs",
            Self::NoNodeAt { .. } => "no_node_at",
        }
    }
}

impl Display for TransactionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPosition { step, source } => write!(f, "step {step}: {source}"),
            Self::InvalidContent { step, source } => write!(f, "step {step}: {source}"),
            Self::InvalidAttrs { step, source } => write!(f, "step {step}: {source}"),
            Self::NoNodeAt { step, pos } => write!(f, "step {step}: no element starts at {pos}"),
        }
    }
}

impl Error for TransactionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPosition { source, .. } => Some(source),
            Self::InvalidContent { source, .. } => Some(source),
            Self::InvalidAttrs { source, .. } => Some(source),
            Self::NoNodeAt { .. } => None,
        }
    }
}

/// Result of a successful transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub doc: Node,
    pub mapping: Mapping,
}

/// Applies `transaction` to `doc`.
///
/// # Errors
/// Returns the first failing step's error; `doc` is never modified.
pub fn apply_transaction(
    schema: &Schema,
    doc: &Node,
    transaction: &Transaction,
) -> Result<Applied, TransactionError> {
    let mut current = Cow::Borrowed(doc);
    let mut mapping = Mapping::new();

    for (index, step) in transaction.steps().iter().enumerate() {
        let mapped = step.map(&mapping);
        match mapped.apply(schema, &current) {
            Ok((next, map)) => {
                mapping.push(map);
                current = Cow::Owned(next);
            }
            Err(err) => {
                let err = TransactionError::at_step(index, err);
                warn!(
                    "event=tx_apply module=transform status=rejected steps={} failed_step={} step_kind={} error_code={}",
                    transaction.steps().len(),
                    index,
                    mapped.name(),
                    err.error_code()
                );
                return Err(err);
            }
        }
    }

    let doc = current.into_owned();
    debug!(
        "event=tx_apply module=transform status=ok steps={} size_after={}",
        transaction.steps().len(),
        doc.content().size()
    );
    Ok(Applied { doc, mapping })
}
