//! JSON structured markup codec.
//!
//! # Responsibility
//! - Parse stored markup into a schema-valid document.
//! - Serialize documents back, omitting attribute defaults.
//!
//! # Invariants
//! - `parse(serialize(doc)) == doc` for every valid document.
//! - Parsing validates attributes and content with the schema's own parsers.

use crate::model::attrs::Attrs;
use crate::model::mark::MarkSet;
use crate::model::node::Node;
use crate::schema::{NodeError, Schema, TEXT_NODE};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug)]
pub enum CodecError {
    Json(serde_json::Error),
    Node(NodeError),
    UnexpectedRoot(String),
    MissingText,
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed markup: {err}"),
            Self::Node(err) => write!(f, "invalid markup: {err}"),
            Self::UnexpectedRoot(name) => write!(f, "markup root must be the top node, found `{name}`"),
            Self::MissingText => write!(f, "text node without `text` field"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Node(err) => Some(err),
            Self::UnexpectedRoot(_) | Self::MissingText => None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<NodeError> for CodecError {
    fn from(value: NodeError) -> Self {
        Self::Node(value)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    content: Vec<RawNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    marks: Vec<RawMark>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawMark {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    attrs: Attrs,
}

/// Parses markup into a document rooted at the schema's top node.
pub fn parse(schema: &Schema, markup: &str) -> CodecResult<Node> {
    let raw: RawNode = serde_json::from_str(markup)?;
    let doc = node_from_raw(schema, raw)?;
    if schema.type_of(&doc) != schema.top_node_type() {
        return Err(CodecError::UnexpectedRoot(schema.type_name(&doc).to_string()));
    }
    Ok(doc)
}

/// Serializes a document (or any subtree) to markup.
pub fn serialize(schema: &Schema, node: &Node) -> CodecResult<String> {
    Ok(serde_json::to_string(&node_to_raw(schema, node))?)
}

fn node_from_raw(schema: &Schema, raw: RawNode) -> CodecResult<Node> {
    if raw.ty == TEXT_NODE {
        let text = raw.text.ok_or(CodecError::MissingText)?;
        let mut marks = MarkSet::new();
        for mark in raw.marks {
            let mark = schema.parse_mark(&mark.ty, &mark.attrs)?;
            marks = schema.add_mark(&marks, mark);
        }
        return Ok(Node::text(text, marks));
    }

    let children = raw
        .content
        .into_iter()
        .map(|child| node_from_raw(schema, child))
        .collect::<CodecResult<Vec<_>>>()?;
    Ok(schema.parse_node(&raw.ty, &raw.attrs, children)?)
}

fn node_to_raw(schema: &Schema, node: &Node) -> RawNode {
    match node {
        Node::Text(text) => RawNode {
            ty: TEXT_NODE.to_string(),
            attrs: Attrs::new(),
            content: Vec::new(),
            text: Some(text.text().to_string()),
            marks: text
                .marks()
                .iter()
                .map(|mark| RawMark {
                    ty: schema.mark_type(mark.type_id()).name().to_string(),
                    attrs: schema.serialize_mark_attrs(mark),
                })
                .collect(),
        },
        Node::Element(element) => RawNode {
            ty: schema.node_type(element.type_id()).name().to_string(),
            attrs: schema.serialize_node_attrs(node),
            content: element
                .content()
                .iter()
                .map(|child| node_to_raw(schema, child))
                .collect(),
            text: None,
            marks: Vec::new(),
        },
    }
}
