//! Schema registry: the closed set of node and mark types for one session.
//!
//! # Responsibility
//! - Validate node/mark declarations once, at build time.
//! - Resolve string names into compact type ids used by the tree.
//! - Own per-type attribute parsing/serialization and content checks.
//!
//! # Invariants
//! - Type names are unique per kind (node/mark).
//! - Every content expression references only declared types or groups.
//! - A built [`Schema`] is immutable; declaration errors never surface at
//!   edit time.

mod content;
mod notes;
pub mod spec;

pub use content::ContentExpr;
pub use spec::{AttrError, AttrKind, AttrSpec, MarkSpec, NodeCategory, NodeSpec};

use crate::model::attrs::Attrs;
use crate::model::fragment::Fragment;
use crate::model::mark::{Mark, MarkSet};
use crate::model::node::{Element, Node};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Name of the mandatory top node type.
pub const TOP_NODE: &str = "doc";
/// Name of the mandatory text node type.
pub const TEXT_NODE: &str = "text";

/// Compact tag for a node type inside one schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeTypeId(pub(crate) u16);

/// Compact tag for a mark type inside one schema. Orders marks in a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkTypeId(pub(crate) u16);

/// Validated node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeType {
    id: NodeTypeId,
    name: String,
    category: NodeCategory,
    group: Option<String>,
    content: Option<ContentExpr>,
    atom: bool,
    attrs: Vec<AttrSpec>,
    marks_allowed: bool,
    code: bool,
    textblock: bool,
}

impl NodeType {
    pub fn id(&self) -> NodeTypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> NodeCategory {
        self.category
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn content(&self) -> Option<&ContentExpr> {
        self.content.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        self.content.is_none()
    }

    pub fn is_atom(&self) -> bool {
        self.atom || self.is_leaf()
    }

    pub fn is_inline(&self) -> bool {
        self.category == NodeCategory::Inline
    }

    /// Block whose content is inline (paragraph, heading, code block).
    pub fn is_textblock(&self) -> bool {
        self.textblock
    }

    pub fn is_code(&self) -> bool {
        self.code
    }

    pub fn marks_allowed(&self) -> bool {
        self.marks_allowed
    }

    pub fn attr_specs(&self) -> &[AttrSpec] {
        &self.attrs
    }
}

/// Validated mark type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkType {
    id: MarkTypeId,
    name: String,
    attrs: Vec<AttrSpec>,
    excludes: Vec<MarkTypeId>,
    inclusive: bool,
}

impl MarkType {
    pub fn id(&self) -> MarkTypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_inclusive(&self) -> bool {
        self.inclusive
    }

    pub fn excludes(&self, other: MarkTypeId) -> bool {
        self.excludes.contains(&other)
    }

    pub fn attr_specs(&self) -> &[AttrSpec] {
        &self.attrs
    }
}

/// Declaration-time registry errors. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    DuplicateNodeType(String),
    DuplicateMarkType(String),
    MissingTopNode,
    MissingTextNode,
    MalformedContent {
        node: String,
        expr: String,
        reason: String,
    },
    UnknownContentName {
        node: String,
        name: String,
    },
    AtomWithContent(String),
    UnknownExcludedMark {
        mark: String,
        name: String,
    },
    InvalidAttrDefault(AttrError),
    TooManyTypes,
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateNodeType(name) => write!(f, "node type declared twice: {name}"),
            Self::DuplicateMarkType(name) => write!(f, "mark type declared twice: {name}"),
            Self::MissingTopNode => write!(f, "schema must declare a `{TOP_NODE}` node type"),
            Self::MissingTextNode => write!(f, "schema must declare a `{TEXT_NODE}` node type"),
            Self::MalformedContent { node, expr, reason } => write!(
                f,
                "content expression `{expr}` of `{node}` is malformed: {reason}"
            ),
            Self::UnknownContentName { node, name } => write!(
                f,
                "content expression of `{node}` references unknown type or group `{name}`"
            ),
            Self::AtomWithContent(name) => {
                write!(f, "atom node type `{name}` cannot declare content")
            }
            Self::UnknownExcludedMark { mark, name } => {
                write!(f, "mark `{mark}` excludes unknown mark `{name}`")
            }
            Self::InvalidAttrDefault(err) => write!(f, "invalid attribute default: {err}"),
            Self::TooManyTypes => write!(f, "schema declares more types than supported"),
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidAttrDefault(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors building or parsing individual nodes/marks against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    UnknownNodeType(String),
    UnknownMarkType(String),
    Attr(AttrError),
    InvalidContent { node: String },
}

impl Display for NodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNodeType(name) => write!(f, "unknown node type: {name}"),
            Self::UnknownMarkType(name) => write!(f, "unknown mark type: {name}"),
            Self::Attr(err) => write!(f, "{err}"),
            Self::InvalidContent { node } => {
                write!(f, "content does not satisfy the expression of `{node}`")
            }
        }
    }
}

impl Error for NodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Attr(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AttrError> for NodeError {
    fn from(value: AttrError) -> Self {
        Self::Attr(value)
    }
}

/// Collects declarations and validates them into a [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    nodes: Vec<NodeSpec>,
    marks: Vec<MarkSpec>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, spec: NodeSpec) -> Self {
        self.nodes.push(spec);
        self
    }

    pub fn mark(mut self, spec: MarkSpec) -> Self {
        self.marks.push(spec);
        self
    }

    /// Validates every declaration and resolves names into type ids.
    pub fn build(self) -> Result<Schema, SchemaError> {
        if self.nodes.len() > usize::from(u16::MAX) || self.marks.len() > usize::from(u16::MAX) {
            return Err(SchemaError::TooManyTypes);
        }

        let mut node_index = HashMap::new();
        for (index, spec) in self.nodes.iter().enumerate() {
            let id = NodeTypeId(index as u16);
            if node_index.insert(spec.name.clone(), id).is_some() {
                return Err(SchemaError::DuplicateNodeType(spec.name.clone()));
            }
        }
        let top = *node_index
            .get(TOP_NODE)
            .ok_or(SchemaError::MissingTopNode)?;
        let text = *node_index
            .get(TEXT_NODE)
            .ok_or(SchemaError::MissingTextNode)?;

        let mut mark_index = HashMap::new();
        for (index, spec) in self.marks.iter().enumerate() {
            let id = MarkTypeId(index as u16);
            if mark_index.insert(spec.name.clone(), id).is_some() {
                return Err(SchemaError::DuplicateMarkType(spec.name.clone()));
            }
        }

        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (index, spec) in self.nodes.iter().enumerate() {
            if spec.atom && spec.content.is_some() {
                return Err(SchemaError::AtomWithContent(spec.name.clone()));
            }
            validate_defaults(&spec.name, &spec.attrs)?;
            let content = match spec.content.as_deref() {
                Some(expr) => Some(resolve_content(spec, expr, &self.nodes, &node_index)?),
                None => None,
            };
            nodes.push(NodeType {
                id: NodeTypeId(index as u16),
                name: spec.name.clone(),
                category: spec.category,
                group: spec.group.clone(),
                content,
                atom: spec.atom,
                attrs: spec.attrs.clone(),
                marks_allowed: spec.marks_allowed,
                code: spec.code,
                textblock: false,
            });
        }

        // Textblock detection needs every type's category resolved first.
        let inline_flags: Vec<bool> = nodes.iter().map(NodeType::is_inline).collect();
        for node in &mut nodes {
            let textblock = node.category == NodeCategory::Block
                && node.content.as_ref().is_some_and(|expr| {
                    let mut allowed = expr.allowed_types().peekable();
                    allowed.peek().is_some()
                        && allowed.all(|id| inline_flags[usize::from(id.0)])
                });
            node.textblock = textblock;
        }

        let mut marks = Vec::with_capacity(self.marks.len());
        for (index, spec) in self.marks.iter().enumerate() {
            let id = MarkTypeId(index as u16);
            validate_defaults(&spec.name, &spec.attrs)?;
            let excludes = match spec.excludes.as_deref() {
                None => vec![id],
                Some(names) => {
                    let mut resolved = Vec::new();
                    for name in names.split_whitespace() {
                        if name == "_" {
                            resolved.extend((0..self.marks.len()).map(|i| MarkTypeId(i as u16)));
                            continue;
                        }
                        let other = mark_index.get(name).ok_or_else(|| {
                            SchemaError::UnknownExcludedMark {
                                mark: spec.name.clone(),
                                name: name.to_string(),
                            }
                        })?;
                        resolved.push(*other);
                    }
                    resolved.sort();
                    resolved.dedup();
                    resolved
                }
            };
            marks.push(MarkType {
                id,
                name: spec.name.clone(),
                attrs: spec.attrs.clone(),
                excludes,
                inclusive: spec.inclusive,
            });
        }

        Ok(Schema {
            nodes,
            marks,
            node_index,
            mark_index,
            top,
            text,
        })
    }
}

fn validate_defaults(owner: &str, specs: &[AttrSpec]) -> Result<(), SchemaError> {
    for spec in specs {
        if let Some(default) = spec.default.as_ref() {
            let parsed = spec
                .parse(owner, Some(default))
                .map_err(SchemaError::InvalidAttrDefault)?;
            if &parsed != default {
                return Err(SchemaError::InvalidAttrDefault(AttrError::Invalid {
                    owner: owner.to_string(),
                    attr: spec.name.clone(),
                    value: default.to_string(),
                    expected: spec.kind.as_str(),
                }));
            }
        }
    }
    Ok(())
}

fn resolve_content(
    spec: &NodeSpec,
    expr: &str,
    all: &[NodeSpec],
    index: &HashMap<String, NodeTypeId>,
) -> Result<ContentExpr, SchemaError> {
    let raw_terms = content::parse_expr(expr).map_err(|reason| SchemaError::MalformedContent {
        node: spec.name.clone(),
        expr: expr.to_string(),
        reason,
    })?;

    let mut resolved = Vec::with_capacity(raw_terms.len());
    for term in raw_terms {
        let mut types = Vec::new();
        for name in &term.names {
            if let Some(id) = index.get(name) {
                types.push(*id);
                continue;
            }
            let members: Vec<NodeTypeId> = all
                .iter()
                .enumerate()
                .filter(|(_, candidate)| candidate.group.as_deref() == Some(name.as_str()))
                .map(|(i, _)| NodeTypeId(i as u16))
                .collect();
            if members.is_empty() {
                return Err(SchemaError::UnknownContentName {
                    node: spec.name.clone(),
                    name: name.clone(),
                });
            }
            types.extend(members);
        }
        types.sort();
        types.dedup();
        resolved.push((types, term.min, term.max));
    }
    Ok(ContentExpr::new(expr, resolved))
}

/// Immutable, validated type registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    nodes: Vec<NodeType>,
    marks: Vec<MarkType>,
    node_index: HashMap<String, NodeTypeId>,
    mark_index: HashMap<String, MarkTypeId>,
    top: NodeTypeId,
    text: NodeTypeId,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Returns the type behind an id issued by this schema.
    ///
    /// # Panics
    /// Panics if `id` was issued by a different schema with fewer types.
    pub fn node_type(&self, id: NodeTypeId) -> &NodeType {
        &self.nodes[usize::from(id.0)]
    }

    /// Returns the mark type behind an id issued by this schema.
    ///
    /// # Panics
    /// Panics if `id` was issued by a different schema with fewer types.
    pub fn mark_type(&self, id: MarkTypeId) -> &MarkType {
        &self.marks[usize::from(id.0)]
    }

    pub fn node_type_by_name(&self, name: &str) -> Option<&NodeType> {
        self.node_index.get(name).map(|id| self.node_type(*id))
    }

    pub fn mark_type_by_name(&self, name: &str) -> Option<&MarkType> {
        self.mark_index.get(name).map(|id| self.mark_type(*id))
    }

    pub fn node_id(&self, name: &str) -> Option<NodeTypeId> {
        self.node_index.get(name).copied()
    }

    pub fn mark_id(&self, name: &str) -> Option<MarkTypeId> {
        self.mark_index.get(name).copied()
    }

    pub fn top_node_type(&self) -> NodeTypeId {
        self.top
    }

    pub fn text_node_type(&self) -> NodeTypeId {
        self.text
    }

    pub fn node_types(&self) -> &[NodeType] {
        &self.nodes
    }

    pub fn mark_types(&self) -> &[MarkType] {
        &self.marks
    }

    /// Type id of a node, text included.
    pub fn type_of(&self, node: &Node) -> NodeTypeId {
        match node {
            Node::Element(element) => element.type_id(),
            Node::Text(_) => self.text,
        }
    }

    pub fn type_name(&self, node: &Node) -> &str {
        self.node_type(self.type_of(node)).name()
    }

    /// Creates an element after parsing `attrs` and checking `content`.
    pub fn create(
        &self,
        id: NodeTypeId,
        attrs: &Attrs,
        content: Fragment,
    ) -> Result<Node, NodeError> {
        let node_type = self.node_type(id);
        let attrs = spec::parse_attrs(node_type.name(), node_type.attr_specs(), attrs)?;
        if !self.check_content(id, &content) {
            return Err(NodeError::InvalidContent {
                node: node_type.name().to_string(),
            });
        }
        Ok(Node::Element(Element::new(node_type, attrs, content)))
    }

    /// Name-based variant of [`Schema::create`]; the per-type parser.
    pub fn parse_node(
        &self,
        name: &str,
        raw_attrs: &Attrs,
        content: Vec<Node>,
    ) -> Result<Node, NodeError> {
        let id = self
            .node_id(name)
            .ok_or_else(|| NodeError::UnknownNodeType(name.to_string()))?;
        self.create(id, raw_attrs, Fragment::from_nodes(content))
    }

    /// Shorthand for building nodes in code: `schema.node("heading", attrs, children)`.
    pub fn node(&self, name: &str, attrs: Attrs, content: Vec<Node>) -> Result<Node, NodeError> {
        self.parse_node(name, &attrs, content)
    }

    /// Per-mark parser.
    pub fn parse_mark(&self, name: &str, raw_attrs: &Attrs) -> Result<Mark, NodeError> {
        let mark_type = self
            .mark_type_by_name(name)
            .ok_or_else(|| NodeError::UnknownMarkType(name.to_string()))?;
        let attrs = spec::parse_attrs(mark_type.name(), mark_type.attr_specs(), raw_attrs)?;
        Ok(Mark::new(mark_type.id(), attrs))
    }

    pub fn mark(&self, name: &str, attrs: Attrs) -> Result<Mark, NodeError> {
        self.parse_mark(name, &attrs)
    }

    /// Per-node serializer: attributes with defaults omitted.
    pub fn serialize_node_attrs(&self, node: &Node) -> Attrs {
        match node {
            Node::Element(element) => spec::serialize_attrs(
                self.node_type(element.type_id()).attr_specs(),
                element.attrs(),
            ),
            Node::Text(_) => Attrs::new(),
        }
    }

    /// Per-mark serializer: attributes with defaults omitted.
    pub fn serialize_mark_attrs(&self, mark: &Mark) -> Attrs {
        spec::serialize_attrs(self.mark_type(mark.type_id()).attr_specs(), mark.attrs())
    }

    /// Validates a complete attribute map for an existing node type.
    pub fn check_attrs(&self, id: NodeTypeId, attrs: &Attrs) -> Result<Attrs, AttrError> {
        let node_type = self.node_type(id);
        spec::parse_attrs(node_type.name(), node_type.attr_specs(), attrs)
    }

    /// Whether `content` is valid for the given parent type.
    pub fn check_content(&self, id: NodeTypeId, content: &Fragment) -> bool {
        let node_type = self.node_type(id);
        let Some(expr) = node_type.content() else {
            return content.child_count() == 0;
        };
        if !node_type.marks_allowed()
            && content
                .iter()
                .any(|child| child.is_text() && !child.marks().is_empty())
        {
            return false;
        }
        let types: Vec<NodeTypeId> = content.iter().map(|child| self.type_of(child)).collect();
        expr.matches(&types)
    }

    /// Whether content of `b` may be joined into a node of type `a`.
    pub fn compatible_content(&self, a: NodeTypeId, b: NodeTypeId) -> bool {
        a == b || (self.node_type(a).is_textblock() && self.node_type(b).is_textblock())
    }

    /// Whether adding `mark` would be blocked or would evict `other`.
    pub fn mark_excludes(&self, mark: MarkTypeId, other: MarkTypeId) -> bool {
        self.mark_type(mark).excludes(other)
    }

    /// Builds `MarkSet`s honouring exclusion rules.
    pub fn add_mark(&self, set: &MarkSet, mark: Mark) -> MarkSet {
        set.add(mark, |a, b| self.mark_excludes(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::{MarkSpec, NodeSpec, Schema, SchemaError};
    use crate::model::attrs::Attrs;
    use crate::schema::{AttrKind, AttrSpec};

    fn minimal() -> crate::schema::SchemaBuilder {
        Schema::builder()
            .node(NodeSpec::block("doc").content("block+"))
            .node(NodeSpec::block("paragraph").group("block").content("inline*"))
            .node(NodeSpec::inline("text").group("inline"))
    }

    #[test]
    fn builds_minimal_schema_and_detects_textblocks() {
        let schema = minimal().build().expect("minimal schema");
        let paragraph = schema.node_type_by_name("paragraph").expect("paragraph");
        assert!(paragraph.is_textblock());
        assert!(!schema
            .node_type(schema.top_node_type())
            .is_textblock());
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = minimal()
            .node(NodeSpec::block("paragraph"))
            .build()
            .expect_err("duplicate must fail");
        assert_eq!(err, SchemaError::DuplicateNodeType("paragraph".to_string()));

        let err = minimal()
            .mark(MarkSpec::new("bold"))
            .mark(MarkSpec::new("bold"))
            .build()
            .expect_err("duplicate mark must fail");
        assert_eq!(err, SchemaError::DuplicateMarkType("bold".to_string()));
    }

    #[test]
    fn rejects_unknown_content_names_and_malformed_expressions() {
        let err = minimal()
            .node(NodeSpec::block("columns").content("column{2,3}"))
            .build()
            .expect_err("unknown name must fail");
        assert!(matches!(err, SchemaError::UnknownContentName { name, .. } if name == "column"));

        let err = minimal()
            .node(NodeSpec::block("broken").content("(block | inline"))
            .build()
            .expect_err("malformed expr must fail");
        assert!(matches!(err, SchemaError::MalformedContent { .. }));
    }

    #[test]
    fn rejects_missing_top_or_text_node() {
        let err = Schema::builder()
            .node(NodeSpec::inline("text"))
            .build()
            .expect_err("missing doc");
        assert_eq!(err, SchemaError::MissingTopNode);

        let err = Schema::builder()
            .node(NodeSpec::block("doc"))
            .build()
            .expect_err("missing text");
        assert_eq!(err, SchemaError::MissingTextNode);
    }

    #[test]
    fn rejects_atoms_with_content_and_bad_defaults() {
        let err = minimal()
            .node(NodeSpec::block("math").atom().content("inline*"))
            .build()
            .expect_err("atom with content");
        assert_eq!(err, SchemaError::AtomWithContent("math".to_string()));

        let err = minimal()
            .node(
                NodeSpec::block("heading")
                    .content("inline*")
                    .attr(AttrSpec::with_default("level", AttrKind::Int, "one")),
            )
            .build()
            .expect_err("bad default");
        assert!(matches!(err, SchemaError::InvalidAttrDefault(_)));
    }

    #[test]
    fn rejects_unknown_excluded_marks() {
        let err = minimal()
            .mark(MarkSpec::new("code").excludes("italics"))
            .build()
            .expect_err("unknown exclusion");
        assert!(matches!(err, SchemaError::UnknownExcludedMark { .. }));
    }

    #[test]
    fn content_check_uses_resolved_groups() {
        let schema = minimal().build().expect("schema");
        let doc = schema.top_node_type();
        let empty = crate::model::fragment::Fragment::empty();
        assert!(!schema.check_content(doc, &empty));

        let paragraph = schema
            .node("paragraph", Attrs::new(), vec![])
            .expect("paragraph");
        let content = crate::model::fragment::Fragment::from_nodes(vec![paragraph]);
        assert!(schema.check_content(doc, &content));
    }
}
