//! Declarations accepted by the schema builder.
//!
//! # Responsibility
//! - Describe node/mark types before they are validated into a [`Schema`].
//! - Own per-attribute parse rules (defaults and scalar coercions).
//!
//! [`Schema`]: crate::schema::Schema

use crate::model::attrs::{AttrValue, Attrs};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Scalar shape expected for one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Str,
    Int,
    Bool,
    /// String or `null`.
    OptionalStr,
}

impl AttrKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Int => "integer",
            Self::Bool => "boolean",
            Self::OptionalStr => "string|null",
        }
    }
}

/// Declaration of one attribute: name, expected shape and optional default.
///
/// An attribute without a default is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSpec {
    pub name: String,
    pub kind: AttrKind,
    pub default: Option<AttrValue>,
}

impl AttrSpec {
    pub fn required(name: impl Into<String>, kind: AttrKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    pub fn with_default(
        name: impl Into<String>,
        kind: AttrKind,
        default: impl Into<AttrValue>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            default: Some(default.into()),
        }
    }

    /// Applies this attribute's parse rule to a raw value.
    ///
    /// Missing values fall back to the default. Strings are coerced into
    /// integers/booleans when the declared kind asks for it, and scalars are
    /// stringified for string kinds.
    pub fn parse(&self, owner: &str, raw: Option<&AttrValue>) -> Result<AttrValue, AttrError> {
        let Some(raw) = raw else {
            return self.default.clone().ok_or_else(|| AttrError::Missing {
                owner: owner.to_string(),
                attr: self.name.clone(),
            });
        };

        let parsed = match (self.kind, raw) {
            (AttrKind::Str, AttrValue::Str(_)) => Some(raw.clone()),
            (AttrKind::Str | AttrKind::OptionalStr, AttrValue::Int(value)) => {
                Some(AttrValue::Str(value.to_string()))
            }
            (AttrKind::Str | AttrKind::OptionalStr, AttrValue::Bool(value)) => {
                Some(AttrValue::Str(value.to_string()))
            }
            (AttrKind::OptionalStr, AttrValue::Str(_) | AttrValue::Null) => Some(raw.clone()),
            (AttrKind::Int, AttrValue::Int(_)) => Some(raw.clone()),
            (AttrKind::Int, AttrValue::Str(value)) => {
                value.trim().parse::<i64>().ok().map(AttrValue::Int)
            }
            (AttrKind::Bool, AttrValue::Bool(_)) => Some(raw.clone()),
            (AttrKind::Bool, AttrValue::Str(value)) => match value.trim() {
                "true" => Some(AttrValue::Bool(true)),
                "false" => Some(AttrValue::Bool(false)),
                _ => None,
            },
            _ => None,
        };

        parsed.ok_or_else(|| AttrError::Invalid {
            owner: owner.to_string(),
            attr: self.name.clone(),
            value: raw.to_string(),
            expected: self.kind.as_str(),
        })
    }
}

/// Parses a full raw attribute map against declared specs.
///
/// Unknown attribute names are rejected so markup never carries values the
/// schema cannot round-trip.
pub(crate) fn parse_attrs(owner: &str, specs: &[AttrSpec], raw: &Attrs) -> Result<Attrs, AttrError> {
    if let Some(unknown) = raw
        .keys()
        .find(|key| !specs.iter().any(|spec| &spec.name == *key))
    {
        return Err(AttrError::Unknown {
            owner: owner.to_string(),
            attr: unknown.clone(),
        });
    }

    specs
        .iter()
        .map(|spec| {
            spec.parse(owner, raw.get(&spec.name))
                .map(|value| (spec.name.clone(), value))
        })
        .collect()
}

/// Drops attribute values equal to their declared default.
pub(crate) fn serialize_attrs(specs: &[AttrSpec], attrs: &Attrs) -> Attrs {
    attrs
        .iter()
        .filter(|(name, value)| {
            specs
                .iter()
                .find(|spec| &spec.name == *name)
                .and_then(|spec| spec.default.as_ref())
                != Some(*value)
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Attribute parse/validation errors raised at load or edit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrError {
    Missing {
        owner: String,
        attr: String,
    },
    Invalid {
        owner: String,
        attr: String,
        value: String,
        expected: &'static str,
    },
    Unknown {
        owner: String,
        attr: String,
    },
}

impl Display for AttrError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing { owner, attr } => {
                write!(f, "`{owner}` requires attribute `{attr}`")
            }
            Self::Invalid {
                owner,
                attr,
                value,
                expected,
            } => write!(
                f,
                "`{owner}` attribute `{attr}` has invalid value `{value}` (expected {expected})"
            ),
            Self::Unknown { owner, attr } => {
                write!(f, "`{owner}` does not declare attribute `{attr}`")
            }
        }
    }
}

impl Error for AttrError {}

/// Whether a node type lives in block or inline context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    Block,
    Inline,
}

/// Node type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub name: String,
    pub category: NodeCategory,
    /// Optional group name usable inside content expressions.
    pub group: Option<String>,
    /// Content expression. `None` declares a leaf.
    pub content: Option<String>,
    /// Opaque leaf edited as a unit (math, footnote reference).
    pub atom: bool,
    pub attrs: Vec<AttrSpec>,
    /// Whether text inside this node may carry marks.
    pub marks_allowed: bool,
    /// Code content: input rules never fire inside.
    pub code: bool,
}

impl NodeSpec {
    pub fn block(name: impl Into<String>) -> Self {
        Self::new(name, NodeCategory::Block)
    }

    pub fn inline(name: impl Into<String>) -> Self {
        Self::new(name, NodeCategory::Inline)
    }

    fn new(name: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            name: name.into(),
            category,
            group: None,
            content: None,
            atom: false,
            attrs: Vec::new(),
            marks_allowed: true,
            code: false,
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn content(mut self, expr: impl Into<String>) -> Self {
        self.content = Some(expr.into());
        self
    }

    pub fn atom(mut self) -> Self {
        self.atom = true;
        self
    }

    pub fn attr(mut self, spec: AttrSpec) -> Self {
        self.attrs.push(spec);
        self
    }

    pub fn no_marks(mut self) -> Self {
        self.marks_allowed = false;
        self
    }

    pub fn code(mut self) -> Self {
        self.code = true;
        self
    }
}

/// Mark type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkSpec {
    pub name: String,
    pub attrs: Vec<AttrSpec>,
    /// Space-separated mark names this mark cannot coexist with; `_` means
    /// every mark. `None` excludes only other marks of the same type.
    pub excludes: Option<String>,
    /// Whether typing at the mark's end boundary extends it.
    pub inclusive: bool,
}

impl MarkSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            excludes: None,
            inclusive: true,
        }
    }

    pub fn attr(mut self, spec: AttrSpec) -> Self {
        self.attrs.push(spec);
        self
    }

    pub fn excludes(mut self, names: impl Into<String>) -> Self {
        self.excludes = Some(names.into());
        self
    }

    pub fn non_inclusive(mut self) -> Self {
        self.inclusive = false;
        self
    }
}
