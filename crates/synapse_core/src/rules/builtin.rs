//! Built-in note input rules, in firing order.

use super::{InputRule, Replacement, RuleContext, ATOM_PLACEHOLDER};
use crate::model::attrs::{attrs, AttrValue, Attrs};
use crate::model::mark::MarkSet;
use crate::model::node::Node;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static WIKILINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[([^\[\]|#^]+)(?:#([^\[\]|^]+))?(?:\^([^\[\]|]+))?(?:\|([^\[\]]+))?\]\]$")
        .expect("valid wikilink regex")
});
static FOOTNOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\^([^\[\]]+)\]$").expect("valid footnote regex"));
static MATH_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$\$([^$]+)\$\$\s$").expect("valid math block regex"));
static MATH_INLINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^$])(\$([^$\s][^$]*)\$)$").expect("valid inline math regex")
});
static HIGHLIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^=])(==([^=\s][^=]*)==)$").expect("valid highlight regex"));
static BOLD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^*])(\*\*([^*\s][^*]*)\*\*)$").expect("valid bold regex"));
static ITALIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^*])(\*([^*\s][^*]*)\*)$").expect("valid italic regex"));
static STRIKE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^~])(~~([^~\s][^~]*)~~)$").expect("valid strike regex"));
static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^`])(`([^`]+)`)$").expect("valid code regex"));
static CALLOUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^>\s?\[!(\w+)\]\s$").expect("valid callout regex"));
static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s$").expect("valid heading regex"));
static TASK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([ xX])\]\s$").expect("valid task regex"));
static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([-+*])\s$").expect("valid bullet regex"));
static ORDERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.\s$").expect("valid ordered list regex"));
static RULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:---|___|\*\*\*)$").expect("valid horizontal rule regex"));

fn rule(
    name: &'static str,
    pattern: &Lazy<Regex>,
    line_start: bool,
    span_group: usize,
    build: super::BuildFn,
) -> InputRule {
    InputRule {
        name,
        pattern: Regex::clone(pattern),
        line_start,
        span_group,
        build,
    }
}

/// The note rule table. Order is the tie-break.
pub fn rules() -> Vec<InputRule> {
    vec![
        rule("wikilink", &WIKILINK_RE, false, 0, wikilink),
        rule("footnote", &FOOTNOTE_RE, false, 0, footnote),
        rule("math_block", &MATH_BLOCK_RE, true, 0, math_block),
        rule("math_inline", &MATH_INLINE_RE, false, 1, math_inline),
        rule("highlight", &HIGHLIGHT_RE, false, 1, highlight),
        rule("bold", &BOLD_RE, false, 1, bold),
        rule("italic", &ITALIC_RE, false, 1, italic),
        rule("strike", &STRIKE_RE, false, 1, strike),
        rule("code", &CODE_RE, false, 1, code),
        rule("callout", &CALLOUT_RE, true, 0, callout),
        rule("heading", &HEADING_RE, true, 0, heading),
        rule("task_list", &TASK_RE, true, 0, task_list),
        rule("bullet_list", &BULLET_RE, true, 0, bullet_list),
        rule("ordered_list", &ORDERED_RE, true, 0, ordered_list),
        rule("horizontal_rule", &RULE_RE, true, 0, horizontal_rule),
    ]
}

/// Text of a capture group, rejecting spans that swallowed an inline atom.
fn group<'t>(captures: &Captures<'t>, index: usize) -> Option<&'t str> {
    captures
        .get(index)
        .map(|m| m.as_str())
        .filter(|text| !text.contains(ATOM_PLACEHOLDER))
}

fn optional_group(captures: &Captures<'_>, index: usize) -> AttrValue {
    group(captures, index)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(AttrValue::from)
        .unwrap_or(AttrValue::Null)
}

fn wikilink(captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    let title = group(captures, 1)?.trim();
    if title.is_empty() {
        return None;
    }
    let mark = context.schema.mark(
        "link",
        attrs([
            ("note_title", AttrValue::from(title)),
            ("heading", optional_group(captures, 2)),
            ("block_ref", optional_group(captures, 3)),
        ]),
    );
    let display = group(captures, 4)
        .map(str::trim)
        .filter(|alias| !alias.is_empty())
        .unwrap_or(title);
    let marks = context.schema.add_mark(&context.marks, mark.ok()?);
    Some(Replacement::Inline(vec![Node::text(display, marks)]))
}

fn footnote(captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    let content = group(captures, 1)?.trim();
    let footnote_type = context.schema.node_id("footnote_ref")?;
    let mut existing = 0;
    context.doc.descendants(|node, _, _| {
        if node.element_type() == Some(footnote_type) {
            existing += 1;
        }
        true
    });
    let node = context
        .schema
        .node(
            "footnote_ref",
            attrs([("id", (existing + 1).to_string()), ("content", content.to_string())]),
            vec![],
        )
        .ok()?;
    Some(Replacement::Inline(vec![node]))
}

fn math_block(captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    if !context.in_paragraph() {
        return None;
    }
    let content = group(captures, 1)?.trim();
    let node = context
        .schema
        .node("math_block", attrs([("content", content)]), vec![])
        .ok()?;
    Some(Replacement::BlocksBefore(vec![node]))
}

fn math_inline(captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    let content = group(captures, 2)?;
    let node = context
        .schema
        .node("math_inline", attrs([("content", content)]), vec![])
        .ok()?;
    Some(Replacement::Inline(vec![node]))
}

fn wrap_in_mark(
    captures: &Captures<'_>,
    context: &RuleContext<'_>,
    mark_name: &str,
) -> Option<Replacement> {
    let text = group(captures, 2)?;
    let mark = context.schema.mark(mark_name, Attrs::new()).ok()?;
    let marks: MarkSet = context.schema.add_mark(&context.marks, mark);
    Some(Replacement::Inline(vec![Node::text(text, marks)]))
}

fn highlight(captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    wrap_in_mark(captures, context, "highlight")
}

fn bold(captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    wrap_in_mark(captures, context, "bold")
}

fn italic(captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    wrap_in_mark(captures, context, "italic")
}

fn strike(captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    wrap_in_mark(captures, context, "strike")
}

fn code(captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    wrap_in_mark(captures, context, "code")
}

fn callout(captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    if !context.in_paragraph() {
        return None;
    }
    let callout_type = group(captures, 1)?.to_lowercase();
    let node_type = context.schema.node_id("callout")?;
    Some(Replacement::WrapTextblock {
        wrappers: vec![(node_type, attrs([("callout_type", callout_type)]))],
    })
}

fn heading(captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    if !context.in_paragraph() {
        return None;
    }
    let level = group(captures, 1)?.len() as i64;
    Some(Replacement::SetTextblock {
        node_type: context.schema.node_id("heading")?,
        attrs: attrs([("level", level)]),
    })
}

fn task_list(captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    if !context.in_paragraph() {
        return None;
    }
    let checked = group(captures, 1)? != " ";
    Some(Replacement::WrapTextblock {
        wrappers: vec![
            (context.schema.node_id("task_list")?, Attrs::new()),
            (
                context.schema.node_id("task_item")?,
                attrs([("checked", checked)]),
            ),
        ],
    })
}

fn bullet_list(_captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    if !context.in_paragraph() {
        return None;
    }
    Some(Replacement::WrapTextblock {
        wrappers: vec![
            (context.schema.node_id("bullet_list")?, Attrs::new()),
            (context.schema.node_id("list_item")?, Attrs::new()),
        ],
    })
}

fn ordered_list(captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    if !context.in_paragraph() {
        return None;
    }
    let start: i64 = group(captures, 1)?.parse().ok()?;
    Some(Replacement::WrapTextblock {
        wrappers: vec![
            (
                context.schema.node_id("ordered_list")?,
                attrs([("start", start)]),
            ),
            (context.schema.node_id("list_item")?, Attrs::new()),
        ],
    })
}

fn horizontal_rule(_captures: &Captures<'_>, context: &RuleContext<'_>) -> Option<Replacement> {
    if !context.in_paragraph() {
        return None;
    }
    let node = context
        .schema
        .node("horizontal_rule", Attrs::new(), vec![])
        .ok()?;
    Some(Replacement::BlocksBefore(vec![node]))
}

#[cfg(test)]
mod tests {
    use super::{rules, WIKILINK_RE};

    #[test]
    fn rule_order_is_fixed() {
        let names: Vec<_> = rules().iter().map(|rule| rule.name).collect();
        assert_eq!(
            names,
            vec![
                "wikilink",
                "footnote",
                "math_block",
                "math_inline",
                "highlight",
                "bold",
                "italic",
                "strike",
                "code",
                "callout",
                "heading",
                "task_list",
                "bullet_list",
                "ordered_list",
                "horizontal_rule",
            ]
        );
    }

    #[test]
    fn wikilink_pattern_captures_all_parts() {
        let captures = WIKILINK_RE
            .captures("see [[Project Plan#Goals^b1|the plan]]")
            .expect("wikilink match");
        assert_eq!(&captures[1], "Project Plan");
        assert_eq!(&captures[2], "Goals");
        assert_eq!(&captures[3], "b1");
        assert_eq!(&captures[4], "the plan");
    }
}
