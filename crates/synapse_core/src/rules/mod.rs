//! Input rule engine: typed text patterns rewritten into structure.
//!
//! # Responsibility
//! - Hold an ordered, inspectable table of rule records.
//! - On text input, test the text before the cursor plus the typed text and
//!   turn the first match into one transaction.
//!
//! # Invariants
//! - Rules are tested in table order; the first rule that builds a
//!   replacement wins.
//! - A rule consumes exactly its matched span and nothing else.
//! - Rules never fire inside code nodes.
//!
//! # See also
//! - `rules::builtin` for the note rule table.

pub mod builtin;

use crate::model::attrs::Attrs;
use crate::model::fragment::Fragment;
use crate::model::mark::MarkSet;
use crate::model::node::Node;
use crate::model::position::{PositionError, ResolvedPos};
use crate::model::selection::Selection;
use crate::model::slice::Slice;
use crate::schema::{NodeTypeId, Schema};
use crate::transform::Transaction;
use log::debug;
use regex::{Captures, Regex};

/// Stand-in character for inline atoms inside the match window.
pub const ATOM_PLACEHOLDER: char = '\u{fffc}';

/// Builds the replacement for a match, or `None` to let later rules try.
pub type BuildFn = fn(&Captures<'_>, &RuleContext<'_>) -> Option<Replacement>;

/// One rule record.
#[derive(Debug, Clone)]
pub struct InputRule {
    pub name: &'static str,
    /// Pattern anchored at the end of the window (`$`).
    pub pattern: Regex,
    /// Only fires when the window starts at the textblock start.
    pub line_start: bool,
    /// Capture group holding the span to replace; 0 is the whole match.
    pub span_group: usize,
    pub build: BuildFn,
}

/// What a matched span turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// Inline nodes replacing the span.
    Inline(Vec<Node>),
    /// The span is removed and the textblock becomes this type.
    SetTextblock { node_type: NodeTypeId, attrs: Attrs },
    /// The span is removed and the textblock is wrapped, outermost first.
    WrapTextblock { wrappers: Vec<(NodeTypeId, Attrs)> },
    /// The span is removed and these blocks are inserted before the textblock.
    BlocksBefore(Vec<Node>),
}

/// Read-only context handed to rule builders.
#[derive(Debug)]
pub struct RuleContext<'a> {
    pub schema: &'a Schema,
    pub doc: &'a Node,
    /// Textblock the input lands in.
    pub textblock: &'a Node,
    /// Marks inherited at the start of the matched span.
    pub marks: MarkSet,
    /// Absolute start of the matched span.
    pub match_from: usize,
    /// Absolute end of the replaced range (the typed text's `to`).
    pub match_to: usize,
}

impl RuleContext<'_> {
    /// Whether the textblock is a plain paragraph; block rules require it.
    pub fn in_paragraph(&self) -> bool {
        self.schema.type_name(self.textblock) == "paragraph"
    }
}

/// A fired rule and the transaction it built.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub rule: &'static str,
    pub transaction: Transaction,
}

/// Ordered rule table plus the look-back window size.
#[derive(Debug, Clone)]
pub struct InputRuleSet {
    rules: Vec<InputRule>,
    lookback: usize,
}

impl InputRuleSet {
    pub fn new(rules: Vec<InputRule>, lookback: usize) -> Self {
        Self { rules, lookback }
    }

    /// Built-in note rules in their fixed order.
    pub fn builtin(lookback: usize) -> Self {
        Self::new(builtin::rules(), lookback)
    }

    pub fn rules(&self) -> &[InputRule] {
        &self.rules
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Tests `text` typed over `[from, to)` against the rule table.
    ///
    /// Returns `None` when no rule fires; the caller inserts the raw text.
    pub fn handle_text_input(
        &self,
        schema: &Schema,
        doc: &Node,
        from: usize,
        to: usize,
        text: &str,
    ) -> Option<RuleMatch> {
        if text.is_empty() || to < from {
            return None;
        }
        let start = doc.resolve(from).ok()?;
        let end = doc.resolve(to).ok()?;
        if !start.same_parent(&end) {
            return None;
        }
        let textblock = start.parent();
        if !textblock.is_textblock() || schema.node_type(schema.type_of(textblock)).is_code() {
            return None;
        }

        let parent_offset = start.parent_offset();
        let window_start = parent_offset.saturating_sub(self.lookback);
        let truncated = window_start > 0;
        let mut window =
            textblock.text_between(window_start, parent_offset, None, &ATOM_PLACEHOLDER.to_string());
        window.push_str(text);
        let window_abs_start = from - (parent_offset - window_start);

        for rule in &self.rules {
            if rule.line_start && truncated {
                continue;
            }
            let Some(captures) = rule.pattern.captures(&window) else {
                continue;
            };
            let Some(span) = captures.get(rule.span_group) else {
                continue;
            };
            if span.end() != window.len() {
                continue;
            }
            let match_from = window_abs_start + window[..span.start()].chars().count();
            if match_from > from {
                continue;
            }

            let context = RuleContext {
                schema,
                doc,
                textblock,
                marks: doc
                    .resolve(match_from)
                    .map(|pos| pos.marks(schema))
                    .unwrap_or_default(),
                match_from,
                match_to: to,
            };
            let Some(replacement) = (rule.build)(&captures, &context) else {
                continue;
            };
            let Some(transaction) = build_transaction(schema, &start, &context, replacement)
            else {
                continue;
            };
            debug!(
                "event=input_rule module=rules status=matched rule={} span_chars={}",
                rule.name,
                span.as_str().chars().count()
            );
            return Some(RuleMatch {
                rule: rule.name,
                transaction: transaction.set_meta("input_rule", rule.name),
            });
        }
        None
    }
}

fn build_transaction(
    schema: &Schema,
    start: &ResolvedPos<'_>,
    context: &RuleContext<'_>,
    replacement: Replacement,
) -> Option<Transaction> {
    let depth = start.depth();
    let textblock = context.textblock;
    let block_start = start.level_start(depth);
    let remaining = |textblock: &Node| {
        let offset = context.match_to - block_start;
        textblock.content().cut(offset, textblock.content().size())
    };

    match replacement {
        Replacement::Inline(nodes) => {
            let inserted = Fragment::from_nodes(nodes);
            let cursor = context.match_from + inserted.size();
            Some(
                Transaction::new()
                    .replace(context.match_from, context.match_to, Slice::closed(inserted))
                    .set_selection(Selection::cursor(cursor))
                    .set_stored_marks(MarkSet::new()),
            )
        }
        Replacement::SetTextblock { node_type, attrs } => {
            let before = start.before(depth).ok()?;
            let after = start.after(depth).ok()?;
            let node = schema.create(node_type, &attrs, remaining(textblock)).ok()?;
            Some(
                Transaction::new()
                    .replace(before, after, Slice::closed(Fragment::from_node(node)))
                    .set_selection(Selection::cursor(before + 1)),
            )
        }
        Replacement::WrapTextblock { wrappers } => {
            let before = start.before(depth).ok()?;
            let after = start.after(depth).ok()?;
            let mut node = textblock.with_content(remaining(textblock));
            for (node_type, attrs) in wrappers.iter().rev() {
                node = schema
                    .create(*node_type, attrs, Fragment::from_node(node))
                    .ok()?;
            }
            Some(
                Transaction::new()
                    .replace(before, after, Slice::closed(Fragment::from_node(node)))
                    .set_selection(Selection::cursor(before + wrappers.len() + 1)),
            )
        }
        Replacement::BlocksBefore(blocks) => {
            let before = start.before(depth).ok()?;
            let blocks = Fragment::from_nodes(blocks);
            let cursor = context.match_from + blocks.size();
            Some(
                Transaction::new()
                    .delete(context.match_from, context.match_to)
                    .replace(before, before, Slice::closed(blocks))
                    .set_selection(Selection::cursor(cursor)),
            )
        }
    }
}

/// Transaction inserting `text` over `[from, to)` verbatim.
///
/// Uses `stored_marks` when present, otherwise the marks inherited at `from`.
pub fn text_input_transaction(
    schema: &Schema,
    doc: &Node,
    from: usize,
    to: usize,
    text: &str,
    stored_marks: Option<&MarkSet>,
) -> Result<Transaction, PositionError> {
    let marks = match stored_marks {
        Some(marks) => marks.clone(),
        None => doc.resolve(from)?.marks(schema),
    };
    doc.resolve(to)?;
    let cursor = from + text.chars().count();
    Ok(Transaction::new()
        .replace_with_text(from, to, text, marks)
        .set_selection(Selection::cursor(cursor)))
}

#[cfg(test)]
mod tests {
    use super::InputRuleSet;
    use crate::model::attrs::Attrs;
    use crate::model::mark::MarkSet;
    use crate::model::node::Node;
    use crate::schema::Schema;
    use crate::transform::apply_transaction;

    fn doc_with(schema: &Schema, block: &str, text: &str) -> Node {
        let content = if text.is_empty() {
            vec![]
        } else {
            vec![Node::text(text, MarkSet::new())]
        };
        let block = schema.node(block, Attrs::new(), content).expect("block");
        schema.node("doc", Attrs::new(), vec![block]).expect("doc")
    }

    #[test]
    fn first_matching_rule_wins() {
        let schema = Schema::notes().expect("schema");
        let rules = InputRuleSet::builtin(500);
        let doc = doc_with(&schema, "paragraph", "**bold*");
        let matched = rules
            .handle_text_input(&schema, &doc, 8, 8, "*")
            .expect("bold rule");
        assert_eq!(matched.rule, "bold");
    }

    #[test]
    fn rules_do_not_fire_in_code_blocks() {
        let schema = Schema::notes().expect("schema");
        let rules = InputRuleSet::builtin(500);
        let doc = doc_with(&schema, "code_block", "**bold*");
        assert!(rules.handle_text_input(&schema, &doc, 8, 8, "*").is_none());
    }

    #[test]
    fn line_start_rules_skip_truncated_windows() {
        let schema = Schema::notes().expect("schema");
        let rules = InputRuleSet::builtin(1);
        let doc = doc_with(&schema, "paragraph", "##");
        assert!(rules.handle_text_input(&schema, &doc, 3, 3, " ").is_none());

        let rules = InputRuleSet::builtin(500);
        let matched = rules
            .handle_text_input(&schema, &doc, 3, 3, " ")
            .expect("heading rule");
        assert_eq!(matched.rule, "heading");
        let applied =
            apply_transaction(&schema, &doc, &matched.transaction).expect("heading applies");
        assert_eq!(schema.type_name(applied.doc.child(0)), "heading");
        assert_eq!(applied.doc.text_content(), "");
    }

    #[test]
    fn inline_replacement_resets_stored_marks() {
        let schema = Schema::notes().expect("schema");
        let rules = InputRuleSet::builtin(500);
        let doc = doc_with(&schema, "paragraph", "say ==hi=");
        let matched = rules
            .handle_text_input(&schema, &doc, 10, 10, "=")
            .expect("highlight rule");
        assert_eq!(matched.transaction.stored_marks(), Some(&MarkSet::new()));
        let applied =
            apply_transaction(&schema, &doc, &matched.transaction).expect("highlight applies");
        let run = applied.doc.child(0).child(1);
        assert_eq!(run.text_str(), Some("hi"));
        assert!(run
            .marks()
            .has_type(schema.mark_id("highlight").expect("highlight")));
        assert_eq!(applied.doc.text_content(), "say hi");
    }
}
