//! Note index derived from a document.
//!
//! # Responsibility
//! - Extract title, outgoing links, tags, headings and word count for
//!   backlink and tag views.
//!
//! # Invariants
//! - Indexing is read-only and deterministic.
//! - Tags inside code blocks or `code` marks are ignored.
//! - Links and tags are deduplicated keeping first-seen order.

use crate::decoration::{outline, OutlineEntry};
use crate::model::node::Node;
use crate::schema::Schema;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)(#[\p{L}\p{N}_-]+(?:/[\p{L}\p{N}_-]+)*)").expect("valid tag regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteIndex {
    pub path: String,
    pub title: String,
    /// Linked note titles.
    pub outgoing_links: Vec<String>,
    /// Tags including the leading `#`.
    pub tags: Vec<String>,
    pub headings: Vec<OutlineEntry>,
    pub word_count: usize,
}

pub fn index_document(schema: &Schema, path: &str, doc: &Node) -> NoteIndex {
    let link = schema.mark_id("link");
    let code = schema.mark_id("code");
    let mut outgoing_links: Vec<String> = Vec::new();
    let mut tags: Vec<String> = Vec::new();
    let mut word_count = 0;

    doc.descendants(|node, _, _| {
        if !node.is_textblock() {
            return true;
        }
        word_count += node.text_content().split_whitespace().count();
        if schema.node_type(schema.type_of(node)).is_code() {
            return false;
        }

        let mut plain = String::new();
        for child in node.content() {
            let marks = child.marks();
            if let Some(title) = link
                .and_then(|link| marks.find(link))
                .and_then(|mark| mark.attrs().get("note_title"))
                .and_then(|value| value.as_str())
            {
                push_unique(&mut outgoing_links, title);
            }
            match child.text_str() {
                Some(text) if !code.is_some_and(|code| marks.has_type(code)) => plain.push_str(text),
                _ => plain.push(' '),
            }
        }
        for captures in TAG_RE.captures_iter(&plain) {
            if let Some(tag) = captures.get(1) {
                push_unique(&mut tags, tag.as_str());
            }
        }
        false
    });

    let headings = outline(schema, doc);
    let title = headings
        .first()
        .map(|heading| heading.text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| {
            Path::new(path)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

    debug!(
        "event=note_index module=index status=ok links={} tags={} headings={} words={}",
        outgoing_links.len(),
        tags.len(),
        headings.len(),
        word_count
    );
    NoteIndex {
        path: path.to_string(),
        title,
        outgoing_links,
        tags,
        headings,
        word_count,
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|existing| existing == value) {
        values.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::index_document;
    use crate::model::attrs::{attrs, Attrs};
    use crate::model::mark::MarkSet;
    use crate::model::node::Node;
    use crate::schema::Schema;

    fn text(schema: &Schema, value: &str, mark: Option<(&str, Attrs)>) -> Node {
        let marks = match mark {
            Some((name, mark_attrs)) => {
                schema.add_mark(&MarkSet::new(), schema.mark(name, mark_attrs).expect("mark"))
            }
            None => MarkSet::new(),
        };
        Node::text(value, marks)
    }

    #[test]
    fn collects_links_tags_and_title() {
        let schema = Schema::notes().expect("schema");
        let link = || Some(("link", attrs([("note_title", "Roadmap")])));
        let paragraph = schema
            .node(
                "paragraph",
                Attrs::new(),
                vec![
                    text(&schema, "see ", None),
                    text(&schema, "Roadmap", link()),
                    text(&schema, " #work/q3 #idea ", None),
                    text(&schema, "#skipped", Some(("code", Attrs::new()))),
                    text(&schema, " and ", None),
                    text(&schema, "again", link()),
                ],
            )
            .expect("paragraph");
        let code = schema
            .node(
                "code_block",
                Attrs::new(),
                vec![text(&schema, "#include <x>", None)],
            )
            .expect("code");
        let doc = schema
            .node("doc", Attrs::new(), vec![paragraph, code])
            .expect("doc");

        let index = index_document(&schema, "projects/plan.json", &doc);
        assert_eq!(index.title, "plan");
        assert_eq!(index.outgoing_links, vec!["Roadmap".to_string()]);
        assert_eq!(index.tags, vec!["#work/q3".to_string(), "#idea".to_string()]);
        assert!(index.headings.is_empty());
        assert_eq!(index.word_count, 9);
    }
}
