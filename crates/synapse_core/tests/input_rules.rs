use std::sync::Arc;
use synapse_core::model::attrs::{AttrValue, Attrs};
use synapse_core::model::node::Node;
use synapse_core::schema::Schema;
use synapse_core::{parse, serialize, EditorConfig, EditorSession};

fn setup() -> EditorSession {
    let schema = Arc::new(Schema::notes().unwrap());
    let paragraph = schema.node("paragraph", Attrs::new(), vec![]).unwrap();
    let doc = schema.node("doc", Attrs::new(), vec![paragraph]).unwrap();
    EditorSession::new(schema, EditorConfig::default(), doc).unwrap()
}

/// Types `text` one character at a time; returns the rules that fired.
fn type_text(session: &mut EditorSession, text: &str) -> Vec<&'static str> {
    text.chars()
        .filter_map(|c| session.insert_text(&c.to_string()).unwrap())
        .collect()
}

fn type_name(session: &EditorSession, node: &Node) -> String {
    session.schema().type_name(node).to_string()
}

#[test]
fn wikilink_becomes_single_linked_run() {
    let mut session = setup();
    let fired = type_text(&mut session, "[[Project Plan]]");
    assert_eq!(fired, vec!["wikilink"]);

    let paragraph = session.document().child(0);
    assert_eq!(paragraph.child_count(), 1);
    let run = paragraph.child(0);
    assert_eq!(run.text_str(), Some("Project Plan"));
    let link = session.schema().mark_id("link").unwrap();
    let mark = run.marks().find(link).unwrap();
    assert_eq!(
        mark.attrs().get("note_title"),
        Some(&AttrValue::Str("Project Plan".to_string()))
    );
    assert_eq!(mark.attrs().get("heading"), Some(&AttrValue::Null));
    assert!(!session.document().text_content().contains('['));

    type_text(&mut session, " next");
    let tail = session.document().child(0).child(1);
    assert_eq!(tail.text_str(), Some(" next"));
    assert!(tail.marks().is_empty());
}

#[test]
fn wikilink_with_heading_and_alias_shows_alias() {
    let mut session = setup();
    type_text(&mut session, "[[Plan#Goals|the plan]]");
    let run = session.document().child(0).child(0);
    assert_eq!(run.text_str(), Some("the plan"));
    let link = session.schema().mark_id("link").unwrap();
    let mark = run.marks().find(link).unwrap();
    assert_eq!(
        mark.attrs().get("heading"),
        Some(&AttrValue::Str("Goals".to_string()))
    );
}

#[test]
fn line_start_rules_restructure_the_block() {
    let mut session = setup();
    assert_eq!(type_text(&mut session, "## "), vec!["heading"]);
    let heading = session.document().child(0);
    assert_eq!(type_name(&session, heading), "heading");
    assert_eq!(heading.attrs().get("level"), Some(&AttrValue::Int(2)));
    assert_eq!(heading.content().size(), 0);

    let mut session = setup();
    assert_eq!(type_text(&mut session, "- item"), vec!["bullet_list"]);
    let list = session.document().child(0);
    assert_eq!(type_name(&session, list), "bullet_list");
    assert_eq!(type_name(&session, list.child(0)), "list_item");
    assert_eq!(list.text_content(), "item");

    let mut session = setup();
    assert_eq!(type_text(&mut session, "> [!Warning] "), vec!["callout"]);
    let callout = session.document().child(0);
    assert_eq!(type_name(&session, callout), "callout");
    assert_eq!(
        callout.attrs().get("callout_type"),
        Some(&AttrValue::Str("warning".to_string()))
    );
}

#[test]
fn horizontal_rule_is_inserted_before_the_paragraph() {
    let mut session = setup();
    assert_eq!(type_text(&mut session, "---"), vec!["horizontal_rule"]);
    let doc = session.document();
    assert_eq!(doc.child_count(), 2);
    assert_eq!(type_name(&session, doc.child(0)), "horizontal_rule");
    assert_eq!(doc.child(1).content().size(), 0);
    assert_eq!(session.selection().head, 2);
}

#[test]
fn inline_marks_and_footnotes() {
    let mut session = setup();
    assert_eq!(type_text(&mut session, "a **b**"), vec!["bold"]);
    let bold = session.schema().mark_id("bold").unwrap();
    let paragraph = session.document().child(0);
    assert_eq!(paragraph.child(1).text_str(), Some("b"));
    assert!(paragraph.child(1).marks().has_type(bold));

    let mut session = setup();
    assert_eq!(
        type_text(&mut session, "x[^one] y[^two]"),
        vec!["footnote", "footnote"]
    );
    let footnote = session.schema().node_id("footnote_ref").unwrap();
    let mut ids = Vec::new();
    session.document().descendants(|node, _, _| {
        if node.element_type() == Some(footnote) {
            ids.push(node.attrs().get("id").cloned());
        }
        true
    });
    assert_eq!(
        ids,
        vec![
            Some(AttrValue::Str("1".to_string())),
            Some(AttrValue::Str("2".to_string()))
        ]
    );
}

#[test]
fn rule_output_round_trips_through_the_codec() {
    for input in [
        "[[Project Plan]] next",
        "[[Plan#Goals|the plan]]",
        "## ",
        "- item",
        "> [!Warning] ",
        "---",
        "a **b**",
        "x[^one] y[^two]",
    ] {
        let mut session = setup();
        type_text(&mut session, input);
        let markup = serialize(session.schema(), session.document()).unwrap();
        let reparsed = parse(session.schema(), &markup).unwrap();
        assert_eq!(&reparsed, session.document(), "input {input:?}");
    }
}
