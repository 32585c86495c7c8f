use std::sync::Arc;
use synapse_core::model::attrs::Attrs;
use synapse_core::model::mark::MarkSet;
use synapse_core::model::node::Node;
use synapse_core::schema::Schema;
use synapse_core::search::{search, MatchRange, SearchState};
use synapse_core::transform::apply_transaction;
use synapse_core::{EditorConfig, EditorSession};

fn setup(texts: &[&str]) -> (Schema, Node) {
    let schema = Schema::notes().unwrap();
    let blocks = texts
        .iter()
        .map(|text| {
            schema
                .node("paragraph", Attrs::new(), vec![Node::text(*text, MarkSet::new())])
                .unwrap()
        })
        .collect();
    let doc = schema.node("doc", Attrs::new(), blocks).unwrap();
    (schema, doc)
}

fn text_len(doc: &Node) -> usize {
    doc.text_content().chars().count()
}

#[test]
fn case_sensitivity_changes_match_count() {
    let (_, doc) = setup(&["hello Hello HELLO"]);
    assert_eq!(search(&doc, "Hello", false).len(), 3);
    assert_eq!(
        search(&doc, "Hello", true),
        vec![MatchRange { from: 7, to: 12 }]
    );
}

#[test]
fn matches_never_cross_blocks() {
    let (_, doc) = setup(&["foo", "bar"]);
    assert!(search(&doc, "obar", false).is_empty());
    assert!(search(&doc, "", false).is_empty());
}

#[test]
fn replace_all_removes_every_match_and_adjusts_length() {
    let (schema, doc) = setup(&["foo and foo", "more foo"]);
    let mut state = SearchState::new(false);
    state.set_term(&doc, "foo");
    assert_eq!(state.results().len(), 3);

    state.set_replacement("bar");
    let tr = state.replace_all_transaction(&doc).unwrap();
    let same_len = apply_transaction(&schema, &doc, &tr).unwrap();
    assert!(search(&same_len.doc, "foo", false).is_empty());
    assert_eq!(text_len(&same_len.doc), text_len(&doc));

    state.set_replacement("quux");
    let tr = state.replace_all_transaction(&doc).unwrap();
    let longer = apply_transaction(&schema, &doc, &tr).unwrap();
    assert!(search(&longer.doc, "foo", false).is_empty());
    assert_eq!(text_len(&longer.doc), text_len(&doc) + 3);
    assert_eq!(longer.doc.child(1).text_content(), "more quux");
}

#[test]
fn session_replace_flow_updates_results() {
    let (schema, doc) = setup(&["foo foo foo"]);
    let mut session = EditorSession::new(Arc::new(schema), EditorConfig::default(), doc).unwrap();
    assert_eq!(session.find("foo").unwrap(), 3);
    assert_eq!(session.next_match().unwrap(), Some(MatchRange { from: 5, to: 8 }));
    assert_eq!(session.selection().from(), 5);

    session.set_replacement("x");
    assert!(session.replace_current().unwrap());
    assert_eq!(session.document().text_content(), "foo x foo");
    assert_eq!(session.search().results().len(), 2);
    assert_eq!(session.search().current_index(), 2);

    assert_eq!(session.replace_all().unwrap(), 2);
    assert_eq!(session.document().text_content(), "x x x");
    assert!(session.search().results().is_empty());
    assert_eq!(session.search().term(), "");
    assert!(!session.replace_current().unwrap());
}

#[test]
fn replacement_keeps_marks_of_the_match() {
    let schema = Schema::notes().unwrap();
    let bold = schema.mark("bold", Attrs::new()).unwrap();
    let bold_id = schema.mark_id("bold").unwrap();
    let paragraph = schema
        .node(
            "paragraph",
            Attrs::new(),
            vec![
                Node::text("plain ", MarkSet::new()),
                Node::text("target", schema.add_mark(&MarkSet::new(), bold)),
            ],
        )
        .unwrap();
    let doc = schema.node("doc", Attrs::new(), vec![paragraph]).unwrap();
    let mut state = SearchState::new(true);
    state.set_term(&doc, "target");
    state.set_replacement("hit");
    let tr = state.replace_one_transaction(&doc).unwrap();
    let applied = apply_transaction(&schema, &doc, &tr).unwrap();
    let run = applied.doc.child(0).child(1);
    assert_eq!(run.text_str(), Some("hit"));
    assert!(run.marks().has_type(bold_id));
}
