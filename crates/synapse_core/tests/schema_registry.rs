use synapse_core::model::attrs::{attrs, AttrValue, Attrs};
use synapse_core::model::mark::MarkSet;
use synapse_core::model::node::Node;
use synapse_core::schema::{
    AttrError, AttrKind, AttrSpec, MarkSpec, NodeError, NodeSpec, Schema, SchemaError,
};

fn minimal() -> synapse_core::schema::SchemaBuilder {
    Schema::builder()
        .node(NodeSpec::block("doc").content("paragraph+"))
        .node(NodeSpec::block("paragraph").content("text*"))
        .node(NodeSpec::inline("text"))
}

#[test]
fn notes_schema_fills_attribute_defaults() {
    let schema = Schema::notes().unwrap();
    let heading = schema
        .parse_node("heading", &Attrs::new(), vec![Node::text("Title", MarkSet::new())])
        .unwrap();
    assert_eq!(heading.attrs().get("level"), Some(&AttrValue::Int(1)));
    assert!(schema.serialize_node_attrs(&heading).is_empty());

    let callout = schema
        .node(
            "callout",
            attrs([("callout_type", "warning")]),
            vec![schema.node("paragraph", Attrs::new(), vec![]).unwrap()],
        )
        .unwrap();
    assert_eq!(
        schema.serialize_node_attrs(&callout),
        attrs([("callout_type", "warning")])
    );
}

#[test]
fn duplicate_and_unknown_declarations_are_rejected() {
    let err = minimal()
        .node(NodeSpec::block("paragraph"))
        .build()
        .unwrap_err();
    assert_eq!(err, SchemaError::DuplicateNodeType("paragraph".to_string()));

    let err = Schema::builder()
        .node(NodeSpec::block("doc").content("section+"))
        .node(NodeSpec::inline("text"))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownContentName { name, .. } if name == "section"));

    let err = minimal()
        .mark(MarkSpec::new("code").excludes("bold"))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownExcludedMark { .. }));

    let err = Schema::builder()
        .node(NodeSpec::block("paragraph").content("text*"))
        .node(NodeSpec::inline("text"))
        .build()
        .unwrap_err();
    assert_eq!(err, SchemaError::MissingTopNode);
}

#[test]
fn attribute_and_content_violations_are_reported() {
    let schema = Schema::notes().unwrap();

    let err = schema.node("image", Attrs::new(), vec![]).unwrap_err();
    assert!(matches!(err, NodeError::Attr(AttrError::Missing { attr, .. }) if attr == "src"));

    let err = schema
        .node("heading", attrs([("level", "two")]), vec![])
        .unwrap_err();
    assert!(matches!(err, NodeError::Attr(AttrError::Invalid { .. })));

    let err = schema.node("doc", Attrs::new(), vec![]).unwrap_err();
    assert!(matches!(err, NodeError::InvalidContent { node } if node == "doc"));

    let err = schema.node("nope", Attrs::new(), vec![]).unwrap_err();
    assert_eq!(err, NodeError::UnknownNodeType("nope".to_string()));
}

#[test]
fn exclusive_marks_replace_or_block_others() {
    let schema = Schema::notes().unwrap();
    let bold = schema.mark("bold", Attrs::new()).unwrap();
    let code = schema.mark("code", Attrs::new()).unwrap();
    let bold_id = schema.mark_id("bold").unwrap();
    let code_id = schema.mark_id("code").unwrap();

    let with_bold = schema.add_mark(&MarkSet::new(), bold.clone());
    let coded = schema.add_mark(&with_bold, code.clone());
    assert!(coded.has_type(code_id));
    assert!(!coded.has_type(bold_id));

    let still_code = schema.add_mark(&coded, bold);
    assert_eq!(still_code, coded);
}

#[test]
fn custom_attribute_kinds_parse_strictly() {
    let schema = minimal()
        .node(
            NodeSpec::block("task")
                .content("text*")
                .attr(AttrSpec::with_default("done", AttrKind::Bool, false)),
        )
        .build()
        .unwrap();
    let task = schema
        .node("task", attrs([("done", true)]), vec![])
        .unwrap();
    assert_eq!(task.attrs().get("done"), Some(&AttrValue::Bool(true)));
    assert!(schema.node("task", attrs([("done", 1_i64)]), vec![]).is_err());
    assert!(schema.node("task", attrs([("other", 1_i64)]), vec![]).is_err());
}
