use synapse_core::codec::{parse, serialize, CodecError};
use synapse_core::schema::{NodeError, Schema};

const RICH_NOTE: &str = r#"{
  "type": "doc",
  "content": [
    {"type": "heading", "attrs": {"level": 2}, "content": [{"type": "text", "text": "Weekly review"}]},
    {"type": "paragraph", "content": [
      {"type": "text", "text": "See "},
      {"type": "text", "text": "the plan", "marks": [
        {"type": "link", "attrs": {"note_title": "Project Plan", "heading": "Goals"}}
      ]},
      {"type": "text", "text": " and ", "marks": []},
      {"type": "text", "text": "this", "marks": [{"type": "bold"}, {"type": "italic"}]},
      {"type": "footnote_ref", "attrs": {"id": "1", "content": "source"}},
      {"type": "hard_break"},
      {"type": "math_inline", "attrs": {"content": "e^{i\\pi}"}}
    ]},
    {"type": "task_list", "content": [
      {"type": "task_item", "attrs": {"checked": true}, "content": [
        {"type": "paragraph", "content": [{"type": "text", "text": "ship"}]}
      ]}
    ]},
    {"type": "ordered_list", "attrs": {"start": 3}, "content": [
      {"type": "list_item", "content": [{"type": "paragraph"}]}
    ]},
    {"type": "code_block", "attrs": {"language": "rust"}, "content": [{"type": "text", "text": "fn main() {}"}]},
    {"type": "callout", "attrs": {"callout_type": "tip", "title": "Note"}, "content": [
      {"type": "paragraph", "content": [{"type": "text", "text": "inside", "marks": [{"type": "highlight", "attrs": {"color": "yellow"}}]}]}
    ]},
    {"type": "columns", "content": [
      {"type": "column", "content": [{"type": "image", "attrs": {"src": "a.png", "alt": "A"}}]},
      {"type": "column", "content": [{"type": "math_block", "attrs": {"content": "x^2"}}]}
    ]},
    {"type": "horizontal_rule"},
    {"type": "blockquote", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "quoted"}]}]}
  ]
}"#;

#[test]
fn rich_note_round_trips() {
    let schema = Schema::notes().unwrap();
    let doc = parse(&schema, RICH_NOTE).unwrap();
    let markup = serialize(&schema, &doc).unwrap();
    let reparsed = parse(&schema, &markup).unwrap();
    assert_eq!(reparsed, doc);
    assert_eq!(serialize(&schema, &reparsed).unwrap(), markup);
}

#[test]
fn serialized_markup_is_plain_json() {
    let schema = Schema::notes().unwrap();
    let doc = parse(&schema, RICH_NOTE).unwrap();
    let value: serde_json::Value = serde_json::from_str(&serialize(&schema, &doc).unwrap()).unwrap();

    let paragraph = &value["content"][1];
    assert_eq!(paragraph["type"], "paragraph");
    let link = &paragraph["content"][1]["marks"][0];
    assert_eq!(link["type"], "link");
    assert_eq!(link["attrs"]["note_title"], "Project Plan");
    assert_eq!(link["attrs"]["heading"], "Goals");
    assert!(link["attrs"].get("block_ref").is_none());
    assert!(paragraph["content"][2].get("marks").is_none());
    assert!(value["content"][3]["content"][0]["content"][0]
        .get("content")
        .is_none());
}

#[test]
fn invalid_markup_is_rejected() {
    let schema = Schema::notes().unwrap();
    let err = parse(&schema, "not json").unwrap_err();
    assert!(matches!(err, CodecError::Json(_)));

    let err = parse(
        &schema,
        r#"{"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"a","marks":[{"type":"glow"}]}]}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::Node(NodeError::UnknownMarkType(name)) if name == "glow"));

    let err = parse(
        &schema,
        r#"{"type":"doc","content":[{"type":"bullet_list","content":[{"type":"paragraph"}]}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::Node(NodeError::InvalidContent { node }) if node == "bullet_list"));
}
