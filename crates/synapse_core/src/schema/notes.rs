//! Built-in note schema.

use super::{AttrKind, AttrSpec, MarkSpec, NodeSpec, Schema, SchemaError};
use crate::model::attrs::AttrValue;

impl Schema {
    /// Builds the schema used for vault notes.
    ///
    /// # Errors
    /// Only fails if the declarations below are edited into an invalid state.
    pub fn notes() -> Result<Schema, SchemaError> {
        Schema::builder()
            .node(NodeSpec::block("doc").content("block+"))
            .node(NodeSpec::block("paragraph").group("block").content("inline*"))
            .node(
                NodeSpec::block("heading")
                    .group("block")
                    .content("inline*")
                    .attr(AttrSpec::with_default("level", AttrKind::Int, 1_i64)),
            )
            .node(NodeSpec::block("blockquote").group("block").content("block+"))
            .node(
                NodeSpec::block("callout")
                    .group("block")
                    .content("block+")
                    .attr(AttrSpec::with_default("callout_type", AttrKind::Str, "note"))
                    .attr(AttrSpec::with_default("title", AttrKind::Str, "")),
            )
            .node(NodeSpec::block("bullet_list").group("block").content("list_item+"))
            .node(
                NodeSpec::block("ordered_list")
                    .group("block")
                    .content("list_item+")
                    .attr(AttrSpec::with_default("start", AttrKind::Int, 1_i64)),
            )
            .node(NodeSpec::block("list_item").content("paragraph block*"))
            .node(NodeSpec::block("task_list").group("block").content("task_item+"))
            .node(
                NodeSpec::block("task_item")
                    .content("paragraph block*")
                    .attr(AttrSpec::with_default("checked", AttrKind::Bool, false)),
            )
            .node(
                NodeSpec::block("code_block")
                    .group("block")
                    .content("text*")
                    .attr(AttrSpec::with_default("language", AttrKind::Str, ""))
                    .no_marks()
                    .code(),
            )
            .node(NodeSpec::block("horizontal_rule").group("block"))
            .node(
                NodeSpec::block("math_block")
                    .group("block")
                    .atom()
                    .attr(AttrSpec::with_default("content", AttrKind::Str, "")),
            )
            .node(NodeSpec::block("columns").group("block").content("column{2,3}"))
            .node(NodeSpec::block("column").content("block+"))
            .node(
                NodeSpec::block("image")
                    .group("block")
                    .attr(AttrSpec::required("src", AttrKind::Str))
                    .attr(AttrSpec::with_default("alt", AttrKind::Str, "")),
            )
            .node(NodeSpec::inline("text").group("inline"))
            .node(NodeSpec::inline("hard_break").group("inline"))
            .node(
                NodeSpec::inline("math_inline")
                    .group("inline")
                    .atom()
                    .attr(AttrSpec::with_default("content", AttrKind::Str, "")),
            )
            .node(
                NodeSpec::inline("footnote_ref")
                    .group("inline")
                    .atom()
                    .attr(AttrSpec::required("id", AttrKind::Str))
                    .attr(AttrSpec::with_default("content", AttrKind::Str, "")),
            )
            .mark(MarkSpec::new("bold"))
            .mark(MarkSpec::new("italic"))
            .mark(MarkSpec::new("strike"))
            .mark(MarkSpec::new("code").excludes("_"))
            .mark(
                MarkSpec::new("highlight")
                    .attr(AttrSpec::with_default("color", AttrKind::Str, "")),
            )
            .mark(
                MarkSpec::new("link")
                    .attr(AttrSpec::required("note_title", AttrKind::Str))
                    .attr(AttrSpec::with_default(
                        "heading",
                        AttrKind::OptionalStr,
                        AttrValue::Null,
                    ))
                    .attr(AttrSpec::with_default(
                        "block_ref",
                        AttrKind::OptionalStr,
                        AttrValue::Null,
                    ))
                    .non_inclusive(),
            )
            .build()
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::Schema;

    #[test]
    fn notes_schema_builds_with_expected_shape() {
        let schema = Schema::notes().expect("notes schema");
        for name in ["paragraph", "heading", "code_block"] {
            assert!(
                schema.node_type_by_name(name).expect(name).is_textblock(),
                "{name} should be a textblock"
            );
        }
        assert!(schema.node_type_by_name("math_inline").expect("math").is_atom());
        assert!(schema.node_type_by_name("code_block").expect("code").is_code());
        assert!(!schema.mark_type_by_name("link").expect("link").is_inclusive());

        let code = schema.mark_id("code").expect("code mark");
        let bold = schema.mark_id("bold").expect("bold mark");
        assert!(schema.mark_excludes(code, bold));
        assert!(!schema.mark_excludes(bold, code));
    }
}
