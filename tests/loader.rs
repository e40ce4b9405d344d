use serde_json::json;

use schemaforge::{
    Element, FormRenderer, InputType, SchemaKind, TypeTag, Widget, classify, load_schema, unwrap,
};

#[test]
fn loads_layout_and_refs_from_json_schema() {
    let raw = json!({
        "definitions": {
            "level": {"type": "string", "enum": ["low", "high"]}
        },
        "type": "object",
        "properties": {
            "prompt": {
                "type": "string",
                "description": "What to ask",
                "x-layout": {"label": "Prompt", "inputType": "textarea"}
            },
            "level": {"$ref": "#/definitions/level"},
            "retries": {"type": "integer", "default": 3}
        },
        "required": ["prompt"]
    });
    let schema = load_schema(&raw).expect("schema loads");
    let SchemaKind::Object(object) = &schema.kind else {
        panic!("expected an object, got {:?}", schema.kind);
    };

    let prompt = unwrap(&object.properties["prompt"]);
    let layout = prompt.layout.expect("layout attached");
    assert_eq!(layout.label.as_deref(), Some("Prompt"));
    assert_eq!(layout.helper_text.as_deref(), Some("What to ask"));
    assert_eq!(layout.input_type, Some(InputType::Textarea));

    assert_eq!(classify(&object.properties["level"]), TypeTag::Enum);
    assert!(matches!(object.properties["retries"].kind, SchemaKind::Optional(_)));
    assert_eq!(unwrap(&object.properties["retries"]).default, Some(&json!(3)));
}

#[test]
fn one_of_with_literal_tags_becomes_discriminated_union() {
    let raw = json!({
        "oneOf": [
            {"type": "object", "properties": {"kind": {"const": "text"}, "body": {"type": "string"}}},
            {"type": "object", "properties": {"kind": {"const": "image"}, "url": {"type": "string"}}}
        ]
    });
    let schema = load_schema(&raw).expect("schema loads");
    let SchemaKind::DiscriminatedUnion(union) = &schema.kind else {
        panic!("expected a discriminated union, got {:?}", schema.kind);
    };
    assert_eq!(union.discriminator, "kind");
    assert_eq!(union.branch_ids(), ["text", "image"]);

    let tree = FormRenderer::new()
        .render_root(&schema, &json!({"kind": "image"}), None)
        .expect("renders");
    let Element::DiscriminatedUnion { selector, branch, .. } = &tree.element else {
        panic!("expected a union element");
    };
    assert!(matches!(
        selector.element,
        Element::Field { widget: Widget::Dropdown { .. }, .. }
    ));
    assert_eq!(branch.as_ref().map(|branch| branch.leaf_count()), Some(1));
}

#[test]
fn unsupported_reference_is_an_error() {
    let raw = json!({
        "type": "object",
        "properties": {"x": {"$ref": "https://example.com/other.json"}}
    });
    assert!(load_schema(&raw).is_err());
}
