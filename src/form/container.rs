use indexmap::IndexMap;
use serde_json::Value;

use crate::domain::{ArraySchema, DiscriminatedUnionSchema, LayoutMetadata, ObjectSchema, Schema};
use crate::schema::{
    Effective, TypeTag, classify, initial_value, present, resolve_metadata, unwrap,
    value_to_string,
};

use super::{
    context::RenderContext,
    dispatch::FormRenderer,
    lens::Lens,
    list_ops::blank_item,
    render::{Choice, EditHandle, Element, RenderNode, Widget, Width},
};

impl FormRenderer {
    /// Renders properties in declaration order. `exclude` drops one property,
    /// used for the discriminant of a union branch.
    pub(super) fn render_object(
        &self,
        object: &ObjectSchema,
        value: Option<&Value>,
        lens: &Lens,
        ctx: RenderContext<'_>,
        exclude: Option<&str>,
    ) -> Option<RenderNode> {
        let mut fields: Vec<RenderNode> = Vec::new();
        let mut accordions: IndexMap<&str, usize> = IndexMap::new();

        for (name, property) in &object.properties {
            if exclude == Some(name.as_str()) {
                continue;
            }
            let child_value = value.and_then(|value| value.get(name));
            let child_lens = lens.key(name);
            let field_ctx = ctx.field(name);

            let Some(title) = accordion_title(property).filter(|_| !ctx.in_accordion) else {
                fields.extend(self.render(property, child_value, &child_lens, field_ctx));
                continue;
            };
            let Some(node) = self.render(property, child_value, &child_lens, field_ctx.accordion())
            else {
                continue;
            };
            match accordions.get(title) {
                Some(&slot) => {
                    if let Element::Accordion { fields: grouped, .. } = &mut fields[slot].element {
                        grouped.push(node);
                    }
                }
                None => {
                    accordions.insert(title, fields.len());
                    fields.push(RenderNode::new(
                        EditHandle::replace(lens.clone()),
                        Element::Accordion {
                            title: title.to_string(),
                            fields: vec![node],
                        },
                    ));
                }
            }
        }

        Some(RenderNode::new(
            EditHandle::replace(lens.clone()),
            Element::Object { fields },
        ))
    }

    pub(super) fn render_union(
        &self,
        union: &DiscriminatedUnionSchema,
        effective: &Effective<'_>,
        value: Option<&Value>,
        lens: &Lens,
        ctx: RenderContext<'_>,
    ) -> Option<RenderNode> {
        let discriminator = union.discriminator.as_str();
        let layout = resolve_metadata(effective);
        let current = present(value.and_then(|value| value.get(discriminator)));

        let mut props = self.field_props(layout, current.cloned(), ctx);
        if props.placeholder.is_none() {
            props.placeholder = Some(format!("Select a {discriminator}"));
        }
        let choices = union
            .branch_ids()
            .into_iter()
            .map(|id| Choice {
                label: id.clone(),
                value: id,
            })
            .collect();
        let selector = RenderNode::new(
            EditHandle::select_branch(lens.clone(), discriminator),
            Element::Field {
                widget: Widget::Dropdown {
                    choices,
                    direction: layout.and_then(|layout| layout.direction),
                },
                props,
            },
        );

        let branch = current
            .map(value_to_string)
            .and_then(|id| union.branch(&id))
            .and_then(|branch| {
                self.render_object(branch, value, lens, ctx.nested(None), Some(discriminator))
            })
            .map(Box::new);

        Some(RenderNode::new(
            EditHandle::replace(lens.clone()),
            Element::DiscriminatedUnion {
                discriminator: discriminator.to_string(),
                selector: Box::new(selector),
                branch,
            },
        ))
    }

    /// The array handle always takes the whole new sequence; item and row
    /// handles are lenses on their index.
    pub(super) fn render_array(
        &self,
        array: &ArraySchema,
        effective: &Effective<'_>,
        value: Option<&Value>,
        lens: &Lens,
        ctx: RenderContext<'_>,
    ) -> Option<RenderNode> {
        let fallback = LayoutMetadata::default();
        let layout = resolve_metadata(effective).unwrap_or(&fallback);
        let current = initial_value(value, effective);
        let items = current
            .as_ref()
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let props = self.field_props(Some(layout), current.clone(), ctx);
        let handle = EditHandle::replace(lens.clone());

        let element = match classify(&array.element) {
            TypeTag::String => Element::TagList {
                props,
                items: items.iter().map(value_to_string).collect(),
                merge_with_last_field: layout.merge_with_last_field,
            },
            TypeTag::Number | TypeTag::Enum => Element::PrimitiveList {
                props,
                add_label: add_label(layout),
                blank_item: blank_item(&array.element),
                items: self.render_items(&array.element, items, lens, ctx.nested(Some(Width::Full))),
                merge_with_last_field: layout.merge_with_last_field,
            },
            _ => Element::Table {
                props,
                add_label: add_label(layout),
                blank_item: blank_item(&array.element),
                is_ordered: layout.is_ordered,
                rows: self.render_items(&array.element, items, lens, ctx.nested(None)),
            },
        };
        Some(RenderNode::new(handle, element))
    }

    fn render_items(
        &self,
        element: &Schema,
        items: &[Value],
        lens: &Lens,
        ctx: RenderContext<'_>,
    ) -> Vec<RenderNode> {
        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| self.render(element, Some(item), &lens.index(index), ctx))
            .collect()
    }
}

/// Arrays are never pulled into an accordion.
fn accordion_title(property: &Schema) -> Option<&str> {
    let effective = unwrap(property);
    if effective.tag() == TypeTag::Array {
        return None;
    }
    resolve_metadata(&effective).and_then(|layout| layout.accordion.as_deref())
}

fn add_label(layout: &LayoutMetadata) -> String {
    match layout.item_label.as_deref() {
        Some(item) if !item.is_empty() => format!("Add {item}"),
        _ => "Add".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::HiddenRule;
    use crate::form::lens::DataPath;

    fn render(schema: &Schema, data: &Value) -> RenderNode {
        FormRenderer::new()
            .render_root(schema, data, None)
            .expect("tree renders")
    }

    fn in_accordion(title: &str) -> LayoutMetadata {
        LayoutMetadata {
            accordion: Some(title.into()),
            ..LayoutMetadata::default()
        }
    }

    #[test]
    fn accordion_groups_at_first_member() {
        let schema = Schema::object([
            ("model", Schema::string()),
            ("temperature", Schema::number().with_layout(in_accordion("Advanced"))),
            ("stream", Schema::boolean()),
            ("maxTokens", Schema::number().with_layout(in_accordion("Advanced"))),
            ("stop", Schema::array(Schema::string()).with_layout(in_accordion("Advanced"))),
        ]);
        let tree = render(&schema, &json!({}));
        let Element::Object { fields } = &tree.element else {
            panic!("expected object");
        };
        assert_eq!(fields.len(), 4);
        let Element::Accordion { title, fields: grouped } = &fields[1].element else {
            panic!("expected accordion at the first grouped field");
        };
        assert_eq!(title, "Advanced");
        assert_eq!(grouped.len(), 2);
        assert!(matches!(fields[3].element, Element::TagList { .. }));
    }

    #[test]
    fn union_placeholder_and_branch_without_discriminant() {
        let schema = Schema::discriminated_union(
            "authType",
            [
                ObjectSchema::new([
                    ("authType", Schema::literal("apiKey")),
                    ("apiKey", Schema::string()),
                ]),
                ObjectSchema::new([
                    ("authType", Schema::literal("oauth")),
                    ("clientId", Schema::string()),
                    ("clientSecret", Schema::string()),
                ]),
            ],
        );
        let tree = render(&schema, &json!({"authType": "oauth", "clientId": "c"}));
        let Element::DiscriminatedUnion { selector, branch, .. } = &tree.element else {
            panic!("expected union");
        };
        let Element::Field { widget, props } = &selector.element else {
            panic!("selector is a field");
        };
        assert_eq!(props.placeholder.as_deref(), Some("Select a authType"));
        assert_eq!(props.value, Some(json!("oauth")));
        assert!(matches!(widget, Widget::Dropdown { choices, .. } if choices.len() == 2));

        let branch = branch.as_ref().expect("active branch");
        let Element::Object { fields } = &branch.element else {
            panic!("branch is an object");
        };
        let paths: Vec<_> = fields
            .iter()
            .map(|field| field.handle.lens.path().to_pointer())
            .collect();
        assert_eq!(paths, ["/clientId", "/clientSecret"]);

        let empty = render(&schema, &json!({}));
        assert!(matches!(
            empty.element,
            Element::DiscriminatedUnion { branch: None, .. }
        ));
    }

    #[test]
    fn arrays_pick_list_shape_from_element() {
        let tags = render(&Schema::array(Schema::string()), &json!(["a", 1]));
        assert!(matches!(
            &tags.element,
            Element::TagList { items, .. } if items == &["a", "1"]
        ));

        let numbers = render(
            &Schema::array(Schema::number()).with_layout(LayoutMetadata {
                item_label: Some("score".into()),
                ..LayoutMetadata::default()
            }),
            &json!([1, 2]),
        );
        let Element::PrimitiveList { add_label, items, .. } = &numbers.element else {
            panic!("expected primitive list");
        };
        assert_eq!(add_label, "Add score");
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| matches!(
            &item.element,
            Element::Field { props, .. } if props.width == Some(Width::Full)
        )));
        assert_eq!(
            items[1].handle.lens.path(),
            &DataPath::root().index(1)
        );

        let table = render(
            &Schema::array(Schema::object([("name", Schema::string())])),
            &json!([{"name": "a"}]),
        );
        let Element::Table { add_label, blank_item, rows, .. } = &table.element else {
            panic!("expected table");
        };
        assert_eq!(add_label, "Add");
        assert_eq!(blank_item, &json!({}));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn hidden_fields_are_absent() {
        let schema = Schema::object([
            ("apiKey", Schema::string()),
            (
                "token",
                Schema::string().with_layout(LayoutMetadata {
                    is_hidden: Some(HiddenRule::Flag(true)),
                    ..LayoutMetadata::default()
                }),
            ),
        ]);
        let tree = render(&schema, &json!({"token": "kept"}));
        assert_eq!(tree.leaf_count(), 1);
    }
}
