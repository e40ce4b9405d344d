use serde_json::{Map, Value, json};

use crate::domain::Direction;

use super::render::{Choice, EditMode, Element, FieldProps, RenderNode, Widget, Width};

/// Converts a render tree into the JSON UI blueprint.
///
/// Every node carries its `pointer` so a renderer can address edits back to
/// the data tree without holding on to the Rust handles.
pub fn render_blueprint(node: &RenderNode) -> Value {
    let mut base = match element_blueprint(&node.element) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    base.insert(
        "pointer".into(),
        Value::String(node.handle.lens.path().to_pointer()),
    );
    if let EditMode::SelectBranch { discriminator } = &node.handle.mode {
        base.insert("selects".into(), Value::String(discriminator.clone()));
    }
    Value::Object(base)
}

fn element_blueprint(element: &Element) -> Value {
    match element {
        Element::Field { widget, props } => {
            let mut base = props_blueprint(props);
            if let Value::Object(widget) = widget_blueprint(widget) {
                base.extend(widget);
            }
            Value::Object(base)
        }
        Element::Object { fields } => json!({
            "component": "object",
            "fields": blueprints(fields),
        }),
        Element::Accordion { title, fields } => json!({
            "component": "accordion",
            "title": title,
            "fields": blueprints(fields),
        }),
        Element::DiscriminatedUnion {
            discriminator,
            selector,
            branch,
        } => json!({
            "component": "discriminated_union",
            "discriminator": discriminator,
            "selector": render_blueprint(selector),
            "branch": branch.as_deref().map(render_blueprint),
        }),
        Element::TagList {
            props,
            items,
            merge_with_last_field,
        } => {
            let mut base = props_blueprint(props);
            base.insert("component".into(), json!("tags"));
            base.insert("items".into(), json!(items));
            base.insert("merge_with_last_field".into(), json!(merge_with_last_field));
            Value::Object(base)
        }
        Element::PrimitiveList {
            props,
            add_label,
            blank_item,
            items,
            merge_with_last_field,
        } => {
            let mut base = props_blueprint(props);
            base.insert("component".into(), json!("primitive_list"));
            base.insert("add_label".into(), json!(add_label));
            base.insert("blank_item".into(), blank_item.clone());
            base.insert("items".into(), Value::Array(blueprints(items)));
            base.insert("merge_with_last_field".into(), json!(merge_with_last_field));
            Value::Object(base)
        }
        Element::Table {
            props,
            add_label,
            blank_item,
            is_ordered,
            rows,
        } => {
            let mut base = props_blueprint(props);
            base.insert("component".into(), json!("table"));
            base.insert("add_label".into(), json!(add_label));
            base.insert("blank_item".into(), blank_item.clone());
            base.insert("is_ordered".into(), json!(is_ordered));
            base.insert("rows".into(), Value::Array(blueprints(rows)));
            Value::Object(base)
        }
    }
}

fn blueprints(nodes: &[RenderNode]) -> Vec<Value> {
    nodes.iter().map(render_blueprint).collect()
}

fn props_blueprint(props: &FieldProps) -> Map<String, Value> {
    let mut base = Map::new();
    if let Some(value) = &props.value {
        base.insert("value".into(), value.clone());
    }
    if let Some(label) = &props.label {
        base.insert("label".into(), Value::String(label.clone()));
    }
    if let Some(placeholder) = &props.placeholder {
        base.insert("placeholder".into(), Value::String(placeholder.clone()));
    }
    if let Some(helper) = &props.helper_text {
        base.insert("helper_text".into(), Value::String(helper.to_string()));
    }
    if let Some(tooltip) = &props.more_info_tooltip {
        base.insert("more_info_tooltip".into(), Value::String(tooltip.clone()));
    }
    if props.is_required {
        base.insert("required".into(), Value::Bool(true));
    }
    if let Some(Width::Full) = props.width {
        base.insert("width".into(), json!("full"));
    }
    if let Some(debounce) = props.debounce {
        base.insert("debounce_ms".into(), json!(debounce.as_millis() as u64));
    }
    base
}

fn widget_blueprint(widget: &Widget) -> Value {
    let component = widget.name();
    match widget {
        Widget::VariablePicker | Widget::Switch => json!({"component": component}),
        Widget::Dropdown { choices, direction } => json!({
            "component": component,
            "choices": choices.iter().map(choice_blueprint).collect::<Vec<_>>(),
            "direction": direction.map(direction_name),
        }),
        Widget::NumberInput { direction } => json!({
            "component": component,
            "direction": direction.map(direction_name),
        }),
        Widget::Autocomplete {
            items,
            with_variable_button,
        } => json!({
            "component": component,
            "items": items,
            "with_variable_button": with_variable_button,
        }),
        Widget::RemoteAutocomplete {
            source,
            with_variable_button,
        } => json!({
            "component": component,
            "fetcher": source.fetcher,
            "block_id": source.block_id,
            "credentials_scope": source.credentials_scope.as_str(),
            "with_variable_button": with_variable_button,
        }),
        Widget::RemoteSelect { source } => json!({
            "component": component,
            "fetcher": source.fetcher,
            "block_id": source.block_id,
            "credentials_scope": source.credentials_scope.as_str(),
        }),
        Widget::Textarea {
            with_variable_button,
        } => json!({
            "component": component,
            "with_variable_button": with_variable_button,
        }),
        Widget::CodeEditor {
            lang,
            with_line_numbers,
            with_variable_button,
        } => json!({
            "component": component,
            "lang": lang,
            "with_line_numbers": with_line_numbers,
            "with_variable_button": with_variable_button,
        }),
        Widget::TextInput {
            masked,
            with_variable_button,
        } => json!({
            "component": component,
            "masked": masked,
            "with_variable_button": with_variable_button,
        }),
    }
}

fn choice_blueprint(choice: &Choice) -> Value {
    json!({"value": choice.value, "label": choice.label})
}

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Row => "row",
        Direction::Column => "column",
    }
}
