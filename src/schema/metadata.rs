use serde_json::Value;

use crate::domain::LayoutMetadata;

use super::introspect::Effective;

/// Pure read of the attached descriptor; no defaults are computed here.
pub fn resolve_metadata<'a>(effective: &Effective<'a>) -> Option<&'a LayoutMetadata> {
    effective.layout
}

/// `null` counts as "no value".
pub(crate) fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

/// Current data, else the layout default, else the schema-level default.
pub fn initial_value(value: Option<&Value>, effective: &Effective<'_>) -> Option<Value> {
    initial_value_ref(value, effective).cloned()
}

pub fn initial_value_ref<'v>(
    value: Option<&'v Value>,
    effective: &Effective<'v>,
) -> Option<&'v Value> {
    present(value)
        .or_else(|| {
            resolve_metadata(effective).and_then(|layout| present(layout.default_value.as_ref()))
        })
        .or_else(|| present(effective.default))
}

/// The layout label, else the fallback (usually the property name), else "".
pub fn label_or(layout: Option<&LayoutMetadata>, fallback: Option<&str>) -> String {
    layout
        .and_then(|layout| layout.label.as_deref())
        .or(fallback)
        .unwrap_or_default()
        .to_string()
}

pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(num) => num.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
