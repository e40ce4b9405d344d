use serde_json::Value;

use crate::domain::{Condition, HiddenRule};

/// Evaluates a hidden rule against the full sibling option set. No rule means
/// visible; a missing option set is evaluated as `null`.
pub fn is_visible(rule: Option<&HiddenRule>, options: Option<&Value>) -> bool {
    let Some(rule) = rule else {
        return true;
    };
    let options = options.unwrap_or(&Value::Null);
    !is_hidden(rule, options)
}

fn is_hidden(rule: &HiddenRule, options: &Value) -> bool {
    match rule {
        HiddenRule::Flag(hidden) => *hidden,
        HiddenRule::When(condition) => evaluate(condition, options),
        HiddenRule::Predicate(predicate) => predicate(options),
    }
}

pub fn evaluate(condition: &Condition, options: &Value) -> bool {
    match condition {
        Condition::Equals { field, value } => lookup(options, field) == Some(value),
        Condition::NotEquals { field, value } => lookup(options, field) != Some(value),
        Condition::In { field, values } => {
            lookup(options, field).is_some_and(|current| values.contains(current))
        }
        Condition::Matches { field, pattern } => lookup(options, field)
            .and_then(Value::as_str)
            .is_some_and(|text| pattern.is_match(text)),
        Condition::IsEmpty { field } => lookup(options, field).is_none_or(is_empty),
        Condition::All(conditions) => conditions.iter().all(|inner| evaluate(inner, options)),
        Condition::Any(conditions) => conditions.iter().any(|inner| evaluate(inner, options)),
        Condition::Not(inner) => !evaluate(inner, options),
    }
}

fn lookup<'a>(options: &'a Value, field: &str) -> Option<&'a Value> {
    let found = if field.starts_with('/') {
        options.pointer(field)
    } else {
        options.get(field)
    };
    found.filter(|value| !value.is_null())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
