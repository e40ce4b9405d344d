//! Whole-sequence helpers for list and table widgets. Each returns the
//! complete new array, ready to hand to the array's edit handle.

use serde_json::{Map, Value};

use crate::domain::{Schema, SchemaKind};
use crate::schema::{initial_value, unwrap};

/// The value a freshly added row starts with.
pub fn blank_item(schema: &Schema) -> Value {
    let effective = unwrap(schema);
    if let Some(value) = initial_value(None, &effective) {
        return value;
    }
    match effective.kind() {
        SchemaKind::Object(_) => Value::Object(Map::new()),
        SchemaKind::DiscriminatedUnion(union) => {
            let mut seeded = Map::new();
            if let Some(first) = union.branch_ids().into_iter().next() {
                seeded.insert(union.discriminator.clone(), Value::String(first));
            }
            Value::Object(seeded)
        }
        SchemaKind::Array(_) => Value::Array(Vec::new()),
        SchemaKind::String => Value::String(String::new()),
        SchemaKind::Number => Value::from(0),
        SchemaKind::Boolean => Value::Bool(false),
        SchemaKind::Enum(schema) => schema
            .values
            .first()
            .cloned()
            .map(Value::String)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn items_of(current: Option<&Value>) -> Vec<Value> {
    current
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

pub fn append_item(current: Option<&Value>, item: Value) -> Value {
    let mut items = items_of(current);
    items.push(item);
    Value::Array(items)
}

/// `None` when `index` is out of range.
pub fn remove_item(current: Option<&Value>, index: usize) -> Option<Value> {
    let mut items = items_of(current);
    if index >= items.len() {
        return None;
    }
    items.remove(index);
    Some(Value::Array(items))
}

/// Swaps the item at `index` with its neighbour `delta` steps away. `None`
/// when either end falls outside the sequence.
pub fn move_item(current: Option<&Value>, index: usize, delta: isize) -> Option<Value> {
    let mut items = items_of(current);
    let target = index.checked_add_signed(delta)?;
    if index >= items.len() || target >= items.len() {
        return None;
    }
    items.swap(index, target);
    Some(Value::Array(items))
}
