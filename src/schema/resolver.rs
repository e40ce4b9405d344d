use anyhow::{Context, Result, bail};
use percent_encoding::percent_decode_str;
use schemars::schema::{RootSchema, Schema, SchemaObject};
use serde_json::Value;

/// Resolves local `$ref`s one hop at a time. Following chains is the caller's
/// job so it can detect cycles.
#[derive(Debug)]
pub struct SchemaResolver<'a> {
    raw: &'a Value,
    root: &'a RootSchema,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(raw: &'a Value, root: &'a RootSchema) -> Self {
        Self { raw, root }
    }

    pub fn root_object(&self) -> &'a SchemaObject {
        &self.root.schema
    }

    pub fn lookup(&self, reference: &str) -> Result<Schema> {
        let Some(fragment) = reference.strip_prefix('#') else {
            bail!("unsupported reference {reference}: only local fragments are resolved");
        };
        let decoded = percent_decode_str(fragment)
            .decode_utf8()
            .context("invalid percent-encoding in $ref")?;

        if let Some(key) = decoded.strip_prefix("/definitions/")
            && let Some(target) = self.root.definitions.get(key)
        {
            return Ok(target.clone());
        }

        let pointer = if decoded.is_empty() || decoded.starts_with('/') {
            decoded.to_string()
        } else {
            format!("/{decoded}")
        };
        let target = self
            .raw
            .pointer(&pointer)
            .with_context(|| format!("reference '{reference}' not found"))?;
        serde_json::from_value(target.clone())
            .with_context(|| format!("reference '{reference}' is not a valid schema"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::loader::load_root_schema;

    #[test]
    fn resolves_definitions_and_pointers() {
        let raw = json!({
            "definitions": {"name": {"type": "string"}},
            "$defs": {"count value": {"type": "integer"}},
            "type": "object"
        });
        let root = load_root_schema(&raw).expect("root parses");
        let resolver = SchemaResolver::new(&raw, &root);

        assert!(resolver.lookup("#/definitions/name").is_ok());
        assert!(resolver.lookup("#/$defs/count%20value").is_ok());
        assert!(resolver.lookup("#/definitions/missing").is_err());
        assert!(resolver.lookup("other.json#/definitions/name").is_err());
    }
}
