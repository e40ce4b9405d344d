use anyhow::{Context, Result};
use indexmap::IndexMap;
use schemars::schema::{
    InstanceType, RootSchema, Schema as RawSchema, SchemaObject, SingleOrVec,
};
use serde_json::Value;
use tracing::debug;

use crate::domain::{LayoutMetadata, ObjectSchema, Schema, SchemaKind};

use super::resolver::SchemaResolver;

/// Extension keyword carrying the camelCase layout object.
pub const LAYOUT_KEYWORD: &str = "x-layout";
pub const DISCRIMINATOR_KEYWORD: &str = "x-discriminator";

/// Deserialize a JSON value into a `RootSchema`.
pub fn load_root_schema(value: &Value) -> Result<RootSchema> {
    serde_json::from_value(value.clone()).context("schema is not a valid JSON Schema document")
}

/// Converts a JSON Schema document into the schema model.
///
/// Local `$ref`s are followed; a reference that is already being expanded
/// loads as an unrecognized node. `title` and `description` fill in the
/// label and helper text when `x-layout` leaves them out.
pub fn load_schema(value: &Value) -> Result<Schema> {
    let root = load_root_schema(value)?;
    let resolver = SchemaResolver::new(value, &root);
    let mut builder = SchemaBuilder {
        resolver: &resolver,
        active_refs: Vec::new(),
    };
    builder.build_object(resolver.root_object())
}

struct SchemaBuilder<'r, 'a> {
    resolver: &'r SchemaResolver<'a>,
    active_refs: Vec<String>,
}

impl SchemaBuilder<'_, '_> {
    fn build(&mut self, schema: &RawSchema) -> Result<Schema> {
        match schema {
            RawSchema::Bool(_) => Ok(Schema::unrecognized("boolean schema")),
            RawSchema::Object(object) => self.build_object(object),
        }
    }

    fn build_object(&mut self, object: &SchemaObject) -> Result<Schema> {
        if let Some(reference) = &object.reference {
            if self.active_refs.contains(reference) {
                debug!(%reference, "recursive reference loaded as unrecognized");
                return Ok(Schema::unrecognized(format!("recursive {reference}")));
            }
            let target = self.resolver.lookup(reference)?;
            self.active_refs.push(reference.clone());
            let resolved = self.build(&target);
            self.active_refs.pop();
            return decorate(object, resolved?);
        }

        let structural = self.structural(object)?;
        decorate(object, structural)
    }

    fn structural(&mut self, object: &SchemaObject) -> Result<Schema> {
        if let Some(value) = &object.const_value {
            return Ok(Schema::literal(value.clone()));
        }
        if let Some(values) = &object.enum_values {
            return Ok(enumeration(values));
        }
        if let Some(subschemas) = object.subschemas.as_deref() {
            if let Some(members) = subschemas.one_of.as_ref().or(subschemas.any_of.as_ref()) {
                return self.union(object, members);
            }
            if let Some(all_of) = &subschemas.all_of {
                return match all_of.as_slice() {
                    [single] => Ok(self.build(single)?.refine(None)),
                    _ => Ok(Schema::unrecognized("allOf")),
                };
            }
        }

        match instance_type(object) {
            Some(InstanceType::String) => Ok(Schema::string()),
            Some(InstanceType::Number | InstanceType::Integer) => Ok(Schema::number()),
            Some(InstanceType::Boolean) => Ok(Schema::boolean()),
            Some(InstanceType::Object) => self.object(object).map(Schema::from),
            Some(InstanceType::Array) => self.array(object),
            Some(InstanceType::Null) => Ok(Schema::unrecognized("null")),
            None if object.object.is_some() => self.object(object).map(Schema::from),
            None if object.array.is_some() => self.array(object),
            None => Ok(Schema::string()),
        }
    }

    fn object(&mut self, object: &SchemaObject) -> Result<ObjectSchema> {
        let Some(validation) = object.object.as_deref() else {
            return Ok(ObjectSchema::default());
        };
        let mut properties = IndexMap::new();
        for (name, raw) in &validation.properties {
            let schema = self
                .build(raw)
                .with_context(|| format!("failed to load property '{name}'"))?;
            let schema = if validation.required.contains(name) {
                schema
            } else {
                schema.optional()
            };
            properties.insert(name.clone(), schema);
        }
        Ok(ObjectSchema { properties })
    }

    fn array(&mut self, object: &SchemaObject) -> Result<Schema> {
        let items = object.array.as_deref().and_then(|array| array.items.as_ref());
        let element = match items {
            Some(SingleOrVec::Single(schema)) => self.build(schema)?,
            Some(SingleOrVec::Vec(list)) => match list.first() {
                Some(first) => self.build(first)?,
                None => Schema::unrecognized("empty tuple"),
            },
            None => Schema::unrecognized("untyped items"),
        };
        Ok(Schema::array(element))
    }

    /// `null` members make the union nullable. A single remaining member
    /// stands on its own; several either form a discriminated union or, when
    /// they are all numbers and booleans, a plain union.
    fn union(&mut self, owner: &SchemaObject, members: &[RawSchema]) -> Result<Schema> {
        let (nulls, members): (Vec<&RawSchema>, Vec<&RawSchema>) =
            members.iter().partition(|member| is_null_member(member));
        let nullable = !nulls.is_empty();
        let mut built = members
            .into_iter()
            .map(|member| self.build(member))
            .collect::<Result<Vec<_>>>()?;

        let schema = if built.len() == 1 {
            built.remove(0)
        } else {
            self.combine(owner, built)
        };
        Ok(if nullable { schema.nullable() } else { schema })
    }

    fn combine(&self, owner: &SchemaObject, built: Vec<Schema>) -> Schema {
        let branches = built
            .iter()
            .map(|member| member.peel().as_object().cloned())
            .collect::<Option<Vec<_>>>();
        if let Some(branches) = branches
            && !branches.is_empty()
            && let Some(discriminator) = discriminator(owner, &branches)
        {
            return Schema::discriminated_union(discriminator, branches);
        }
        let scalar = !built.is_empty()
            && built.iter().all(|member| {
                matches!(
                    member.peel().kind,
                    SchemaKind::Number | SchemaKind::Boolean
                )
            });
        if scalar {
            Schema::union(built)
        } else {
            debug!(members = built.len(), "union of mixed members loaded as unrecognized");
            Schema::unrecognized("union")
        }
    }
}

fn is_null_member(member: &RawSchema) -> bool {
    match member {
        RawSchema::Object(object) => matches!(
            object.instance_type.as_ref(),
            Some(SingleOrVec::Single(kind)) if **kind == InstanceType::Null
        ),
        RawSchema::Bool(_) => false,
    }
}

/// String values make a dropdown. Numeric enums load as plain numbers so
/// edits keep their type; anything else is unrecognized.
fn enumeration(values: &[Value]) -> Schema {
    let values: Vec<&Value> = values.iter().filter(|value| !value.is_null()).collect();
    if values.iter().all(|value| value.is_string()) {
        return Schema::enumeration(values.into_iter().filter_map(Value::as_str));
    }
    if values.iter().all(|value| value.is_number()) {
        return Schema::number();
    }
    Schema::unrecognized("non-string enum")
}

/// Explicit `x-discriminator` or OpenAPI `discriminator.propertyName`, else
/// the first property every branch pins to a distinct literal.
fn discriminator(owner: &SchemaObject, branches: &[ObjectSchema]) -> Option<String> {
    let explicit = owner
        .extensions
        .get(DISCRIMINATOR_KEYWORD)
        .and_then(Value::as_str)
        .or_else(|| {
            owner
                .extensions
                .get("discriminator")
                .and_then(|raw| raw.get("propertyName"))
                .and_then(Value::as_str)
        });
    if let Some(name) = explicit {
        return Some(name.to_string());
    }

    let first = branches.first()?;
    first
        .properties
        .keys()
        .find(|key| {
            let mut seen = Vec::with_capacity(branches.len());
            branches.iter().all(|branch| match branch.literal_value(key) {
                Some(literal) if !seen.contains(&literal) => {
                    seen.push(literal);
                    true
                }
                _ => false,
            })
        })
        .cloned()
}

fn decorate(object: &SchemaObject, mut schema: Schema) -> Result<Schema> {
    if let Some(default) = object
        .metadata
        .as_deref()
        .and_then(|metadata| metadata.default.clone())
    {
        schema = schema.with_default(default);
    }
    if is_nullable(object) {
        schema = schema.nullable();
    }
    if let Some(layout) = layout_for(object)? {
        schema = schema.with_layout(layout);
    }
    Ok(schema)
}

fn layout_for(object: &SchemaObject) -> Result<Option<LayoutMetadata>> {
    let explicit = object.extensions.get(LAYOUT_KEYWORD);
    let title = object.metadata.as_deref().and_then(|m| m.title.clone());
    let description = object
        .metadata
        .as_deref()
        .and_then(|m| m.description.clone());
    if explicit.is_none() && title.is_none() && description.is_none() {
        return Ok(None);
    }

    let mut layout = match explicit {
        Some(raw) => serde_json::from_value::<LayoutMetadata>(raw.clone())
            .context("invalid x-layout metadata")?,
        None => LayoutMetadata::default(),
    };
    if layout.label.is_none() {
        layout.label = title;
    }
    if layout.helper_text.is_none() {
        layout.helper_text = description;
    }
    Ok(Some(layout))
}

fn is_nullable(object: &SchemaObject) -> bool {
    let typed_null = match object.instance_type.as_ref() {
        Some(SingleOrVec::Vec(items)) => {
            items.len() > 1 && items.contains(&InstanceType::Null)
        }
        _ => false,
    };
    let enum_null = object
        .enum_values
        .as_ref()
        .is_some_and(|values| values.len() > 1 && values.iter().any(Value::is_null));
    typed_null || enum_null
}

fn instance_type(schema: &SchemaObject) -> Option<InstanceType> {
    schema.instance_type.as_ref().and_then(|kind| match kind {
        SingleOrVec::Single(single) => Some(**single),
        SingleOrVec::Vec(items) => items
            .iter()
            .copied()
            .find(|item| *item != InstanceType::Null),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::InputType;
    use crate::form::{DataPath, EditOutcome, Element, FormRenderer, FormSession, Widget};
    use crate::schema::{TypeTag, classify, unwrap};

    fn property<'a>(schema: &'a Schema, name: &str) -> &'a Schema {
        schema
            .peel()
            .as_object()
            .and_then(|object| object.properties.get(name))
            .unwrap_or_else(|| panic!("property {name} missing"))
    }

    #[test]
    fn optional_properties_and_layout_fallbacks() {
        let schema = load_schema(&json!({
            "type": "object",
            "required": ["model"],
            "properties": {
                "model": {
                    "type": "string",
                    "title": "Model",
                    "description": "Which *model* to call",
                    "x-layout": {"fetcher": "fetchModels", "placeholder": "gpt-4o"}
                },
                "temperature": {"type": ["number", "null"], "default": 1}
            }
        }))
        .expect("schema loads");

        let model = property(&schema, "model");
        assert!(matches!(model.kind, SchemaKind::String));
        let layout = unwrap(model).layout.expect("model layout");
        assert_eq!(layout.label.as_deref(), Some("Model"));
        assert_eq!(layout.helper_text.as_deref(), Some("Which *model* to call"));
        assert_eq!(layout.fetcher.as_deref(), Some("fetchModels"));

        let temperature = property(&schema, "temperature");
        assert!(matches!(temperature.kind, SchemaKind::Optional(_)));
        let effective = unwrap(temperature);
        assert_eq!(effective.tag(), TypeTag::Number);
        assert_eq!(effective.default, Some(&json!(1)));
    }

    #[test]
    fn one_of_with_const_discriminant_becomes_discriminated_union() {
        let schema = load_schema(&json!({
            "type": "object",
            "properties": {
                "auth": {
                    "oneOf": [
                        {
                            "type": "object",
                            "required": ["authType"],
                            "properties": {
                                "authType": {"const": "apiKey"},
                                "apiKey": {"type": "string", "x-layout": {"inputType": "password"}}
                            }
                        },
                        {
                            "type": "object",
                            "required": ["authType"],
                            "properties": {
                                "authType": {"enum": ["oauth"]},
                                "clientId": {"type": "string"}
                            }
                        }
                    ]
                }
            }
        }))
        .expect("schema loads");

        let auth = property(&schema, "auth");
        let SchemaKind::DiscriminatedUnion(union) = &auth.peel().kind else {
            panic!("expected discriminated union, got {:?}", auth.peel().kind);
        };
        assert_eq!(union.discriminator, "authType");
        assert_eq!(union.branch_ids(), vec!["apiKey", "oauth"]);
        let api_key = union
            .branch("apiKey")
            .and_then(|branch| branch.properties.get("apiKey"))
            .expect("apiKey property");
        assert_eq!(
            unwrap(api_key).layout.and_then(|layout| layout.input_type),
            Some(InputType::Password)
        );
    }

    #[test]
    fn only_numeric_unions_stay_plain_unions() {
        let toggle = load_schema(&json!({
            "anyOf": [{"type": "number"}, {"type": "boolean"}]
        }))
        .expect("schema loads");
        assert_eq!(classify(&toggle), TypeTag::Union);

        let mixed = load_schema(&json!({
            "anyOf": [{"type": "number"}, {"type": "string"}]
        }))
        .expect("schema loads");
        assert_eq!(classify(&mixed), TypeTag::Unrecognized);
    }

    #[test]
    fn optional_reference_unwraps_to_nullable_member() {
        let schema = load_schema(&json!({
            "definitions": {
                "Creds": {"type": "object", "properties": {"user": {"type": "string"}}}
            },
            "type": "object",
            "properties": {
                "creds": {"anyOf": [{"$ref": "#/definitions/Creds"}, {"type": "null"}]}
            }
        }))
        .expect("schema loads");

        let creds = property(&schema, "creds");
        assert_eq!(classify(creds), TypeTag::Object);
        let SchemaKind::Optional(inner) = &creds.kind else {
            panic!("creds is not required");
        };
        assert!(matches!(inner.kind, SchemaKind::Nullable(_)));

        let tree = FormRenderer::new()
            .render_root(&schema, &json!({"creds": {"user": "u"}}), None)
            .expect("renders");
        let user = tree
            .node_at(&DataPath::root().key("creds").key("user"), false)
            .expect("object rendered field by field");
        assert!(matches!(user.element, Element::Field { widget: Widget::TextInput { .. }, .. }));
    }

    #[test]
    fn enums_keep_their_value_type() {
        let schema = load_schema(&json!({
            "type": "object",
            "properties": {
                "level": {"type": "integer", "enum": [1, 2, 3]},
                "mode": {"type": "string", "enum": ["fast", "slow", null]},
                "mixed": {"enum": ["a", 1]}
            }
        }))
        .expect("schema loads");

        assert_eq!(classify(property(&schema, "level")), TypeTag::Number);
        assert_eq!(classify(property(&schema, "mode")), TypeTag::Enum);
        assert_eq!(classify(property(&schema, "mixed")), TypeTag::Unrecognized);

        let mut session = FormSession::new(schema, json!({"level": 1}));
        let level = session
            .handle_at(&DataPath::root().key("level"), false)
            .expect("level rendered");
        assert_eq!(session.apply(&level.edit(2)), EditOutcome::Applied);
        assert_eq!(session.data(), &json!({"level": 2}));
    }

    #[test]
    fn recursive_references_terminate() {
        let schema = load_schema(&json!({
            "definitions": {
                "node": {
                    "type": "object",
                    "properties": {
                        "label": {"type": "string"},
                        "children": {"type": "array", "items": {"$ref": "#/definitions/node"}}
                    }
                }
            },
            "$ref": "#/definitions/node"
        }))
        .expect("schema loads");

        let children = property(&schema, "children");
        let SchemaKind::Array(array) = &children.peel().kind else {
            panic!("children should be an array");
        };
        assert_eq!(classify(&array.element), TypeTag::Unrecognized);
    }

    #[test]
    fn invalid_layout_is_reported_with_context() {
        let err = load_schema(&json!({
            "type": "object",
            "properties": {
                "mode": {"type": "string", "x-layout": {"inputType": "slider"}}
            }
        }))
        .expect_err("unknown input type");
        let chain = format!("{err:#}");
        assert!(chain.contains("mode"), "{chain}");
        assert!(chain.contains("x-layout"), "{chain}");
    }
}
