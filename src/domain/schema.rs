use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use super::layout::LayoutMetadata;

/// An immutable schema node: a structural kind or a wrapper layer, plus the
/// layout metadata attached at definition time.
#[derive(Debug, Clone)]
pub struct Schema {
    pub kind: SchemaKind,
    pub layout: Option<Arc<LayoutMetadata>>,
}

#[derive(Debug, Clone)]
pub enum SchemaKind {
    Optional(Box<Schema>),
    Nullable(Box<Schema>),
    Default {
        inner: Box<Schema>,
        value: Value,
    },
    Refined {
        inner: Box<Schema>,
        description: Option<String>,
    },
    Object(ObjectSchema),
    Array(ArraySchema),
    Enum(EnumSchema),
    DiscriminatedUnion(DiscriminatedUnionSchema),
    Number,
    Union(Vec<Schema>),
    Boolean,
    String,
    Literal(Value),
    Unrecognized(String),
}

#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    pub properties: IndexMap<String, Schema>,
}

#[derive(Debug, Clone)]
pub struct ArraySchema {
    pub element: Box<Schema>,
}

#[derive(Debug, Clone)]
pub struct EnumSchema {
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DiscriminatedUnionSchema {
    pub discriminator: String,
    pub branches: Vec<ObjectSchema>,
}

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Self { kind, layout: None }
    }

    pub fn string() -> Self {
        Self::new(SchemaKind::String)
    }

    pub fn number() -> Self {
        Self::new(SchemaKind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(SchemaKind::Boolean)
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(SchemaKind::Literal(value.into()))
    }

    pub fn unrecognized(name: impl Into<String>) -> Self {
        Self::new(SchemaKind::Unrecognized(name.into()))
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(SchemaKind::Enum(EnumSchema {
            values: values.into_iter().map(Into::into).collect(),
        }))
    }

    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Self::new(SchemaKind::Object(ObjectSchema::new(properties)))
    }

    pub fn array(element: Schema) -> Self {
        Self::new(SchemaKind::Array(ArraySchema {
            element: Box::new(element),
        }))
    }

    pub fn union(members: impl IntoIterator<Item = Schema>) -> Self {
        Self::new(SchemaKind::Union(members.into_iter().collect()))
    }

    pub fn discriminated_union(
        discriminator: impl Into<String>,
        branches: impl IntoIterator<Item = ObjectSchema>,
    ) -> Self {
        Self::new(SchemaKind::DiscriminatedUnion(DiscriminatedUnionSchema {
            discriminator: discriminator.into(),
            branches: branches.into_iter().collect(),
        }))
    }

    pub fn optional(self) -> Self {
        Self::new(SchemaKind::Optional(Box::new(self)))
    }

    pub fn nullable(self) -> Self {
        Self::new(SchemaKind::Nullable(Box::new(self)))
    }

    pub fn with_default(self, value: impl Into<Value>) -> Self {
        Self::new(SchemaKind::Default {
            inner: Box::new(self),
            value: value.into(),
        })
    }

    pub fn refine(self, description: Option<String>) -> Self {
        Self::new(SchemaKind::Refined {
            inner: Box::new(self),
            description,
        })
    }

    /// Attaches layout metadata to this layer, replacing any previous attachment.
    pub fn with_layout(mut self, layout: LayoutMetadata) -> Self {
        self.layout = Some(Arc::new(layout));
        self
    }

    /// The first non-wrapper node below (or at) this one.
    pub fn peel(&self) -> &Schema {
        let mut current = self;
        while let Some(inner) = current.wrapped() {
            current = inner;
        }
        current
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            SchemaKind::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn wrapped(&self) -> Option<&Schema> {
        match &self.kind {
            SchemaKind::Optional(inner)
            | SchemaKind::Nullable(inner)
            | SchemaKind::Default { inner, .. }
            | SchemaKind::Refined { inner, .. } => Some(inner.as_ref()),
            _ => None,
        }
    }
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        Schema::new(SchemaKind::Object(object))
    }
}

impl ObjectSchema {
    pub fn new<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Self {
            properties: properties
                .into_iter()
                .map(|(key, schema)| (key.into(), schema))
                .collect(),
        }
    }

    /// The literal a property is pinned to: a `Literal` node or a single-value enum.
    pub fn literal_value(&self, key: &str) -> Option<String> {
        match &self.properties.get(key)?.peel().kind {
            SchemaKind::Literal(Value::String(text)) => Some(text.clone()),
            SchemaKind::Literal(other) => Some(other.to_string()),
            SchemaKind::Enum(schema) if schema.values.len() == 1 => schema.values.first().cloned(),
            _ => None,
        }
    }
}

impl DiscriminatedUnionSchema {
    /// Branch identifiers in declaration order. Branches that do not pin the
    /// discriminator to a literal are skipped.
    pub fn branch_ids(&self) -> Vec<String> {
        self.branches
            .iter()
            .filter_map(|branch| branch.literal_value(&self.discriminator))
            .collect()
    }

    pub fn branch(&self, id: &str) -> Option<&ObjectSchema> {
        self.branches
            .iter()
            .find(|branch| branch.literal_value(&self.discriminator).as_deref() == Some(id))
    }
}
