use serde_json::Value;

use crate::domain::{LayoutMetadata, Schema, SchemaKind};

/// The closed set of shapes the renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Object,
    Array,
    Enum,
    DiscriminatedUnion,
    Number,
    Union,
    Boolean,
    String,
    Unrecognized,
}

/// A schema with its wrapper layers peeled off.
#[derive(Debug, Clone, Copy)]
pub struct Effective<'a> {
    pub node: &'a Schema,
    /// The outermost layout attachment along the wrapper chain.
    pub layout: Option<&'a LayoutMetadata>,
    /// The outermost schema-level default along the wrapper chain.
    pub default: Option<&'a Value>,
}

impl<'a> Effective<'a> {
    pub fn kind(&self) -> &'a SchemaKind {
        &self.node.kind
    }

    pub fn tag(&self) -> TypeTag {
        tag_of(self.kind())
    }
}

/// Peels optional, nullable, default and refinement layers. The input is
/// never modified and the walk always terminates because the tree owns its
/// children.
pub fn unwrap(schema: &Schema) -> Effective<'_> {
    let mut current = schema;
    let mut layout = schema.layout.as_deref();
    let mut default = None;
    loop {
        let next: &Schema = match &current.kind {
            SchemaKind::Optional(inner)
            | SchemaKind::Nullable(inner)
            | SchemaKind::Refined { inner, .. } => inner.as_ref(),
            SchemaKind::Default { inner, value } => {
                default.get_or_insert(value);
                inner.as_ref()
            }
            _ => break,
        };
        current = next;
        if layout.is_none() {
            layout = current.layout.as_deref();
        }
    }
    Effective {
        node: current,
        layout,
        default,
    }
}

pub fn classify(schema: &Schema) -> TypeTag {
    unwrap(schema).tag()
}

fn tag_of(kind: &SchemaKind) -> TypeTag {
    match kind {
        SchemaKind::Optional(inner)
        | SchemaKind::Nullable(inner)
        | SchemaKind::Default { inner, .. }
        | SchemaKind::Refined { inner, .. } => tag_of(&inner.kind),
        SchemaKind::Object(_) => TypeTag::Object,
        SchemaKind::Array(_) => TypeTag::Array,
        SchemaKind::Enum(_) => TypeTag::Enum,
        SchemaKind::DiscriminatedUnion(_) => TypeTag::DiscriminatedUnion,
        SchemaKind::Number => TypeTag::Number,
        SchemaKind::Union(_) => TypeTag::Union,
        SchemaKind::Boolean => TypeTag::Boolean,
        SchemaKind::String => TypeTag::String,
        SchemaKind::Literal(_) | SchemaKind::Unrecognized(_) => TypeTag::Unrecognized,
    }
}
