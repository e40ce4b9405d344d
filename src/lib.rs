#![deny(rust_2018_idioms)]
//! Schema-driven form rendering.
//!
//! A [`Schema`] tree (built in code or loaded from JSON Schema with
//! [`load_schema`]) plus the current data renders into a [`RenderNode`] tree
//! describing which widget to draw at every position. Edits flow back through
//! the [`EditHandle`] attached to each node and are committed by a
//! [`FormSession`].

mod domain;
mod form;
mod io;
mod schema;

pub use domain::{
    ArraySchema, BlockDefinition, ChoiceLabels, Condition, Direction, DiscriminatedUnionSchema,
    EnumSchema, HiddenRule, InputType, LayoutMetadata, ObjectSchema, Pattern, Schema, SchemaKind,
};
pub use form::{
    Choice, CredentialsScope, DEFAULT_CODE_LANG, DEFAULT_MAX_DEPTH, DataPath, Edit, EditHandle,
    EditMode, EditOutcome, Element, FieldProps, FormRenderer, FormSession, HelperText, Lens,
    MarkdownRenderer, PathSegment, PlainMarkdown, RemoteSource, RenderContext, RenderNode,
    RenderOptions, Widget, Width, enum_choices, list_ops, render_blueprint,
};
pub use io::{
    DocumentFormat, OutputDestination, OutputOptions, emit, parse_document_any,
    parse_document_str, parse_typed, serialize_document,
};
pub use schema::{
    DISCRIMINATOR_KEYWORD, Effective, LAYOUT_KEYWORD, TypeTag, classify, evaluate,
    initial_value, initial_value_ref, is_visible, label_or, load_schema, resolve_metadata,
    unwrap, value_to_string,
};

pub mod prelude {
    pub use super::{
        BlockDefinition, EditOutcome, FormRenderer, FormSession, LayoutMetadata, RenderNode,
        Schema, load_schema, render_blueprint,
    };
}
