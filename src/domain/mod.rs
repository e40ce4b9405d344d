mod block;
mod layout;
mod schema;

pub use block::BlockDefinition;
pub use layout::{
    ChoiceLabels, Condition, Direction, HiddenRule, InputType, LayoutMetadata, Pattern,
};
pub use schema::{
    ArraySchema, DiscriminatedUnionSchema, EnumSchema, ObjectSchema, Schema, SchemaKind,
};
