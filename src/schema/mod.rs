mod introspect;
mod loader;
mod metadata;
mod resolver;
mod visibility;

pub use introspect::{Effective, TypeTag, classify, unwrap};
pub use loader::{DISCRIMINATOR_KEYWORD, LAYOUT_KEYWORD, load_schema};
pub use metadata::{initial_value, initial_value_ref, label_or, resolve_metadata, value_to_string};
pub use visibility::{evaluate, is_visible};

pub(crate) use metadata::present;
