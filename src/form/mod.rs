mod blueprint;
mod container;
mod context;
mod dispatch;
mod leaf;
mod lens;
mod markdown;
mod render;
mod session;

pub mod list_ops;

pub use blueprint::render_blueprint;
pub use context::{DEFAULT_MAX_DEPTH, RenderContext, RenderOptions};
pub use dispatch::FormRenderer;
pub use leaf::{DEFAULT_CODE_LANG, enum_choices};
pub use lens::{DataPath, Lens, PathSegment};
pub use markdown::{HelperText, MarkdownRenderer, PlainMarkdown};
pub use render::{
    Choice, CredentialsScope, Edit, EditHandle, EditMode, Element, FieldProps, RemoteSource,
    RenderNode, Widget, Width,
};
pub use session::{EditOutcome, FormSession};
