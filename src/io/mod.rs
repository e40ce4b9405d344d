mod format;
mod input;
mod output;

pub use format::DocumentFormat;
pub use input::{parse_document_any, parse_document_str, parse_typed};
pub use output::{OutputDestination, OutputOptions, emit, serialize_document};
