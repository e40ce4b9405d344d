use serde_json::Value;

use crate::domain::BlockDefinition;

use super::render::Width;

pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Renders deeper than this produce nothing and log a warning.
    pub max_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl RenderOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Per-position context, rebuilt on every render pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    pub block: Option<&'a BlockDefinition>,
    /// The full option set hidden rules and remote widgets read from.
    pub options: Option<&'a Value>,
    pub width: Option<Width>,
    pub in_accordion: bool,
    pub prop_name: Option<&'a str>,
    pub depth: usize,
}

impl<'a> RenderContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(mut self, block: Option<&'a BlockDefinition>) -> Self {
        self.block = block;
        self
    }

    pub fn with_options(mut self, options: Option<&'a Value>) -> Self {
        self.options = options;
        self
    }

    pub fn with_width(mut self, width: Option<Width>) -> Self {
        self.width = width;
        self
    }

    /// Context for an object property.
    pub(crate) fn field(self, name: &'a str) -> Self {
        Self {
            prop_name: Some(name),
            width: None,
            depth: self.depth + 1,
            ..self
        }
    }

    /// Context for an array item or union branch.
    pub(crate) fn nested(self, width: Option<Width>) -> Self {
        Self {
            prop_name: None,
            width,
            depth: self.depth + 1,
            ..self
        }
    }

    pub(crate) fn accordion(self) -> Self {
        Self {
            in_accordion: true,
            ..self
        }
    }
}
