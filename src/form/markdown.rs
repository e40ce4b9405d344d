use std::fmt;

/// Helper text after it went through a [`MarkdownRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperText(String);

impl HelperText {
    pub fn new(rendered: impl Into<String>) -> Self {
        Self(rendered.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HelperText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns helper-text markdown into whatever the widget layer displays.
pub trait MarkdownRenderer: Send + Sync + fmt::Debug {
    fn render(&self, source: &str) -> HelperText;
}

/// Passes the markdown source through untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainMarkdown;

impl MarkdownRenderer for PlainMarkdown {
    fn render(&self, source: &str) -> HelperText {
        HelperText::new(source)
    }
}
