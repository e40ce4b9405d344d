use serde::{Deserialize, Serialize};

/// The enclosing configurable unit. Fetcher-backed fields need one to scope
/// their remote lookups; without it they render nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockDefinition {
    pub id: String,
    pub name: String,
    /// Fetcher ids the block declares. An empty list accepts every fetcher.
    pub fetchers: Vec<String>,
}

impl BlockDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_fetchers<I, S>(mut self, fetchers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetchers = fetchers.into_iter().map(Into::into).collect();
        self
    }

    pub fn declares_fetcher(&self, fetcher: &str) -> bool {
        self.fetchers.is_empty() || self.fetchers.iter().any(|id| id == fetcher)
    }
}
