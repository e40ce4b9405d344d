use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Layout hints attached to a schema node. Every field is optional; `None`
/// (or `false`) means the widget's own default applies.
///
/// Deserializes from the camelCase `x-layout` object of a JSON Schema.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutMetadata {
    pub label: Option<String>,
    pub placeholder: Option<String>,
    /// Markdown source, rendered by the configured markdown collaborator.
    pub helper_text: Option<String>,
    pub more_info_tooltip: Option<String>,
    pub default_value: Option<Value>,
    pub is_required: bool,
    pub is_hidden: Option<HiddenRule>,
    pub input_type: Option<InputType>,
    pub fetcher: Option<String>,
    pub allow_custom_text: bool,
    pub auto_complete_items: Option<Vec<String>>,
    pub with_variable_button: Option<bool>,
    pub is_debounce_disabled: bool,
    pub direction: Option<Direction>,
    pub item_label: Option<String>,
    pub is_ordered: bool,
    pub merge_with_last_field: bool,
    pub hidden_items: Vec<String>,
    pub to_labels: Option<ChoiceLabels>,
    pub lang: Option<String>,
    /// Title of the collapsible section this field is grouped into.
    pub accordion: Option<String>,
}

impl LayoutMetadata {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputType {
    Text,
    Textarea,
    Code,
    Password,
    VariableDropdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Row,
    Column,
}

type LabelFn = dyn Fn(&str) -> String + Send + Sync;
type PredicateFn = dyn Fn(&Value) -> bool + Send + Sync;

/// Relabels enum choices for display.
#[derive(Clone)]
pub enum ChoiceLabels {
    Map(IndexMap<String, String>),
    Custom(Arc<LabelFn>),
}

impl ChoiceLabels {
    pub fn custom(label: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        ChoiceLabels::Custom(Arc::new(label))
    }

    /// Values missing from a label map keep their raw text.
    pub fn label_for(&self, value: &str) -> String {
        match self {
            ChoiceLabels::Map(labels) => labels
                .get(value)
                .cloned()
                .unwrap_or_else(|| value.to_string()),
            ChoiceLabels::Custom(label) => label(value),
        }
    }
}

impl fmt::Debug for ChoiceLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceLabels::Map(labels) => f.debug_tuple("Map").field(labels).finish(),
            ChoiceLabels::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for ChoiceLabels {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IndexMap::<String, String>::deserialize(deserializer).map(ChoiceLabels::Map)
    }
}

/// Decides whether a field is hidden, given the full sibling option set.
#[derive(Clone)]
pub enum HiddenRule {
    Flag(bool),
    When(Condition),
    Predicate(Arc<PredicateFn>),
}

impl HiddenRule {
    /// The predicate must be deterministic and free of side effects.
    pub fn predicate(predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        HiddenRule::Predicate(Arc::new(predicate))
    }
}

impl fmt::Debug for HiddenRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HiddenRule::Flag(flag) => f.debug_tuple("Flag").field(flag).finish(),
            HiddenRule::When(condition) => f.debug_tuple("When").field(condition).finish(),
            HiddenRule::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for HiddenRule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            When(Condition),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Flag(flag) => HiddenRule::Flag(flag),
            Raw::When(condition) => HiddenRule::When(condition),
        })
    }
}

/// Declarative predicate over sibling options. `field` is a top-level key, or
/// a JSON pointer when it starts with `/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    Equals { field: String, value: Value },
    NotEquals { field: String, value: Value },
    In { field: String, values: Vec<Value> },
    Matches { field: String, pattern: Pattern },
    IsEmpty { field: String },
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Pattern)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Pattern::new(&raw).map_err(serde::de::Error::custom)
    }
}
