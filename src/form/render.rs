use std::time::Duration;

use serde_json::{Map, Value};

use crate::domain::Direction;

use super::{
    lens::{DataPath, Lens},
    markdown::HelperText,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    Full,
}

/// Props every field widget receives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldProps {
    /// Current data, else the layout default, else the schema default.
    pub value: Option<Value>,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub helper_text: Option<HelperText>,
    pub more_info_tooltip: Option<String>,
    pub is_required: bool,
    pub width: Option<Width>,
    /// `None` leaves the widget's own debounce in place.
    pub debounce: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsScope {
    Workspace,
}

impl CredentialsScope {
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialsScope::Workspace => "workspace",
        }
    }
}

/// Everything a remote-backed widget needs to run its own lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSource {
    pub fetcher: String,
    pub block_id: String,
    pub credentials_scope: CredentialsScope,
    pub options: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    VariablePicker,
    Dropdown {
        choices: Vec<Choice>,
        direction: Option<Direction>,
    },
    NumberInput {
        direction: Option<Direction>,
    },
    Switch,
    Autocomplete {
        items: Vec<String>,
        with_variable_button: bool,
    },
    RemoteAutocomplete {
        source: RemoteSource,
        with_variable_button: Option<bool>,
    },
    RemoteSelect {
        source: RemoteSource,
    },
    Textarea {
        with_variable_button: Option<bool>,
    },
    CodeEditor {
        lang: String,
        with_line_numbers: bool,
        with_variable_button: Option<bool>,
    },
    TextInput {
        masked: bool,
        with_variable_button: Option<bool>,
    },
}

impl Widget {
    pub fn name(&self) -> &'static str {
        match self {
            Widget::VariablePicker => "variable_picker",
            Widget::Dropdown { .. } => "dropdown",
            Widget::NumberInput { .. } => "number",
            Widget::Switch => "switch",
            Widget::Autocomplete { .. } => "autocomplete",
            Widget::RemoteAutocomplete { .. } => "remote_autocomplete",
            Widget::RemoteSelect { .. } => "remote_select",
            Widget::Textarea { .. } => "textarea",
            Widget::CodeEditor { .. } => "code",
            Widget::TextInput { .. } => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Field {
        widget: Widget,
        props: FieldProps,
    },
    Object {
        fields: Vec<RenderNode>,
    },
    Accordion {
        title: String,
        fields: Vec<RenderNode>,
    },
    DiscriminatedUnion {
        discriminator: String,
        selector: Box<RenderNode>,
        branch: Option<Box<RenderNode>>,
    },
    TagList {
        props: FieldProps,
        items: Vec<String>,
        merge_with_last_field: bool,
    },
    PrimitiveList {
        props: FieldProps,
        add_label: String,
        blank_item: Value,
        /// In data order. Every item shares one element schema and context,
        /// so items render all or none; each item's `handle.lens` ends in
        /// its data index.
        items: Vec<RenderNode>,
        merge_with_last_field: bool,
    },
    Table {
        props: FieldProps,
        add_label: String,
        blank_item: Value,
        is_ordered: bool,
        /// Same ordering as `PrimitiveList::items`.
        rows: Vec<RenderNode>,
    },
}

/// One rendered position: what to draw and where its edits go.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    pub handle: EditHandle,
    pub element: Element,
}

impl RenderNode {
    pub fn new(handle: EditHandle, element: Element) -> Self {
        Self { handle, element }
    }

    pub fn children(&self) -> Vec<&RenderNode> {
        match &self.element {
            Element::Field { .. } | Element::TagList { .. } => Vec::new(),
            Element::Object { fields } | Element::Accordion { fields, .. } => {
                fields.iter().collect()
            }
            Element::DiscriminatedUnion {
                selector, branch, ..
            } => std::iter::once(selector.as_ref())
                .chain(branch.as_deref())
                .collect(),
            Element::PrimitiveList { items, .. } => items.iter().collect(),
            Element::Table { rows, .. } => rows.iter().collect(),
        }
    }

    /// Pre-order traversal.
    pub fn walk<'n>(&'n self, visit: &mut impl FnMut(&'n RenderNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Field widgets and tag lists, the positions that hold a single input.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |node| {
            if matches!(
                node.element,
                Element::Field { .. } | Element::TagList { .. }
            ) {
                count += 1;
            }
        });
        count
    }

    /// First match in pre-order.
    pub fn find(&self, predicate: impl Fn(&RenderNode) -> bool) -> Option<&RenderNode> {
        let mut found = None;
        self.walk(&mut |node| {
            if found.is_none() && predicate(node) {
                found = Some(node);
            }
        });
        found
    }

    /// The outermost node bound to `path`. Union selectors are only found
    /// with `select_branch`.
    pub fn node_at(&self, path: &DataPath, select_branch: bool) -> Option<&RenderNode> {
        self.find(|node| {
            node.handle.lens.path() == path && node.handle.is_branch_selector() == select_branch
        })
    }

    pub fn handle_at(&self, path: &DataPath, select_branch: bool) -> Option<&EditHandle> {
        self.node_at(path, select_branch).map(|node| &node.handle)
    }

    /// Binds every handle in the tree to render generation `generation`.
    pub(crate) fn stamp(&mut self, generation: u64) {
        self.handle.generation = generation;
        match &mut self.element {
            Element::Field { .. } | Element::TagList { .. } => {}
            Element::Object { fields } | Element::Accordion { fields, .. } => {
                fields.iter_mut().for_each(|node| node.stamp(generation));
            }
            Element::DiscriminatedUnion {
                selector, branch, ..
            } => {
                selector.stamp(generation);
                if let Some(branch) = branch {
                    branch.stamp(generation);
                }
            }
            Element::PrimitiveList { items, .. } => {
                items.iter_mut().for_each(|node| node.stamp(generation));
            }
            Element::Table { rows, .. } => {
                rows.iter_mut().for_each(|node| node.stamp(generation));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EditMode {
    /// The edit value replaces the value at the position.
    Replace,
    /// The edit value is a branch id; the union value becomes
    /// `{ discriminator: id }`.
    SelectBranch { discriminator: String },
}

/// The change-propagation handle for one rendered position.
///
/// `generation` identifies the data version the handle was rendered from; a
/// session only accepts handles of its current generation, so a handle kept
/// across a change (a removed row, a switched branch) never lands on
/// whatever now occupies its path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EditHandle {
    pub lens: Lens,
    pub mode: EditMode,
    pub generation: u64,
}

impl EditHandle {
    pub fn replace(lens: Lens) -> Self {
        Self {
            lens,
            mode: EditMode::Replace,
            generation: 0,
        }
    }

    pub fn select_branch(lens: Lens, discriminator: impl Into<String>) -> Self {
        Self {
            lens,
            mode: EditMode::SelectBranch {
                discriminator: discriminator.into(),
            },
            generation: 0,
        }
    }

    pub fn is_branch_selector(&self) -> bool {
        matches!(self.mode, EditMode::SelectBranch { .. })
    }

    pub fn edit(&self, value: impl Into<Value>) -> Edit {
        Edit {
            handle: self.clone(),
            value: value.into(),
        }
    }
}

/// A complete new value for one position.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub handle: EditHandle,
    pub value: Value,
}

impl Edit {
    /// The new root after this edit, or `None` if the position is unwritable.
    pub fn commit(&self, root: &Value) -> Option<Value> {
        let value = match &self.handle.mode {
            EditMode::Replace => self.value.clone(),
            EditMode::SelectBranch { discriminator } => {
                let mut fresh = Map::new();
                fresh.insert(discriminator.clone(), self.value.clone());
                Value::Object(fresh)
            }
        };
        self.handle.lens.set(root, value)
    }
}
