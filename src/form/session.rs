use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::domain::{BlockDefinition, Schema};

use super::{
    dispatch::FormRenderer,
    lens::DataPath,
    render::{Edit, EditHandle, RenderNode},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// The edit produced the value already stored.
    Unchanged,
    /// The position was not part of the last render, or cannot be written.
    Stale,
}

/// Owns the committed data tree and is the root sink for edits.
///
/// Only handles rendered from the current data are accepted. Every applied
/// edit starts a new generation, retiring all handles handed out before it.
#[derive(Debug, Clone)]
pub struct FormSession {
    schema: Schema,
    data: Value,
    block: Option<BlockDefinition>,
    renderer: FormRenderer,
    generation: u64,
    live: HashSet<EditHandle>,
}

impl FormSession {
    pub fn new(schema: Schema, data: Value) -> Self {
        Self {
            schema,
            data,
            block: None,
            renderer: FormRenderer::new(),
            generation: 1,
            live: HashSet::new(),
        }
    }

    pub fn with_block(mut self, block: BlockDefinition) -> Self {
        self.block = Some(block);
        self
    }

    pub fn with_renderer(mut self, renderer: FormRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn render(&mut self) -> Option<RenderNode> {
        let mut tree = self
            .renderer
            .render_root(&self.schema, &self.data, self.block.as_ref());
        if let Some(tree) = &mut tree {
            tree.stamp(self.generation);
        }
        self.live.clear();
        if let Some(tree) = &tree {
            tree.walk(&mut |node| {
                self.live.insert(node.handle.clone());
            });
        }
        tree
    }

    /// Renders and returns the outermost live handle at `path`.
    pub fn handle_at(&mut self, path: &DataPath, select_branch: bool) -> Option<EditHandle> {
        let tree = self.render()?;
        tree.handle_at(path, select_branch).cloned()
    }

    pub fn apply(&mut self, edit: &Edit) -> EditOutcome {
        let path = edit.handle.lens.path();
        if edit.handle.generation != self.generation {
            debug!(
                %path,
                generation = edit.handle.generation,
                current = self.generation,
                "edit from an earlier render dropped"
            );
            return EditOutcome::Stale;
        }
        if !self.live.contains(&edit.handle) {
            debug!(%path, "edit for a position outside the last render dropped");
            return EditOutcome::Stale;
        }
        let Some(next) = edit.commit(&self.data) else {
            debug!(%path, "edit targets an unwritable position");
            return EditOutcome::Stale;
        };
        if next == self.data {
            return EditOutcome::Unchanged;
        }
        self.data = next;
        self.generation += 1;
        self.render();
        EditOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{Condition, HiddenRule, LayoutMetadata};
    use crate::form::lens::Lens;
    use crate::form::list_ops;

    fn hidden_when_basic() -> LayoutMetadata {
        LayoutMetadata {
            is_hidden: Some(HiddenRule::When(Condition::Equals {
                field: "mode".into(),
                value: json!("basic"),
            })),
            ..LayoutMetadata::default()
        }
    }

    #[test]
    fn edits_before_any_render_are_stale() {
        let mut session = FormSession::new(Schema::object([("a", Schema::string())]), json!({}));
        let edit = EditHandle::replace(Lens::root().key("a")).edit("x");
        assert_eq!(session.apply(&edit), EditOutcome::Stale);
        assert_eq!(session.data(), &json!({}));
    }

    #[test]
    fn hiding_a_field_retires_its_handle() {
        let schema = Schema::object([
            ("mode", Schema::enumeration(["basic", "advanced"])),
            ("topP", Schema::number().with_layout(hidden_when_basic())),
        ]);
        let mut session = FormSession::new(schema, json!({"mode": "advanced", "topP": 0.5}));

        let top_p = session
            .handle_at(&DataPath::root().key("topP"), false)
            .expect("topP visible");
        let mode = session
            .handle_at(&DataPath::root().key("mode"), false)
            .expect("mode visible");

        assert_eq!(session.apply(&mode.edit("basic")), EditOutcome::Applied);
        assert_eq!(session.apply(&top_p.edit(0.9)), EditOutcome::Stale);
        assert_eq!(session.data(), &json!({"mode": "basic", "topP": 0.5}));
    }

    #[test]
    fn repeated_edit_is_unchanged() {
        let mut session = FormSession::new(Schema::object([("a", Schema::string())]), json!({}));
        let handle = session
            .handle_at(&DataPath::root().key("a"), false)
            .expect("a rendered");
        assert_eq!(session.apply(&handle.edit("x")), EditOutcome::Applied);
        let handle = session
            .handle_at(&DataPath::root().key("a"), false)
            .expect("a rendered");
        assert_eq!(session.apply(&handle.edit("x")), EditOutcome::Unchanged);
        assert_eq!(session.into_data(), json!({"a": "x"}));
    }

    #[test]
    fn handles_from_a_removed_row_do_not_reach_its_neighbour() {
        let schema = Schema::object([(
            "rows",
            Schema::array(Schema::object([("name", Schema::string())])),
        )]);
        let mut session = FormSession::new(
            schema,
            json!({"rows": [{"name": "a"}, {"name": "b"}, {"name": "c"}]}),
        );
        let b_name = session
            .handle_at(&DataPath::root().key("rows").index(1).key("name"), false)
            .expect("row b rendered");
        let rows = session
            .handle_at(&DataPath::root().key("rows"), false)
            .expect("table rendered");

        let remaining = list_ops::remove_item(session.data().get("rows"), 1).expect("in range");
        assert_eq!(session.apply(&rows.edit(remaining)), EditOutcome::Applied);
        assert_eq!(session.apply(&b_name.edit("b-edited")), EditOutcome::Stale);
        assert_eq!(
            session.data(),
            &json!({"rows": [{"name": "a"}, {"name": "c"}]})
        );
    }

    #[test]
    fn handles_built_outside_a_render_are_stale() {
        let mut session = FormSession::new(Schema::object([("a", Schema::string())]), json!({}));
        session.render();
        let forged = EditHandle::replace(Lens::root().key("a"));
        assert_eq!(session.apply(&forged.edit("x")), EditOutcome::Stale);
    }
}
