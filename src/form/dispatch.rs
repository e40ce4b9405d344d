use std::sync::Arc;

use serde_json::Value;
use tracing::{trace, warn};

use crate::domain::{BlockDefinition, InputType, Schema, SchemaKind};
use crate::schema::{initial_value, initial_value_ref, is_visible, resolve_metadata, unwrap};

use super::{
    context::{RenderContext, RenderOptions},
    lens::Lens,
    markdown::{MarkdownRenderer, PlainMarkdown},
    render::{EditHandle, Element, RenderNode, Widget},
};

/// Turns a schema plus data into a render tree.
///
/// Rendering is a pure function of its inputs; nothing is cached between
/// passes.
#[derive(Debug, Clone)]
pub struct FormRenderer {
    options: RenderOptions,
    pub(super) markdown: Arc<dyn MarkdownRenderer>,
}

impl Default for FormRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl FormRenderer {
    pub fn new() -> Self {
        Self {
            options: RenderOptions::default(),
            markdown: Arc::new(PlainMarkdown),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_markdown(mut self, markdown: impl MarkdownRenderer + 'static) -> Self {
        self.markdown = Arc::new(markdown);
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Renders the whole tree; `data` doubles as the option set hidden rules
    /// are evaluated against.
    pub fn render_root(
        &self,
        schema: &Schema,
        data: &Value,
        block: Option<&BlockDefinition>,
    ) -> Option<RenderNode> {
        let ctx = RenderContext::new()
            .with_block(block)
            .with_options(Some(data));
        let root = Lens::root();
        self.render(schema, root.get(data), &root, ctx)
    }

    pub fn render(
        &self,
        schema: &Schema,
        value: Option<&Value>,
        lens: &Lens,
        ctx: RenderContext<'_>,
    ) -> Option<RenderNode> {
        if ctx.depth > self.options.max_depth {
            warn!(
                depth = ctx.depth,
                path = %lens.path(),
                "render depth limit reached, subtree skipped"
            );
            return None;
        }

        let effective = unwrap(schema);
        let layout = resolve_metadata(&effective);
        if !is_visible(layout.and_then(|layout| layout.is_hidden.as_ref()), ctx.options) {
            trace!(path = %lens.path(), "hidden");
            return None;
        }

        if layout.and_then(|layout| layout.input_type) == Some(InputType::VariableDropdown) {
            let props = self.field_props(layout, initial_value(value, &effective), ctx);
            return Some(RenderNode::new(
                EditHandle::replace(lens.clone()),
                Element::Field {
                    widget: Widget::VariablePicker,
                    props,
                },
            ));
        }

        match effective.kind() {
            SchemaKind::Object(object) => self.render_object(
                object,
                initial_value_ref(value, &effective),
                lens,
                ctx,
                None,
            ),
            SchemaKind::DiscriminatedUnion(union) => {
                self.render_union(union, &effective, value, lens, ctx)
            }
            SchemaKind::Array(array) => self.render_array(array, &effective, value, lens, ctx),
            _ => self.render_leaf(&effective, value, lens, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{LayoutMetadata, ObjectSchema};

    fn nested(depth: usize) -> Schema {
        (0..depth).fold(Schema::string(), |inner, _| {
            Schema::from(ObjectSchema::new([("child", inner)]))
        })
    }

    #[test]
    fn depth_guard_cuts_deep_trees() {
        let renderer = FormRenderer::new().with_options(RenderOptions::default().with_max_depth(3));
        let tree = renderer
            .render_root(&nested(5), &Value::Null, None)
            .expect("root renders");
        assert_eq!(tree.leaf_count(), 0);

        let tree = FormRenderer::new()
            .render_root(&nested(5), &Value::Null, None)
            .expect("root renders");
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn variable_dropdown_wins_over_every_type() {
        let schema = Schema::number().with_layout(LayoutMetadata {
            input_type: Some(InputType::VariableDropdown),
            label: Some("Save in".into()),
            ..LayoutMetadata::default()
        });
        let tree = FormRenderer::new()
            .render_root(&schema, &json!("v1"), None)
            .expect("renders");
        let Element::Field { widget, props } = tree.element else {
            panic!("expected a field");
        };
        assert_eq!(widget, Widget::VariablePicker);
        assert_eq!(props.value, Some(json!("v1")));
        assert_eq!(props.label.as_deref(), Some("Save in"));
    }

    #[test]
    fn unrecognized_renders_nothing() {
        let tree = FormRenderer::new().render_root(&Schema::literal("x"), &Value::Null, None);
        assert!(tree.is_none());
    }
}
