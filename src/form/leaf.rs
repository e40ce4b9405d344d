use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::domain::{EnumSchema, InputType, LayoutMetadata, SchemaKind};
use crate::schema::{Effective, initial_value, label_or, resolve_metadata};

use super::{
    context::RenderContext,
    dispatch::FormRenderer,
    lens::Lens,
    render::{
        Choice, CredentialsScope, EditHandle, Element, FieldProps, RemoteSource, RenderNode,
        Widget,
    },
};

pub const DEFAULT_CODE_LANG: &str = "javascript";

impl FormRenderer {
    pub(super) fn render_leaf(
        &self,
        effective: &Effective<'_>,
        value: Option<&Value>,
        lens: &Lens,
        ctx: RenderContext<'_>,
    ) -> Option<RenderNode> {
        let fallback = LayoutMetadata::default();
        let layout = resolve_metadata(effective).unwrap_or(&fallback);

        let widget = match effective.kind() {
            SchemaKind::Enum(schema) => Widget::Dropdown {
                choices: enum_choices(schema, layout),
                direction: layout.direction,
            },
            SchemaKind::Number | SchemaKind::Union(_) => Widget::NumberInput {
                direction: layout.direction,
            },
            SchemaKind::Boolean => Widget::Switch,
            SchemaKind::String => string_widget(layout, lens, ctx)?,
            _ => return None,
        };

        let mut props = self.field_props(Some(layout), initial_value(value, effective), ctx);
        if widget == Widget::Switch {
            props.label = Some(label_or(Some(layout), ctx.prop_name));
        }
        Some(RenderNode::new(
            EditHandle::replace(lens.clone()),
            Element::Field { widget, props },
        ))
    }

    pub(super) fn field_props(
        &self,
        layout: Option<&LayoutMetadata>,
        value: Option<Value>,
        ctx: RenderContext<'_>,
    ) -> FieldProps {
        let Some(layout) = layout else {
            return FieldProps {
                value,
                width: ctx.width,
                ..FieldProps::default()
            };
        };
        FieldProps {
            value,
            label: layout.label.clone(),
            placeholder: layout.placeholder.clone(),
            helper_text: layout
                .helper_text
                .as_deref()
                .map(|source| self.markdown.render(source)),
            more_info_tooltip: layout.more_info_tooltip.clone(),
            is_required: layout.is_required,
            width: ctx.width,
            debounce: layout.is_debounce_disabled.then_some(Duration::ZERO),
        }
    }
}

/// Enum values minus `hidden_items`, relabeled through `to_labels`.
pub fn enum_choices(schema: &EnumSchema, layout: &LayoutMetadata) -> Vec<Choice> {
    schema
        .values
        .iter()
        .filter(|value| !layout.hidden_items.contains(value))
        .map(|value| Choice {
            value: value.clone(),
            label: match &layout.to_labels {
                Some(labels) => labels.label_for(value),
                None => value.clone(),
            },
        })
        .collect()
}

fn string_widget(layout: &LayoutMetadata, lens: &Lens, ctx: RenderContext<'_>) -> Option<Widget> {
    let with_variable_button = layout.with_variable_button;

    if let Some(items) = &layout.auto_complete_items {
        return Some(Widget::Autocomplete {
            items: items.clone(),
            with_variable_button: with_variable_button.unwrap_or(true),
        });
    }

    if let Some(fetcher) = &layout.fetcher {
        let Some(block) = ctx.block else {
            debug!(%fetcher, path = %lens.path(), "no block definition, fetcher field skipped");
            return None;
        };
        if !block.declares_fetcher(fetcher) {
            debug!(%fetcher, block = %block.id, "fetcher is not declared by the block");
        }
        let source = RemoteSource {
            fetcher: fetcher.clone(),
            block_id: block.id.clone(),
            credentials_scope: CredentialsScope::Workspace,
            options: ctx.options.cloned(),
        };
        return Some(if layout.allow_custom_text {
            Widget::RemoteAutocomplete {
                source,
                with_variable_button,
            }
        } else {
            Widget::RemoteSelect { source }
        });
    }

    Some(match layout.input_type {
        Some(InputType::Textarea) => Widget::Textarea {
            with_variable_button,
        },
        Some(InputType::Code) => Widget::CodeEditor {
            lang: layout
                .lang
                .clone()
                .unwrap_or_else(|| DEFAULT_CODE_LANG.to_string()),
            with_line_numbers: true,
            with_variable_button,
        },
        Some(InputType::Password) => Widget::TextInput {
            masked: true,
            with_variable_button,
        },
        _ => Widget::TextInput {
            masked: false,
            with_variable_button,
        },
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{BlockDefinition, ChoiceLabels, Schema};

    fn leaf(schema: &Schema, data: Value, block: Option<&BlockDefinition>) -> Option<(Widget, FieldProps)> {
        let node = FormRenderer::new().render_root(schema, &data, block)?;
        match node.element {
            Element::Field { widget, props } => Some((widget, props)),
            other => panic!("expected a field, got {other:?}"),
        }
    }

    fn string_with(layout: LayoutMetadata) -> Schema {
        Schema::string().with_layout(layout)
    }

    #[test]
    fn enum_hides_items_and_relabels() {
        let schema = Schema::enumeration(["low", "medium", "high"]).with_layout(LayoutMetadata {
            hidden_items: vec!["medium".into()],
            to_labels: Some(ChoiceLabels::custom(|value| value.to_uppercase())),
            ..LayoutMetadata::default()
        });
        let (widget, _) = leaf(&schema, Value::Null, None).expect("renders");
        let Widget::Dropdown { choices, .. } = widget else {
            panic!("expected dropdown");
        };
        let values: Vec<_> = choices.iter().map(|choice| choice.value.as_str()).collect();
        let labels: Vec<_> = choices.iter().map(|choice| choice.label.as_str()).collect();
        assert_eq!(values, ["low", "high"]);
        assert_eq!(labels, ["LOW", "HIGH"]);
    }

    #[test]
    fn union_renders_as_number_input() {
        let schema = Schema::union([Schema::number(), Schema::string()]);
        let (widget, props) = leaf(&schema, json!(4), None).expect("renders");
        assert_eq!(widget, Widget::NumberInput { direction: None });
        assert_eq!(props.value, Some(json!(4)));
    }

    #[test]
    fn autocomplete_defaults_to_variable_button() {
        let schema = string_with(LayoutMetadata {
            auto_complete_items: Some(vec!["gpt-4o".into()]),
            fetcher: Some("fetchModels".into()),
            ..LayoutMetadata::default()
        });
        let (widget, _) = leaf(&schema, Value::Null, None).expect("renders");
        assert_eq!(
            widget,
            Widget::Autocomplete {
                items: vec!["gpt-4o".into()],
                with_variable_button: true,
            }
        );
    }

    #[test]
    fn fetcher_requires_block() {
        let schema = string_with(LayoutMetadata {
            fetcher: Some("fetchModels".into()),
            ..LayoutMetadata::default()
        });
        assert!(leaf(&schema, Value::Null, None).is_none());

        let block = BlockDefinition::new("openai");
        let (widget, _) = leaf(&schema, json!("gpt"), Some(&block)).expect("renders");
        let Widget::RemoteSelect { source } = widget else {
            panic!("expected remote select");
        };
        assert_eq!(source.fetcher, "fetchModels");
        assert_eq!(source.block_id, "openai");
        assert_eq!(source.credentials_scope.as_str(), "workspace");
        assert_eq!(source.options, Some(json!("gpt")));
    }

    #[test]
    fn custom_text_switches_to_remote_autocomplete() {
        let schema = string_with(LayoutMetadata {
            fetcher: Some("fetchModels".into()),
            allow_custom_text: true,
            ..LayoutMetadata::default()
        });
        let block = BlockDefinition::new("openai");
        let (widget, _) = leaf(&schema, Value::Null, Some(&block)).expect("renders");
        assert!(matches!(widget, Widget::RemoteAutocomplete { .. }));
    }

    #[test]
    fn input_types_pick_string_widgets() {
        let code = string_with(LayoutMetadata {
            input_type: Some(InputType::Code),
            ..LayoutMetadata::default()
        });
        let (widget, _) = leaf(&code, Value::Null, None).expect("renders");
        assert_eq!(
            widget,
            Widget::CodeEditor {
                lang: DEFAULT_CODE_LANG.into(),
                with_line_numbers: true,
                with_variable_button: None,
            }
        );

        let password = string_with(LayoutMetadata {
            input_type: Some(InputType::Password),
            with_variable_button: Some(false),
            ..LayoutMetadata::default()
        });
        let (widget, _) = leaf(&password, Value::Null, None).expect("renders");
        assert_eq!(
            widget,
            Widget::TextInput {
                masked: true,
                with_variable_button: Some(false),
            }
        );

        let textarea = string_with(LayoutMetadata {
            input_type: Some(InputType::Textarea),
            ..LayoutMetadata::default()
        });
        let (widget, _) = leaf(&textarea, Value::Null, None).expect("renders");
        assert!(matches!(widget, Widget::Textarea { .. }));
    }

    #[test]
    fn props_carry_defaults_and_debounce() {
        let schema = string_with(LayoutMetadata {
            label: Some("Base URL".into()),
            default_value: Some(json!("https://api.openai.com/v1")),
            is_debounce_disabled: true,
            helper_text: Some("See **docs**".into()),
            ..LayoutMetadata::default()
        });
        let (_, props) = leaf(&schema, Value::Null, None).expect("renders");
        assert_eq!(props.value, Some(json!("https://api.openai.com/v1")));
        assert_eq!(props.debounce, Some(Duration::ZERO));
        assert_eq!(
            props.helper_text.as_ref().map(|text| text.as_str()),
            Some("See **docs**")
        );

        let (_, props) = leaf(&Schema::string(), Value::Null, None).expect("renders");
        assert_eq!(props.debounce, None);
        assert_eq!(props.helper_text, None);
    }
}
