//! The five scenario completion providers
//!
//! Each provider is a pure function of the registry, the document text and
//! the cursor position. A provider whose precondition does not hold returns
//! an empty list.

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Documentation, Position, Range, TextEdit,
};

use crate::registry::CogRegistry;
use crate::scenario::{ContextResolver, TextBuffer, TokenOrigin, closest_less_indented_line};

use super::trigger::Trigger;

pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Character that makes the editor ask this provider for items.
    fn trigger(&self) -> Trigger;

    fn provide(&self, registry: &CogRegistry, buffer: &dyn TextBuffer, position: Position) -> Vec<CompletionItem>;
}

fn line_prefix(buffer: &dyn TextBuffer, position: Position) -> Option<String> {
    buffer
        .line_at(position.line as usize)
        .map(|line| line.prefix(position.character as usize).to_string())
}

fn value_item(label: impl Into<String>, detail: Option<String>) -> CompletionItem {
    CompletionItem {
        label: label.into(),
        kind: Some(CompletionItemKind::VALUE),
        detail,
        ..Default::default()
    }
}

/// Step expressions after `step: `.
pub struct StepExpressionProvider;

impl CompletionProvider for StepExpressionProvider {
    fn name(&self) -> &'static str {
        "step-expression"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Space
    }

    fn provide(&self, registry: &CogRegistry, buffer: &dyn TextBuffer, position: Position) -> Vec<CompletionItem> {
        if !line_prefix(buffer, position).is_some_and(|p| p.contains("step: ")) {
            return Vec::new();
        }

        registry
            .steps()
            .iter()
            .map(|step| CompletionItem {
                label: step.expression().to_string(),
                kind: Some(CompletionItemKind::METHOD),
                detail: Some(format!("{} ({})", step.step_id(), step.cog)),
                ..Default::default()
            })
            .collect()
    }
}

/// Cog names after `cog: `.
pub struct CogNameProvider;

impl CompletionProvider for CogNameProvider {
    fn name(&self) -> &'static str {
        "cog-name"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Space
    }

    fn provide(&self, registry: &CogRegistry, buffer: &dyn TextBuffer, position: Position) -> Vec<CompletionItem> {
        if !line_prefix(buffer, position).is_some_and(|p| p.contains("cog: ")) {
            return Vec::new();
        }

        registry
            .cogs()
            .iter()
            .map(|cog| value_item(cog.name.clone(), None))
            .collect()
    }
}

/// Step ids after `stepId: `, limited to the cog of the enclosing item when
/// one is known.
pub struct StepIdProvider;

impl CompletionProvider for StepIdProvider {
    fn name(&self) -> &'static str {
        "step-id"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Space
    }

    fn provide(&self, registry: &CogRegistry, buffer: &dyn TextBuffer, position: Position) -> Vec<CompletionItem> {
        if !line_prefix(buffer, position).is_some_and(|p| p.contains("stepId: ")) {
            return Vec::new();
        }

        let cog = ContextResolver::new(registry, buffer).cog_at(position.line as usize);

        registry
            .steps()
            .iter()
            .filter(|step| cog.as_deref().is_none_or(|cog| step.cog == cog))
            .map(|step| value_item(step.step_id(), Some(step.cog.clone())))
            .collect()
    }
}

/// Expected field keys on lines nested under a step's `data:` key.
pub struct DataKeyProvider;

impl CompletionProvider for DataKeyProvider {
    fn name(&self) -> &'static str {
        "data-key"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Space
    }

    fn provide(&self, registry: &CogRegistry, buffer: &dyn TextBuffer, position: Position) -> Vec<CompletionItem> {
        let line_number = position.line as usize;
        let Some(line) = buffer.line_at(line_number) else {
            return Vec::new();
        };

        let indent = line.first_non_whitespace;
        if indent <= 2 || line.text.contains(':') || line_number == 0 {
            return Vec::new();
        }

        let nested_under_data = closest_less_indented_line(buffer, indent, line_number - 1)
            .is_some_and(|(_, parent)| parent.text.contains("data:"));
        if !nested_under_data {
            return Vec::new();
        }

        let Some(step) = ContextResolver::new(registry, buffer).step_at(line_number) else {
            return Vec::new();
        };

        step.definition
            .expected_fields
            .iter()
            .map(|field| CompletionItem {
                documentation: field.description.clone().map(Documentation::String),
                ..value_item(field.key.clone(), Some(step.step_id().to_string()))
            })
            .collect()
    }
}

/// `{token}` placeholders in scope at the cursor.
pub struct TokenProvider;

impl CompletionProvider for TokenProvider {
    fn name(&self) -> &'static str {
        "token"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Brace
    }

    fn provide(&self, registry: &CogRegistry, buffer: &dyn TextBuffer, position: Position) -> Vec<CompletionItem> {
        let tokens = ContextResolver::new(registry, buffer).tokens_at(position.line as usize);
        if tokens.is_empty() {
            return Vec::new();
        }

        // Replace the `{` that opened the completion, if there is one.
        let opening_brace = line_prefix(buffer, position)
            .filter(|p| p.ends_with('{'))
            .map(|p| {
                let end = p.encode_utf16().count() as u32;
                Range {
                    start: Position::new(position.line, end - 1),
                    end: Position::new(position.line, end),
                }
            });

        tokens
            .iter()
            .map(|(key, origin)| {
                let label = format!("{{{}}}", key);
                let detail = match origin {
                    TokenOrigin::Static { value } => value.clone(),
                    TokenOrigin::Record { cog, record } => format!("{} record from {}", record, cog),
                };
                CompletionItem {
                    text_edit: opening_brace.map(|range| {
                        CompletionTextEdit::Edit(TextEdit {
                            range,
                            new_text: label.clone(),
                        })
                    }),
                    ..value_item(label, Some(detail))
                }
            })
            .collect()
    }
}
