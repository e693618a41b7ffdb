//! Scenario completion
//!
//! This module provides:
//! - Step expression completion after `step: `
//! - Cog name completion after `cog: `
//! - Step id completion after `stepId: `, scoped to the item's cog
//! - Data key completion under a step's `data:` block
//! - Token completion after `{`, from static tokens and earlier steps' records

pub mod providers;
pub mod trigger;

use tower_lsp::lsp_types::{CompletionItem, Position};
use tracing::trace;

use crate::registry::CogRegistry;
use crate::scenario::TextBuffer;

pub use providers::{
    CogNameProvider, CompletionProvider, DataKeyProvider, StepExpressionProvider, StepIdProvider,
    TokenProvider,
};
pub use trigger::Trigger;

/// Every provider, in the order their items are listed.
pub const PROVIDERS: [&dyn CompletionProvider; 5] = [
    &StepExpressionProvider,
    &CogNameProvider,
    &StepIdProvider,
    &DataKeyProvider,
    &TokenProvider,
];

/// Runs the providers that respond to `trigger` and concatenates their items.
///
/// A missing registry behaves like an empty one: registry-backed providers
/// return nothing, static tokens are still offered.
pub fn complete(
    registry: Option<&CogRegistry>,
    buffer: &dyn TextBuffer,
    position: Position,
    trigger: Trigger,
) -> Vec<CompletionItem> {
    let empty = CogRegistry::default();
    let registry = registry.unwrap_or(&empty);

    PROVIDERS
        .iter()
        .filter(|provider| provider.trigger().accepts(trigger))
        .flat_map(|provider| {
            let items = provider.provide(registry, buffer, position);
            trace!("{} provider returned {} items", provider.name(), items.len());
            items
        })
        .collect()
}
