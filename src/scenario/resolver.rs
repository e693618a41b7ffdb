//! Cursor context for a scenario document
//!
//! Everything is recomputed from the text on each call; nothing is cached
//! between requests. None of these lookups fail: a document that cannot be
//! read simply has no context.

use tracing::trace;

use super::buffer::TextBuffer;
use super::line_walk::walk_step_at;
use super::step::StepObject;
use super::structure::{LineRange, scan_steps};
use super::tokens::TokenTable;
use crate::registry::{CogRegistry, StepEntry};

/// A `steps` item matched against the registry.
#[derive(Debug, Clone)]
pub struct StepOccurrence<'r> {
    pub range: LineRange,
    pub object: StepObject,
    pub resolved: Option<&'r StepEntry>,
}

impl StepOccurrence<'_> {
    /// The resolved step's cog, falling back to the item's own `cog` key.
    pub fn cog(&self) -> Option<&str> {
        self.resolved
            .map(|step| step.cog.as_str())
            .or(self.object.cog.as_deref())
    }
}

pub struct ContextResolver<'a, B: TextBuffer + ?Sized> {
    registry: &'a CogRegistry,
    buffer: &'a B,
}

impl<'a, B: TextBuffer + ?Sized> ContextResolver<'a, B> {
    pub fn new(registry: &'a CogRegistry, buffer: &'a B) -> Self {
        Self { registry, buffer }
    }

    /// Every item of the `steps` sequence, or `None` if the document has no
    /// recognizable `steps` block.
    pub fn occurrences(&self) -> Option<Vec<StepOccurrence<'a>>> {
        let items = scan_steps(self.buffer)?;
        Some(
            items
                .into_iter()
                .map(|item| StepOccurrence {
                    resolved: item.object.resolve(self.registry),
                    range: item.range,
                    object: item.object,
                })
                .collect(),
        )
    }

    /// The item whose range contains `line`.
    ///
    /// Without a `steps` block the item is found by walking the lines around
    /// the cursor instead.
    pub fn occurrence_at(&self, line: usize) -> Option<StepOccurrence<'a>> {
        match self.occurrences() {
            Some(occurrences) => occurrences.into_iter().find(|o| o.range.contains(line)),
            None => {
                trace!("No steps block, walking lines around {}", line);
                let walked = walk_step_at(self.buffer, line)?;
                Some(StepOccurrence {
                    resolved: walked.object.resolve(self.registry),
                    range: LineRange {
                        start: walked.marker_line,
                        end: line,
                    },
                    object: walked.object,
                })
            }
        }
    }

    pub fn step_at(&self, line: usize) -> Option<&'a StepEntry> {
        self.occurrence_at(line)?.resolved
    }

    pub fn cog_at(&self, line: usize) -> Option<String> {
        self.occurrence_at(line)?.cog().map(str::to_string)
    }

    /// Tokens in scope at `line`: static declarations plus the records of
    /// every resolved step that ends before `line`.
    pub fn tokens_at(&self, line: usize) -> TokenTable {
        let mut table = TokenTable::new();
        table.add_static_tokens(&self.buffer.text());

        for occurrence in self.occurrences().unwrap_or_default() {
            if !occurrence.range.ends_before(line) {
                continue;
            }
            if let Some(step) = occurrence.resolved {
                table.add_step_records(step);
            }
        }

        table
    }
}
