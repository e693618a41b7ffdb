//! Line-oriented step lookup that tolerates half-typed documents
//!
//! Walks upward from the cursor to the list marker of the enclosing item,
//! picking up `step`, `cog` and `stepId` keys at the item's content column on
//! the way, then reads downward to the end of the item when the keys seen so
//! far are not enough to select a registry entry.

use super::buffer::TextBuffer;
use super::step::{StepObject, parse_key_line, strip_item_marker};

/// The item found around a cursor line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedStep {
    /// Line holding the item's `-` marker
    pub marker_line: usize,
    pub object: StepObject,
}

/// Finds the step item enclosing `line`.
///
/// Returns `None` when the walk reaches a top-level key or the start of the
/// document without finding an item marker with step keys.
pub fn walk_step_at<B: TextBuffer + ?Sized>(buffer: &B, line: usize) -> Option<WalkedStep> {
    let cursor = buffer.line_at(line)?;
    let mut keyed_lines: Vec<(usize, String)> = Vec::new();
    let mut min_indent = usize::MAX;
    let mut idx = line;
    let mut current = Some(cursor);

    // Each iteration moves one line up, so this ends after at most `line + 1` steps.
    let (marker_line, marker_indent, content_col) = loop {
        let text_line = current.take()?;

        if !text_line.is_trivia() {
            let indent = text_line.first_non_whitespace;
            let content = text_line.content();

            match strip_item_marker(content) {
                Some((rest, offset)) if idx == line || indent < min_indent => {
                    let content_col = if rest.is_empty() { indent + 2 } else { indent + offset };
                    let has_step_keys = parse_key_line(rest).is_some()
                        || keyed_lines.iter().any(|(col, text)| {
                            *col == content_col && parse_key_line(text).is_some()
                        });
                    if has_step_keys {
                        keyed_lines.push((content_col, rest.to_string()));
                        break (idx, indent, content_col);
                    }
                    // A list nested inside the item, such as one under `data:`
                    if indent == 0 {
                        return None;
                    }
                    min_indent = min_indent.min(indent);
                }
                _ if indent == 0 => return None,
                _ => {
                    keyed_lines.push((indent, content.to_string()));
                    min_indent = min_indent.min(indent);
                }
            }
        }

        if idx == 0 {
            return None;
        }
        idx -= 1;
        current = buffer.line_at(idx);
    };

    let mut object = StepObject::default();
    // Lines nearest the marker come last in `keyed_lines`
    for (col, text) in keyed_lines.iter().rev() {
        if *col != content_col {
            continue;
        }
        if let Some((key, Some(value))) = parse_key_line(text) {
            object.set(key, value);
        }
    }

    if object.step.is_none() && (object.cog.is_none() || object.step_id.is_none()) {
        let end = item_end(buffer, line + 1, marker_indent);
        if end > line {
            collect_keys(buffer, line + 1, end, content_col, &mut object);
        }
    }

    Some(WalkedStep { marker_line, object })
}

/// Last line of the item whose lines below `from` are indented deeper than
/// `marker_indent`. Returns `from - 1` if the item ends before `from`.
pub(crate) fn item_end<B: TextBuffer + ?Sized>(buffer: &B, from: usize, marker_indent: usize) -> usize {
    let mut end = from.saturating_sub(1);
    let mut idx = from;
    while let Some(text_line) = buffer.line_at(idx) {
        if !text_line.is_trivia() {
            if text_line.first_non_whitespace <= marker_indent {
                break;
            }
            end = idx;
        }
        idx += 1;
    }
    end
}

/// Reads step keys written at `content_col` on lines `from..=to`.
pub(crate) fn collect_keys<B: TextBuffer + ?Sized>(
    buffer: &B,
    from: usize,
    to: usize,
    content_col: usize,
    object: &mut StepObject,
) {
    for idx in from..=to {
        let Some(text_line) = buffer.line_at(idx) else {
            break;
        };
        if text_line.is_trivia() {
            continue;
        }
        let indent = text_line.first_non_whitespace;
        let content = text_line.content();
        let text = match strip_item_marker(content) {
            Some((rest, offset)) if indent + offset == content_col => rest,
            Some(_) => continue,
            None if indent == content_col => content,
            None => continue,
        };
        if let Some((key, Some(value))) = parse_key_line(text) {
            object.set(key, value);
        }
    }
}
