//! Structural scan of the top-level `steps` block sequence
//!
//! Splits the sequence into items by indentation, records each item's line
//! range and re-parses the item's own text with `serde_yaml`. Items that do
//! not parse on their own fall back to reading their keys line by line, so a
//! single broken item never hides the rest of the document.

use serde_yaml::Value;
use tracing::debug;

use super::buffer::{TextBuffer, TextLine};
use super::line_walk::collect_keys;
use super::step::{StepObject, strip_item_marker};

/// Inclusive range of zero-based line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }

    /// True when the whole range lies strictly before `line`.
    pub fn ends_before(&self, line: usize) -> bool {
        self.end < line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepItem {
    pub range: LineRange,
    pub object: StepObject,
}

/// Scans the document for its `steps` block sequence.
///
/// Returns `None` when there is no top-level `steps:` key followed by a block
/// sequence (or nothing at all). An empty `steps:` yields an empty list.
pub fn scan_steps<B: TextBuffer + ?Sized>(buffer: &B) -> Option<Vec<StepItem>> {
    let line_count = buffer.line_count();
    let key_line = (0..line_count).find(|&i| {
        buffer
            .line_at(i)
            .is_some_and(|l| !l.is_trivia() && l.first_non_whitespace == 0 && is_steps_key(&l.text))
    })?;

    let Some((first, first_line)) = next_content_line(buffer, key_line + 1) else {
        return Some(Vec::new());
    };
    let item_indent = first_line.first_non_whitespace;
    if strip_item_marker(first_line.content()).is_none() {
        // `steps:` holds something other than a sequence, or nothing
        return if item_indent == 0 { Some(Vec::new()) } else { None };
    }

    let mut items = Vec::new();
    let mut current: Option<(usize, usize)> = None;

    for idx in first..line_count {
        let Some(text_line) = buffer.line_at(idx) else {
            break;
        };
        if text_line.is_trivia() {
            // Indented blank lines still belong to the open item
            if let Some((_, end)) = current.as_mut() {
                if text_line.first_non_whitespace > item_indent {
                    *end = idx;
                }
            }
            continue;
        }

        let indent = text_line.first_non_whitespace;
        if indent < item_indent {
            break;
        }
        if indent == item_indent {
            if strip_item_marker(text_line.content()).is_none() {
                break;
            }
            if let Some((start, end)) = current.take() {
                items.push(read_item(buffer, start, end, item_indent));
            }
            current = Some((idx, idx));
        } else if let Some((_, end)) = current.as_mut() {
            *end = idx;
        }
    }

    if let Some((start, end)) = current {
        items.push(read_item(buffer, start, end, item_indent));
    }

    Some(items)
}

fn is_steps_key(text: &str) -> bool {
    let Some(rest) = text
        .strip_prefix("steps")
        .or_else(|| text.strip_prefix("\"steps\""))
        .or_else(|| text.strip_prefix("'steps'"))
    else {
        return false;
    };
    let Some(value) = rest.trim_start().strip_prefix(':') else {
        return false;
    };
    let value = value.trim();
    value.is_empty() || value.starts_with('#')
}

fn next_content_line<B: TextBuffer + ?Sized>(buffer: &B, from: usize) -> Option<(usize, TextLine)> {
    (from..buffer.line_count())
        .filter_map(|i| buffer.line_at(i).map(|l| (i, l)))
        .find(|(_, l)| !l.is_trivia())
}

fn read_item<B: TextBuffer + ?Sized>(buffer: &B, start: usize, end: usize, item_indent: usize) -> StepItem {
    let range = LineRange { start, end };
    let (text, content_col) = item_text(buffer, range, item_indent);

    let parsed = text.and_then(|text| match serde_yaml::from_str::<Value>(&text) {
        Ok(value @ Value::Mapping(_)) => StepObject::from_yaml(&value),
        Ok(_) => Some(StepObject::default()),
        Err(e) => {
            debug!("Step item at lines {}-{} does not parse: {}", start, end, e);
            None
        }
    });

    let object = parsed.unwrap_or_else(|| {
        let mut object = StepObject::default();
        collect_keys(buffer, start, end, content_col, &mut object);
        object
    });

    StepItem { range, object }
}

/// Builds the item's text dedented to its content column.
///
/// The text is `None` when a continuation line is indented less than the
/// content column, which cannot be a well-formed item.
fn item_text<B: TextBuffer + ?Sized>(buffer: &B, range: LineRange, item_indent: usize) -> (Option<String>, usize) {
    let marker_line = buffer.line_at(range.start).unwrap_or_else(|| TextLine::new(""));
    let (rest, offset) = strip_item_marker(marker_line.content()).unwrap_or(("", 1));

    let content_col = if rest.is_empty() {
        next_content_line(buffer, range.start + 1)
            .filter(|(i, _)| *i <= range.end)
            .map(|(_, l)| l.first_non_whitespace)
            .unwrap_or(item_indent + 2)
    } else {
        item_indent + offset
    };

    let mut text = String::from(rest);
    text.push('\n');

    for idx in range.start + 1..=range.end {
        let Some(text_line) = buffer.line_at(idx) else {
            break;
        };
        if text_line.is_trivia() {
            text.push('\n');
            continue;
        }
        if text_line.first_non_whitespace < content_col {
            return (None, content_col);
        }
        let dedented: String = text_line.text.chars().skip(content_col).collect();
        text.push_str(&dedented);
        text.push('\n');
    }

    (Some(text), content_col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_scan_ranges_and_objects() {
        let text = indoc! {"
            scenario: Scan
            tokens:
              name: Ada
            steps:
            - step: I do a thing
              data:
                email: x

            - cog: acme/web
              stepId: Navigate
            # trailing comment
            description: after
        "};

        let items = scan_steps(text).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].range, LineRange { start: 4, end: 6 });
        assert_eq!(items[0].object.step.as_deref(), Some("I do a thing"));
        assert_eq!(items[1].range, LineRange { start: 8, end: 9 });
        assert_eq!(items[1].object.cog.as_deref(), Some("acme/web"));
        assert_eq!(items[1].object.step_id.as_deref(), Some("Navigate"));
    }

    #[test]
    fn test_scan_indented_sequence() {
        let text = "steps:\n  - step: one\n    data:\n      a: b\n  - step: two\n";
        let items = scan_steps(text).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].range, LineRange { start: 1, end: 3 });
        assert_eq!(items[1].object.step.as_deref(), Some("two"));
    }

    #[test]
    fn test_indented_blank_line_extends_item() {
        let text = "steps:\n- step: one\n  data:\n    \n- step: two\n";
        let items = scan_steps(text).unwrap();
        assert_eq!(items[0].range, LineRange { start: 1, end: 3 });
    }

    #[test]
    fn test_broken_item_falls_back_to_line_keys() {
        let text = indoc! {"
            steps:
            - cog: acme/web
              stepId: Navigate
              data: {unclosed
            - step: fine
        "};
        let items = scan_steps(text).unwrap();
        assert_eq!(items[0].object.cog.as_deref(), Some("acme/web"));
        assert_eq!(items[0].object.step_id.as_deref(), Some("Navigate"));
        assert_eq!(items[1].object.step.as_deref(), Some("fine"));
    }

    #[test]
    fn test_no_steps_block() {
        assert!(scan_steps("scenario: x\n").is_none());
        assert_eq!(scan_steps("steps:\n").unwrap(), vec![]);
        assert_eq!(scan_steps("steps: []\n"), None);
        assert_eq!(scan_steps("steps:\nnext: 1\n").unwrap(), vec![]);
    }
}
