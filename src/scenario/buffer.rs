//! Line-indexed, read-only access to scenario text
//!
//! The resolver never assumes the text is valid YAML; it only needs lines and
//! their indentation.

use std::borrow::Cow;

use ropey::Rope;

/// A single line without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub text: String,
    /// Index of the first non-whitespace character; the line length for
    /// whitespace-only lines.
    pub first_non_whitespace: usize,
}

impl TextLine {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let first_non_whitespace = text
            .char_indices()
            .find(|(_, c)| !c.is_whitespace())
            .map(|(i, _)| text[..i].chars().count())
            .unwrap_or_else(|| text.chars().count());
        Self {
            text,
            first_non_whitespace,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Blank lines and comment-only lines.
    pub fn is_trivia(&self) -> bool {
        let trimmed = self.text.trim_start();
        trimmed.is_empty() || trimmed.starts_with('#')
    }

    /// Text after the indentation.
    pub fn content(&self) -> &str {
        self.text.trim_start()
    }

    /// The text up to the LSP column `character`, counted in UTF-16 code
    /// units and clamped to the line length. A column inside a surrogate pair
    /// stops before that character.
    pub fn prefix(&self, character: usize) -> &str {
        let mut units = 0;
        for (i, c) in self.text.char_indices() {
            units += c.len_utf16();
            if units > character {
                return &self.text[..i];
            }
        }
        &self.text
    }
}

pub trait TextBuffer {
    fn line_count(&self) -> usize;

    /// `None` when `line` is past the end of the buffer.
    fn line_at(&self, line: usize) -> Option<TextLine>;

    fn text(&self) -> Cow<'_, str>;
}

fn strip_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

impl TextBuffer for Rope {
    fn line_count(&self) -> usize {
        self.len_lines()
    }

    fn line_at(&self, line: usize) -> Option<TextLine> {
        if line >= self.len_lines() {
            return None;
        }
        let text: Cow<'_, str> = self.line(line).into();
        Some(TextLine::new(strip_terminator(&text)))
    }

    fn text(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl TextBuffer for str {
    fn line_count(&self) -> usize {
        self.split('\n').count()
    }

    fn line_at(&self, line: usize) -> Option<TextLine> {
        self.split('\n')
            .nth(line)
            .map(|l| TextLine::new(l.strip_suffix('\r').unwrap_or(l)))
    }

    fn text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

/// Nearest line at or above `from` whose indentation is non-zero and less
/// than `indent`.
///
/// Stops at the start of the document, so inconsistent indentation can only
/// end the search early.
pub fn closest_less_indented_line<B: TextBuffer + ?Sized>(
    buffer: &B,
    indent: usize,
    from: usize,
) -> Option<(usize, TextLine)> {
    (0..=from).rev().find_map(|idx| {
        let line = buffer.line_at(idx)?;
        (line.first_non_whitespace != 0 && line.first_non_whitespace < indent).then_some((idx, line))
    })
}
