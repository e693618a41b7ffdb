use ropey::{Rope, RopeSlice};

use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};

pub use crate::lsp::models::{LspDocument, LspDocumentState};

/// Converts an LSP position to a char index in the Rope.
///
/// `character` counts UTF-16 code units. Columns past the end of the line
/// clamp to the end of its content, before the line terminator.
fn position_to_char_index(position: &Position, text: &Rope) -> usize {
    let line = position.line as usize;
    if line >= text.len_lines() {
        return text.len_chars();
    }
    let line_start = text.line_to_char(line);
    let slice = text.line(line);
    let content = slice.slice(..content_len(slice));
    let units = (position.character as usize).min(content.len_utf16_cu());
    line_start + content.utf16_cu_to_char(units)
}

/// Chars on the line before its `\n` or `\r\n` terminator.
fn content_len(line: RopeSlice) -> usize {
    let mut len = line.len_chars();
    if len > 0 && line.char(len - 1) == '\n' {
        len -= 1;
    }
    if len > 0 && line.char(len - 1) == '\r' {
        len -= 1;
    }
    len
}

impl LspDocumentState {
    /// Applies a list of content changes to the document state.
    /// Returns an error if `version` is not newer than the current one.
    pub fn apply(&mut self, changes: Vec<TextDocumentContentChangeEvent>, version: i32) -> Result<(), String> {
        if version <= self.version {
            return Err(format!("Version {} not newer than {}", version, self.version));
        }
        for change in changes {
            if let Some(range) = change.range {
                let start = position_to_char_index(&range.start, &self.text);
                let end = position_to_char_index(&range.end, &self.text).max(start);
                self.text.remove(start..end);
                self.text.insert(start, &change.text);
            } else {
                self.text = Rope::from_str(&change.text);
            }
        }
        self.version = version;
        Ok(())
    }
}

impl LspDocument {
    pub fn new(id: u32, uri: Url, text: &str, version: i32) -> Self {
        Self {
            id,
            state: tokio::sync::RwLock::new(LspDocumentState {
                uri,
                text: Rope::from_str(text),
                version,
            }),
        }
    }

    /// Returns the URI of the document.
    pub async fn uri(&self) -> Url {
        self.state.read().await.uri.clone()
    }

    /// Returns a snapshot of the current text. Cloning a Rope is cheap.
    pub async fn rope(&self) -> Rope {
        self.state.read().await.text.clone()
    }

    /// Returns the current text of the document as a string.
    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    /// Returns the current version of the document.
    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    /// Applies changes to the document.
    pub async fn apply(&self, changes: Vec<TextDocumentContentChangeEvent>, version: i32) -> Result<(), String> {
        self.state.write().await.apply(changes, version)
    }
}
