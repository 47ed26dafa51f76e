use ropey::Rope;

use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};

pub use crate::lsp::models::{LspDocument, LspDocumentState};
use crate::scanner::line_len_without_terminator;

/// Converts an LSP position to a char index in the Rope.
///
/// `position.character` counts UTF-16 code units, the LSP default encoding.
/// Returns `None` when the line does not exist. The character is clamped to the
/// line's content, so a position past the end of a line maps to its terminator.
pub fn position_to_char(text: &Rope, position: Position) -> Option<usize> {
    let line = position.line as usize;
    if line >= text.len_lines() {
        return None;
    }
    let line_start = text.line_to_char(line);
    let line_end = line_start + line_len_without_terminator(text.line(line));
    let line_start_cu = text.char_to_utf16_cu(line_start);
    let line_end_cu = text.char_to_utf16_cu(line_end);
    let cu = (line_start_cu + position.character as usize).min(line_end_cu);
    Some(text.utf16_cu_to_char(cu))
}

/// Converts a char index in the Rope to an LSP position (UTF-16 columns).
pub fn char_to_position(text: &Rope, char_idx: usize) -> Position {
    let char_idx = char_idx.min(text.len_chars());
    let line = text.char_to_line(char_idx);
    let character = text.char_to_utf16_cu(char_idx) - text.char_to_utf16_cu(text.line_to_char(line));
    Position::new(line as u32, character as u32)
}

impl LspDocumentState {
    /// Applies a list of content changes to the document state.
    ///
    /// Changes are applied to a copy of the text; the state is only updated when
    /// the version is newer and every change applies.
    pub fn apply(
        &mut self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Result<Rope, String> {
        if version <= self.version {
            return Err(format!("Version {} not newer than {}", version, self.version));
        }
        let mut text = self.text.clone();
        for change in changes {
            if let Some(range) = change.range {
                let start = position_to_char(&text, range.start)
                    .ok_or_else(|| format!("Change start {:?} outside document", range.start))?;
                let end = position_to_char(&text, range.end).unwrap_or(text.len_chars());
                if start > end {
                    return Err(format!("Inverted change range {:?}", range));
                }
                text.remove(start..end);
                text.insert(start, &change.text);
            } else {
                text = Rope::from_str(&change.text);
            }
        }
        self.text = text;
        self.version = version;
        Ok(self.text.clone())
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

    /// Returns the current text of the document as a string.
    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    /// Returns a snapshot of the current text.
    ///
    /// Cloning a Rope is cheap; the snapshot is unaffected by later edits.
    pub async fn rope(&self) -> Rope {
        self.state.read().await.text.clone()
    }

    /// Returns the current version of the document.
    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    /// Applies changes to the document, returning the new text.
    pub async fn apply(
        &self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Option<Rope> {
        let mut state = self.state.write().await;
        match state.apply(changes, version) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Rejected change to {}: {}", state.uri, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_lsp::lsp_types::{Range, TextDocumentContentChangeEvent};

    /// Helper to create a test LspDocument.
    fn create_test_document(uri: &str, text: &str) -> Arc<LspDocument> {
        Arc::new(LspDocument::new(1, Url::parse(uri).unwrap(), text, 0))
    }

    #[tokio::test]
    async fn test_apply_full_change() {
        let doc = create_test_document("file:///Index.tml", "<html/>");
        let changes = vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "<t:layout/>".to_string(),
        }];

        let result = doc.apply(changes, 1).await.map(|text| text.to_string());
        assert_eq!(result.as_deref(), Some("<t:layout/>"), "Text should be updated");
        assert_eq!(doc.version().await, 1, "Version should be updated");
    }

    #[tokio::test]
    async fn test_apply_incremental_changes() {
        let doc = create_test_document("file:///Index.tml", "<html>\n<t:grid/>\n</html>");
        let changes = vec![
            TextDocumentContentChangeEvent {
                range: Some(Range {
                    start: Position::new(1, 3),
                    end: Position::new(1, 7),
                }),
                range_length: None,
                text: "zone".to_string(),
            },
            TextDocumentContentChangeEvent {
                range: Some(Range {
                    start: Position::new(0, 1),
                    end: Position::new(0, 5),
                }),
                range_length: None,
                text: "body".to_string(),
            },
        ];

        let result = doc.apply(changes, 1).await.map(|text| text.to_string());
        assert_eq!(result.as_deref(), Some("<body>\n<t:zone/>\n</html>"));
    }

    #[tokio::test]
    async fn test_apply_outdated_version() {
        let doc = create_test_document("file:///Index.tml", "initial");
        let changes = vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new".to_string(),
        }];

        assert!(doc.apply(changes.clone(), 1).await.is_some());
        assert!(doc.apply(changes, 1).await.is_none(), "Apply should fail for same version");
        assert_eq!(doc.text().await, "new", "Text should remain from previous change");
        assert_eq!(doc.version().await, 1, "Version should not change");
    }

    #[test]
    fn test_position_conversions() {
        let text = Rope::from_str("<p>\n<t:zone/>");
        assert_eq!(position_to_char(&text, Position::new(1, 3)), Some(7));
        assert_eq!(position_to_char(&text, Position::new(0, 99)), Some(3), "clamped to line length");
        assert_eq!(position_to_char(&text, Position::new(5, 0)), None);
        assert_eq!(char_to_position(&text, 7), Position::new(1, 3));
    }

    #[test]
    fn test_position_columns_are_utf16() {
        // the emoji is two UTF-16 code units but one char
        let text = Rope::from_str("<p>\u{1F600}<t:layout/>");
        assert_eq!(position_to_char(&text, Position::new(0, 3)), Some(3));
        assert_eq!(position_to_char(&text, Position::new(0, 7)), Some(6), "colon");
        assert_eq!(position_to_char(&text, Position::new(0, 8)), Some(7), "first char of layout");
        assert_eq!(char_to_position(&text, 7), Position::new(0, 8));
        assert_eq!(char_to_position(&text, 13), Position::new(0, 14));
        assert_eq!(position_to_char(&text, Position::new(0, 99)), Some(text.len_chars()));
    }

    #[test]
    fn test_position_clamped_before_unicode_line_break() {
        let text = Rope::from_str("<p>\u{2028}<t:zone/>");
        assert_eq!(position_to_char(&text, Position::new(0, 10)), Some(3));
    }

    #[tokio::test]
    async fn test_failed_change_leaves_document_untouched() {
        let doc = create_test_document("file:///Index.tml", "<a>\n<b>");
        let changes = vec![
            TextDocumentContentChangeEvent {
                range: Some(Range {
                    start: Position::new(0, 1),
                    end: Position::new(0, 2),
                }),
                range_length: None,
                text: "zzz".to_string(),
            },
            TextDocumentContentChangeEvent {
                range: Some(Range {
                    start: Position::new(7, 0),
                    end: Position::new(7, 1),
                }),
                range_length: None,
                text: "x".to_string(),
            },
        ];

        assert!(doc.apply(changes, 1).await.is_none(), "Apply should fail for a change outside the document");
        assert_eq!(doc.text().await, "<a>\n<b>", "No change should be kept");
        assert_eq!(doc.version().await, 0, "Version should not change");
    }
}
