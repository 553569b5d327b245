//! # Extract Module
//!
//! Text extraction capability used by the scanner.
//!
//! Format adapters (PDF, DOCX, ...) live behind [`TextExtractor`]. The
//! crate ships [`PlainTextExtractor`] for text-like formats; a caller with
//! richer adapters passes its own implementation to the scanner.

use crate::error::ExtractionError;
use std::fs;
use std::path::Path;

/// Extensions readable as UTF-8 text (lossy)
pub const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "md", "py", "json", "csv"];

/// Pulls readable text out of one file
pub trait TextExtractor: Send + Sync {
    /// `Ok(None)` means the format is not supported by this extractor.
    fn extract_text(&self, path: &Path) -> Result<Option<String>, ExtractionError>;
}

/// Reads text-like files directly
#[derive(Debug, Clone, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<Option<String>, ExtractionError> {
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| PLAIN_TEXT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);
        if !supported {
            return Ok(None);
        }

        let bytes = fs::read(path).map_err(|source| ExtractionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// Collapse whitespace and cut to `max_chars` characters, marking the cut with `…`
pub fn summarize(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut summary: String = collapsed.chars().take(max_chars).collect();
    summary.push('…');
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_text_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.MD");
        fs::write(&path, "# Title\nbody").unwrap();

        let text = PlainTextExtractor.extract_text(&path).unwrap();
        assert_eq!(text.as_deref(), Some("# Title\nbody"));
    }

    #[test]
    fn binary_formats_are_unsupported_not_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.pdf");
        fs::write(&path, b"%PDF-1.4").unwrap();

        assert!(PlainTextExtractor.extract_text(&path).unwrap().is_none());
    }

    #[test]
    fn unreadable_text_file_is_an_error() {
        let result = PlainTextExtractor.extract_text(Path::new("/nonexistent/a.txt"));
        assert!(matches!(result, Err(ExtractionError::Io { .. })));
    }

    #[test]
    fn summarize_collapses_whitespace() {
        assert_eq!(summarize("a\n\n  b\tc", 400), "a b c");
    }

    #[test]
    fn summarize_truncates_on_char_boundary() {
        let summary = summarize("ééééé", 3);
        assert_eq!(summary, "ééé…");
    }
}
