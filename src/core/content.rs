//! The content-inspection capability the matcher uses for content predicates.
//!
//! Plain text is read directly. Every other format needs a `TextExtractor`
//! registered for its extension; PDF text extraction and OCR live outside this
//! crate and plug in through that trait.

use super::error::{Result, ShredError};
use crate::utils::file_detection::is_text_file;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Outcome of a single content inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentMatch {
    pub matched: bool,
    pub occurrences: usize,
}

impl ContentMatch {
    pub fn from_count(occurrences: usize, min_occurrences: usize) -> Self {
        Self {
            matched: occurrences >= min_occurrences.max(1),
            occurrences,
        }
    }
}

/// Answers "does this file's text contain `pattern` at least N times".
pub trait ContentInspector {
    /// Returns `UnsupportedContentFormat` when the file's text cannot be extracted.
    fn inspect(&self, path: &Path, pattern: &str, min_occurrences: usize) -> Result<ContentMatch>;
}

/// Turns a non-plain-text file into searchable text.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String>;
}

/// Counts case-insensitive, non-overlapping occurrences of `pattern` in `text`.
pub fn count_occurrences(text: &str, pattern: &str) -> usize {
    if pattern.is_empty() {
        return 0;
    }
    text.to_lowercase().matches(&pattern.to_lowercase()).count()
}

/// Reads plain text directly and delegates other formats by extension.
#[derive(Default)]
pub struct FormatAwareInspector {
    extractors: HashMap<String, Box<dyn TextExtractor>>,
}

impl FormatAwareInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `extractor` for files ending in `extension` (case-insensitive, no dot).
    pub fn with_extractor(mut self, extension: &str, extractor: Box<dyn TextExtractor>) -> Self {
        let key = extension.trim_start_matches('.').to_lowercase();
        self.extractors.insert(key, extractor);
        self
    }

    pub fn has_extractor(&self, extension: &str) -> bool {
        self.extractors
            .contains_key(&extension.trim_start_matches('.').to_lowercase())
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        if let Some(extractor) = extension.as_deref().and_then(|e| self.extractors.get(e)) {
            return extractor.extract_text(path);
        }

        if is_text_file(path).map_err(|e| ShredError::Io(e, path.to_path_buf()))? {
            let bytes = fs::read(path).map_err(|e| ShredError::Io(e, path.to_path_buf()))?;
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }

        Err(ShredError::UnsupportedContentFormat(path.to_path_buf()))
    }
}

impl ContentInspector for FormatAwareInspector {
    fn inspect(&self, path: &Path, pattern: &str, min_occurrences: usize) -> Result<ContentMatch> {
        let text = self.extract(path)?;
        let occurrences = count_occurrences(&text, pattern);
        Ok(ContentMatch::from_count(occurrences, min_occurrences))
    }
}

/// Reports every file as unsupported. Content predicates never match.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoContentInspector;

impl ContentInspector for NoContentInspector {
    fn inspect(&self, path: &Path, _pattern: &str, _min: usize) -> Result<ContentMatch> {
        Err(ShredError::UnsupportedContentFormat(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedText(&'static str);

    impl TextExtractor for FixedText {
        fn extract_text(&self, _path: &Path) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_count_occurrences_is_case_insensitive_and_non_overlapping() {
        assert_eq!(count_occurrences("Token token TOKEN", "token"), 3);
        assert_eq!(count_occurrences("aaaa", "aa"), 2);
        assert_eq!(count_occurrences("anything", ""), 0);
    }

    #[test]
    fn test_plain_text_is_read_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "token token token").unwrap();

        let result = FormatAwareInspector::new().inspect(&path, "token", 2).unwrap();
        assert_eq!(
            result,
            ContentMatch {
                matched: true,
                occurrences: 3
            }
        );
    }

    #[test]
    fn test_unknown_binary_format_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        fs::write(&path, b"%PDF-1.4 token").unwrap();

        let err = FormatAwareInspector::new().inspect(&path, "token", 1).unwrap_err();
        assert!(matches!(err, ShredError::UnsupportedContentFormat(_)));
    }

    #[test]
    fn test_registered_extractor_handles_its_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.PDF");
        fs::write(&path, b"%PDF-1.4").unwrap();

        let inspector =
            FormatAwareInspector::new().with_extractor(".pdf", Box::new(FixedText("secret, Secret")));
        assert!(inspector.has_extractor("PDF"));
        let result = inspector.inspect(&path, "secret", 2).unwrap();
        assert!(result.matched);
        assert_eq!(result.occurrences, 2);
    }

    #[test]
    fn test_below_threshold_is_not_matched() {
        let m = ContentMatch::from_count(1, 2);
        assert!(!m.matched);
        assert_eq!(m.occurrences, 1);
    }
}
