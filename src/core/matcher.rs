//! Selects the files a shred run operates on.
//!
//! Predicates run in a fixed order and stop at the first failure: include
//! glob, exclude glob, time windows, owner, content include, content exclude.
//! Only the two exclude steps count towards `excluded_count`.

use super::content::{ContentInspector, ContentMatch, FormatAwareInspector};
use super::error::{Result, ShredError};
use super::owner::file_owner;
use super::patterns::{build_name_globset, file_name_matches, parse_pattern_list};
use crate::utils::file_detection::is_image_file;
use chrono::{DateTime, Utc};
use globset::GlobSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A content filter: `pattern` must occur at least `min_occurrences` times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPredicate {
    pub pattern: String,
    pub min_occurrences: usize,
}

impl ContentPredicate {
    /// Returns `None` for a blank pattern. A threshold below one becomes one.
    pub fn new(pattern: &str, min_occurrences: usize) -> Option<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return None;
        }
        Some(Self {
            pattern: pattern.to_string(),
            min_occurrences: min_occurrences.max(1),
        })
    }
}

/// Everything a match run filters on. Not modified once `find_files` starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchCriteria {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub recursive: bool,
    pub owner_pattern: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub modified_after: Option<DateTime<Utc>>,
    pub modified_before: Option<DateTime<Utc>>,
    pub content_include: Option<ContentPredicate>,
    pub content_exclude: Option<ContentPredicate>,
    pub ocr_enabled: bool,
}

impl MatchCriteria {
    /// Builds criteria from raw comma/semicolon separated pattern text.
    pub fn from_patterns(include: &str, exclude: &str) -> Self {
        Self {
            include: parse_pattern_list(include),
            exclude: parse_pattern_list(exclude),
            ..Default::default()
        }
    }
}

/// Files that survived every predicate, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub files: Vec<PathBuf>,
    /// Candidates rejected by the exclude glob or the exclude-content predicate.
    pub excluded_count: usize,
    /// Include-content occurrence counts for matched files.
    pub content_occurrences: BTreeMap<PathBuf, usize>,
}

impl MatchResult {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

enum Verdict {
    Matched(Option<usize>),
    NotMatched,
    Excluded,
}

/// Compiled form of `MatchCriteria` for one run.
struct CompiledCriteria<'a> {
    criteria: &'a MatchCriteria,
    include: GlobSet,
    exclude: GlobSet,
    owner: Option<Regex>,
}

pub struct FileMatcher<I: ContentInspector = FormatAwareInspector> {
    inspector: I,
}

impl Default for FileMatcher<FormatAwareInspector> {
    fn default() -> Self {
        Self::new()
    }
}

impl FileMatcher<FormatAwareInspector> {
    /// A matcher that reads plain text and has no extractors for other formats.
    pub fn new() -> Self {
        Self::with_inspector(FormatAwareInspector::new())
    }
}

impl<I: ContentInspector> FileMatcher<I> {
    pub fn with_inspector(inspector: I) -> Self {
        Self { inspector }
    }

    /// Walks `root` and returns the files satisfying `criteria`.
    ///
    /// Fails before touching the filesystem on a malformed owner regex or glob,
    /// and with `NotADirectory` if `root` is not a directory.
    pub fn find_files(&self, root: &Path, criteria: &MatchCriteria) -> Result<MatchResult> {
        let compiled = CompiledCriteria {
            criteria,
            owner: criteria
                .owner_pattern
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(Regex::new)
                .transpose()?,
            include: build_name_globset(&criteria.include)?,
            exclude: build_name_globset(&criteria.exclude)?,
        };

        let root = fs::canonicalize(root)
            .ok()
            .filter(|p| p.is_dir())
            .ok_or_else(|| ShredError::NotADirectory(root.to_path_buf()))?;

        let max_depth = if criteria.recursive { usize::MAX } else { 1 };
        let mut result = MatchResult::default();

        for entry in WalkDir::new(&root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            match self.evaluate(entry.path(), &compiled) {
                Verdict::Matched(occurrences) => {
                    if let Some(count) = occurrences {
                        result
                            .content_occurrences
                            .insert(entry.path().to_path_buf(), count);
                    }
                    result.files.push(entry.into_path());
                }
                Verdict::Excluded => result.excluded_count += 1,
                Verdict::NotMatched => {}
            }
        }

        let mut log_message = format!(
            "Found {} files matching pattern '{}'",
            result.files.len(),
            criteria.include.join(", ")
        );
        if !criteria.exclude.is_empty() || criteria.content_exclude.is_some() {
            log_message.push_str(&format!(" (excluded {} files)", result.excluded_count));
        }
        tracing::info!("{}", log_message);

        Ok(result)
    }

    fn evaluate(&self, path: &Path, compiled: &CompiledCriteria<'_>) -> Verdict {
        let criteria = compiled.criteria;

        if !file_name_matches(&compiled.include, path) {
            return Verdict::NotMatched;
        }
        if file_name_matches(&compiled.exclude, path) {
            return Verdict::Excluded;
        }

        let metadata = match fs::metadata(path) {
            Ok(md) => md,
            Err(e) => {
                tracing::warn!("Cannot read metadata for {}: {}", path.display(), e);
                return Verdict::NotMatched;
            }
        };

        if !within_window(created_time(&metadata), criteria.created_after, criteria.created_before)
            || !within_window(
                metadata.modified().ok().map(DateTime::<Utc>::from),
                criteria.modified_after,
                criteria.modified_before,
            )
        {
            return Verdict::NotMatched;
        }

        if let Some(owner_regex) = &compiled.owner {
            // Unresolvable ownership does not reject the file.
            if let Some(owner) = file_owner(&metadata) {
                if !owner_regex.is_match(&owner) {
                    return Verdict::NotMatched;
                }
            }
        }

        let mut occurrences = None;
        if let Some(predicate) = &criteria.content_include {
            match self.inspect(path, predicate, criteria.ocr_enabled) {
                Some(found) if found.matched => occurrences = Some(found.occurrences),
                _ => return Verdict::NotMatched,
            }
        }

        if let Some(predicate) = &criteria.content_exclude {
            if let Some(found) = self.inspect(path, predicate, criteria.ocr_enabled) {
                if found.matched {
                    tracing::debug!(
                        "Excluding {}: '{}' found {} times",
                        path.display(),
                        predicate.pattern,
                        found.occurrences
                    );
                    return Verdict::Excluded;
                }
            }
        }

        Verdict::Matched(occurrences)
    }

    /// Runs the content inspector. `None` means the predicate could not be evaluated.
    fn inspect(
        &self,
        path: &Path,
        predicate: &ContentPredicate,
        ocr_enabled: bool,
    ) -> Option<ContentMatch> {
        if is_image_file(path) && !ocr_enabled {
            tracing::debug!("OCR disabled, skipping content check for {}", path.display());
            return None;
        }

        match self
            .inspector
            .inspect(path, &predicate.pattern, predicate.min_occurrences)
        {
            Ok(found) => Some(found),
            Err(ShredError::UnsupportedContentFormat(_)) => {
                tracing::debug!("No content extractor for {}", path.display());
                None
            }
            Err(e) => {
                tracing::warn!("Content check failed for {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Inclusive bounds check. A missing timestamp fails any bound that is set.
fn within_window(
    time: Option<DateTime<Utc>>,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
) -> bool {
    if after.is_none() && before.is_none() {
        return true;
    }
    let Some(time) = time else {
        return false;
    };
    after.map_or(true, |a| time >= a) && before.map_or(true, |b| time <= b)
}

fn created_time(metadata: &Metadata) -> Option<DateTime<Utc>> {
    if let Ok(created) = metadata.created() {
        return Some(created.into());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        DateTime::from_timestamp(metadata.ctime(), metadata.ctime_nsec() as u32)
    }
    #[cfg(not(unix))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::content::TextExtractor;
    use chrono::Duration;
    use std::fs;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    fn setup(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn names(result: &MatchResult) -> Vec<String> {
        result
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_content_include_scenario() {
        let dir = setup(&[
            ("a.secret", "token token token"),
            ("b.secret", "none here"),
            ("c.txt", "token token"),
        ]);
        let mut criteria = MatchCriteria::from_patterns("*.secret", "");
        criteria.content_include = ContentPredicate::new("token", 2);

        let result = FileMatcher::new().find_files(dir.path(), &criteria).unwrap();
        assert_eq!(names(&result), vec!["a.secret"]);
        assert_eq!(result.excluded_count, 0);
        assert_eq!(result.content_occurrences.values().copied().collect::<Vec<_>>(), vec![3]);
        assert!(result.files[0].is_absolute());
    }

    #[test]
    fn test_exclude_glob_counts_only_included_candidates() {
        let dir = setup(&[
            ("keep.txt", "x"),
            ("skip.txt", "x"),
            ("skip.log", "x"),
            ("other.md", "x"),
        ]);
        let criteria = MatchCriteria::from_patterns("*.txt; *.log", "skip*");
        let result = FileMatcher::new().find_files(dir.path(), &criteria).unwrap();
        assert_eq!(names(&result), vec!["keep.txt"]);
        assert_eq!(result.excluded_count, 2);
    }

    #[test]
    fn test_content_exclude_counts_as_excluded() {
        let dir = setup(&[("a.txt", "classified CLASSIFIED"), ("b.txt", "public")]);
        let mut criteria = MatchCriteria::from_patterns("*.txt", "");
        criteria.content_exclude = ContentPredicate::new("classified", 2);

        let result = FileMatcher::new().find_files(dir.path(), &criteria).unwrap();
        assert_eq!(names(&result), vec!["b.txt"]);
        assert_eq!(result.excluded_count, 1);
    }

    #[test]
    fn test_recursive_flag_controls_depth() {
        let dir = setup(&[("top.txt", "x"), ("nested/deep/inner.txt", "x")]);
        let mut criteria = MatchCriteria::from_patterns("*.txt", "");

        let flat = FileMatcher::new().find_files(dir.path(), &criteria).unwrap();
        assert_eq!(names(&flat), vec!["top.txt"]);

        criteria.recursive = true;
        let deep = FileMatcher::new().find_files(dir.path(), &criteria).unwrap();
        assert_eq!(deep.len(), 2);
        assert!(names(&deep).contains(&"inner.txt".to_string()));
    }

    #[test]
    fn test_empty_include_matches_nothing() {
        let dir = setup(&[("a.txt", "x")]);
        let result = FileMatcher::new()
            .find_files(dir.path(), &MatchCriteria::default())
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.excluded_count, 0);
    }

    #[test]
    fn test_bad_owner_regex_is_configuration_error() {
        let dir = setup(&[("a.txt", "x")]);
        let mut criteria = MatchCriteria::from_patterns("*", "");
        criteria.owner_pattern = Some("(unclosed".to_string());
        let err = FileMatcher::new().find_files(dir.path(), &criteria).unwrap_err();
        assert!(matches!(err, ShredError::Configuration(_)));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_bad_owner_regex_wins_over_missing_directory() {
        let mut criteria = MatchCriteria::from_patterns("*", "");
        criteria.owner_pattern = Some("[".to_string());
        let err = FileMatcher::new()
            .find_files(Path::new("/definitely/not/here"), &criteria)
            .unwrap_err();
        assert!(matches!(err, ShredError::Configuration(_)));
    }

    #[test]
    fn test_missing_root_is_not_a_directory() {
        let dir = setup(&[("file.txt", "x")]);
        let err = FileMatcher::new()
            .find_files(&dir.path().join("file.txt"), &MatchCriteria::from_patterns("*", ""))
            .unwrap_err();
        assert!(matches!(err, ShredError::NotADirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_pattern_filters() {
        let dir = setup(&[("a.txt", "x")]);
        let owner = file_owner(&fs::metadata(dir.path().join("a.txt")).unwrap()).unwrap();

        let mut criteria = MatchCriteria::from_patterns("*.txt", "");
        criteria.owner_pattern = Some(format!("^{}$", regex::escape(&owner)));
        assert_eq!(FileMatcher::new().find_files(dir.path(), &criteria).unwrap().len(), 1);

        criteria.owner_pattern = Some("^no-such-user-xyz$".to_string());
        let result = FileMatcher::new().find_files(dir.path(), &criteria).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.excluded_count, 0);
    }

    #[test]
    fn test_modified_window() {
        let dir = setup(&[("a.txt", "x")]);
        let now = Utc::now();
        let mut criteria = MatchCriteria::from_patterns("*.txt", "");

        criteria.modified_after = Some(now - Duration::hours(1));
        criteria.modified_before = Some(now + Duration::hours(1));
        assert_eq!(FileMatcher::new().find_files(dir.path(), &criteria).unwrap().len(), 1);

        criteria.modified_after = Some(now + Duration::hours(1));
        criteria.modified_before = None;
        let result = FileMatcher::new().find_files(dir.path(), &criteria).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.excluded_count, 0);
    }

    #[test]
    fn test_created_before_rejects_new_files() {
        let dir = setup(&[("a.txt", "x")]);
        let mut criteria = MatchCriteria::from_patterns("*.txt", "");
        criteria.created_before = Some(Utc::now() - Duration::days(365));
        assert!(FileMatcher::new().find_files(dir.path(), &criteria).unwrap().is_empty());
    }

    struct CountingInspector(std::cell::Cell<usize>);

    impl ContentInspector for CountingInspector {
        fn inspect(&self, _path: &Path, _pattern: &str, _min: usize) -> Result<ContentMatch> {
            self.0.set(self.0.get() + 1);
            Ok(ContentMatch::from_count(5, 1))
        }
    }

    #[test]
    fn test_metadata_checks_run_before_content() {
        let dir = setup(&[("a.txt", "x"), ("b.txt", "x")]);
        let mut criteria = MatchCriteria::from_patterns("*.txt", "b.txt");
        criteria.modified_after = Some(Utc::now() + Duration::days(1));
        criteria.content_include = ContentPredicate::new("x", 1);

        let matcher = FileMatcher::with_inspector(CountingInspector(std::cell::Cell::new(0)));
        let result = matcher.find_files(dir.path(), &criteria).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.excluded_count, 1);
        assert_eq!(matcher.inspector.0.get(), 0);
    }

    struct OcrText;

    impl TextExtractor for OcrText {
        fn extract_text(&self, _path: &Path) -> Result<String> {
            Ok("Password: hunter2".to_string())
        }
    }

    #[test]
    fn test_images_only_inspected_with_ocr_enabled() {
        let dir = setup(&[("scan.png", "\u{0089}PNG")]);
        let inspector = FormatAwareInspector::new().with_extractor("png", Box::new(OcrText));
        let matcher = FileMatcher::with_inspector(inspector);
        let mut criteria = MatchCriteria::from_patterns("*.png", "");
        criteria.content_include = ContentPredicate::new("password", 1);

        assert!(matcher.find_files(dir.path(), &criteria).unwrap().is_empty());

        criteria.ocr_enabled = true;
        assert_eq!(matcher.find_files(dir.path(), &criteria).unwrap().len(), 1);
    }

    #[traced_test]
    #[test]
    fn test_unsupported_format_degrades_to_not_matched() {
        let dir = setup(&[("report.pdf", "token"), ("notes.txt", "token")]);
        let mut criteria = MatchCriteria::from_patterns("*", "");
        criteria.content_include = ContentPredicate::new("token", 1);

        let result = FileMatcher::new().find_files(dir.path(), &criteria).unwrap();
        assert_eq!(names(&result), vec!["notes.txt"]);
        assert!(logs_contain("No content extractor"));
    }

    #[test]
    fn test_unsupported_format_is_not_excluded() {
        let dir = setup(&[("report.pdf", "secret")]);
        let mut criteria = MatchCriteria::from_patterns("*.pdf", "");
        criteria.content_exclude = ContentPredicate::new("secret", 1);

        let result = FileMatcher::with_inspector(crate::core::content::NoContentInspector)
            .find_files(dir.path(), &criteria)
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.excluded_count, 0);
    }

    #[test]
    fn test_content_predicate_new() {
        assert_eq!(ContentPredicate::new("   ", 3), None);
        assert_eq!(ContentPredicate::new(" key ", 0).unwrap().min_occurrences, 1);
    }
}
