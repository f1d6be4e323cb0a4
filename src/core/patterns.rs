use super::error::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Splits raw pattern text like `"*.txt, secret*; doc?.pdf"` into patterns.
///
/// Commas and semicolons both separate patterns. Blank entries are dropped and
/// duplicates keep their first position.
pub fn parse_pattern_list(raw: &str) -> Vec<String> {
    let mut patterns: Vec<String> = Vec::new();
    for pattern in raw.split([',', ';']).map(str::trim) {
        if !pattern.is_empty() && !patterns.iter().any(|p| p == pattern) {
            patterns.push(pattern.to_string());
        }
    }
    patterns
}

/// Builds a `GlobSet` matched against bare file names.
///
/// An empty pattern list yields an empty set, which matches nothing.
pub fn build_name_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            continue;
        }
        builder.add(Glob::new(trimmed)?);
    }
    Ok(builder.build()?)
}

/// True if the final component of `path` matches any glob in `set`.
pub fn file_name_matches(set: &GlobSet, path: &Path) -> bool {
    path.file_name().is_some_and(|name| set.is_match(name))
}
