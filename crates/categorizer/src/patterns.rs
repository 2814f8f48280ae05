//! Built-in patterns and the loader for the external adult-content pattern.

use regex::{Regex, RegexBuilder};
use std::path::Path;
use std::sync::LazyLock;

use crate::error::CategorizerError;
use crate::Result;

// The external pattern file is one very large alternation; the default
// compiled-size limit is too small for it.
const PATTERN_SIZE_LIMIT: usize = 1 << 26;

/// Keywords that mark an `iso` image as a software installer rather than a
/// video disc.
pub(crate) static SOFTWARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"(\b|_)(adobe|microsoft|windows|x64|x86|v\d+(\.\d+)+)(\b|_)")
        .case_insensitive(true)
        .build()
        .unwrap()
});

/// Season/episode markers: `S02E01`, `EP 3`, `E07`, `s1`, with one- or
/// two-digit numbers including zero-indexed specials like `S00E01`.
pub(crate) static TV_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\b([es]|ep[\s_-]?|s\d\d?e)\d\d?\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});

/// Test `pattern` against `s` with `_` normalized to `-` first, so that word
/// boundaries hold across underscore-separated names.
pub(crate) fn re_test(pattern: &Regex, s: &str) -> bool {
    if s.contains('_') {
        pattern.is_match(&s.replace('_', "-"))
    } else {
        pattern.is_match(s)
    }
}

/// Compile an externally supplied pattern as a case-insensitive matcher.
pub(crate) fn compile_external(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()?)
}

/// Load a pattern source from a text file: the first line containing a
/// non-whitespace character, trimmed. An unreadable file or a file without
/// such a line is a setup error.
pub fn load_pattern(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path).map_err(|source| CategorizerError::PatternFile {
        path: path.to_owned(),
        source,
    })?;
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| CategorizerError::EmptyPattern(path.to_owned()))
}
