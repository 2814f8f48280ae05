//! Structural series inference: three or more sibling files that share a
//! textual context and differ only by an integer run at the same position
//! are taken to be episodes of one series.

use std::collections::{HashMap, HashSet};

/// Minimum number of distinct values a group needs before it counts as a
/// sequence.
const MIN_GROUP: usize = 3;

/// Split `s` into `(preceding text, digit run)` pairs, one per maximal run
/// of ASCII digits.
fn digit_splits(s: &str) -> Vec<(&str, &str)> {
    let bytes = s.as_bytes();
    let mut splits = Vec::new();
    let mut word_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let run_start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            splits.push((&s[word_start..run_start], &s[run_start..i]));
            word_start = i;
        } else {
            i += 1;
        }
    }
    splits
}

/// Trim leading zeros so that numerically equal runs compare equal without
/// bounding the run length.
fn normalize_run(run: &str) -> &str {
    let trimmed = run.trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

/// The textual context of a digit run: the tail of the preceding text within
/// the current path component, with separator characters trimmed off.
fn context_key(word: &str) -> &str {
    let tail = word.rsplit('/').next().unwrap_or(word);
    tail.trim_matches(|c: char| {
        c.is_whitespace() || c.is_control() || matches!(c, '.' | '_' | '-')
    })
}

/// True when some `(split index, context)` group collects at least three
/// distinct integer values across `paths`.
pub(crate) fn has_sequence(paths: &[String]) -> bool {
    let mut groups: HashMap<(usize, &str), HashSet<&str>> = HashMap::new();
    for path in paths {
        for (index, (word, run)) in digit_splits(path).into_iter().enumerate() {
            let members = groups.entry((index, context_key(word))).or_default();
            members.insert(normalize_run(run));
            if members.len() >= MIN_GROUP {
                return true;
            }
        }
    }
    false
}
