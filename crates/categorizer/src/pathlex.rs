//! Path lexing: lowercasing, extension splitting, and canonicalization of
//! multi-file disc images down to a single logical video.

use regex::Regex;
use std::sync::LazyLock;

static BDMV_STREAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/bdmv/stream/[^/]+$").unwrap());

static VTS_COMPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[^/]*vts[0-9_]*$").unwrap());

/// ASCII-lowercase a path. Non-ASCII code points pass through unchanged.
pub(crate) fn to_lower(path: &str) -> String {
    path.to_ascii_lowercase()
}

/// Split `path` into `(root, extension)` with the classical splitext rule:
/// the extension is the substring after the last `.` of the final path
/// component, unless that component consists only of leading dots. The dot
/// itself belongs to neither side.
pub(crate) fn split_ext(path: &str) -> (&str, &str) {
    let base = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    let component = &path[base..];
    match component.rfind('.') {
        Some(dot) if component[..dot].bytes().any(|b| b != b'.') => {
            (&path[..base + dot], &path[base + dot + 1..])
        }
        _ => (path, ""),
    }
}

/// Reduce the sub-files of a disc image to the identity of the directory
/// holding the image, so that a BDMV or VIDEO_TS tree tallies as one video.
/// `root` must already be lowercased.
pub(crate) fn canonicalize(root: &str, ext: &str) -> String {
    match ext {
        "m2ts" => BDMV_STREAM.replace(root, "").into_owned(),
        "vob" => VTS_COMPONENT.replace(root, "/video_ts").into_owned(),
        _ => root.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ext() {
        assert_eq!(split_ext("a/b.c"), ("a/b", "c"));
        assert_eq!(split_ext("a/.hidden"), ("a/.hidden", ""));
        assert_eq!(split_ext("a/b.tar.gz"), ("a/b.tar", "gz"));
        assert_eq!(split_ext("a/b"), ("a/b", ""));
        assert_eq!(split_ext("a.b/c"), ("a.b/c", ""));
    }

    #[test]
    fn test_split_ext_corner_cases() {
        assert_eq!(split_ext("..b"), ("..b", ""));
        assert_eq!(split_ext("a/b."), ("a/b", ""));
        assert_eq!(split_ext("file.mkv"), ("file", "mkv"));
        assert_eq!(split_ext(""), ("", ""));
    }

    #[test]
    fn test_canonicalize_bdmv() {
        assert_eq!(
            canonicalize("movie/bdmv/stream/00001", "m2ts"),
            "movie"
        );
        // Not inside a bdmv/stream directory: unchanged.
        assert_eq!(
            canonicalize("movie/extras/00001", "m2ts"),
            "movie/extras/00001"
        );
    }

    #[test]
    fn test_canonicalize_vts() {
        assert_eq!(
            canonicalize("movie/video_ts/vts_01_1", "vob"),
            "movie/video_ts/video_ts"
        );
        // The plain menu file maps onto the same key.
        assert_eq!(
            canonicalize("movie/video_ts/video_ts", "vob"),
            "movie/video_ts/video_ts"
        );
        // A terminal component without a vts run is left alone.
        assert_eq!(canonicalize("movie/feature", "vob"), "movie/feature");
        // A bare component without any directory is left alone.
        assert_eq!(canonicalize("vts_01_1", "vob"), "vts_01_1");
    }

    #[test]
    fn test_canonicalize_other_ext() {
        assert_eq!(canonicalize("a/b", "mkv"), "a/b");
    }
}
