use std::path::{Path, PathBuf};

/// Resolve a path to its filesystem identity, falling back to the lexical
/// form when it does not (yet) exist. Symlinked spellings of the same
/// directory compare equal through this.
pub(crate) fn locate(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Component-wise prefix test; a path is within itself.
pub(crate) fn is_within(child: &Path, parent: &Path) -> bool {
    child.starts_with(parent)
}

/// The torrent name with its last extension stripped, used as the directory
/// for a single-file payload.
pub(crate) fn stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name)
}

/// Bytes in human units, two decimals.
pub(crate) fn humansize(size: u64) -> String {
    let mut value = size as f64;
    for suffix in ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei"] {
        if value < 1024.0 {
            return format!("{value:.2} {suffix}B");
        }
        value /= 1024.0;
    }
    format!("{value:.2} ZiB")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_within() {
        assert!(is_within(Path::new("/a/b/c"), Path::new("/a/b")));
        assert!(is_within(Path::new("/a/b"), Path::new("/a/b")));
        // Component-wise, not a string prefix.
        assert!(!is_within(Path::new("/a/bc"), Path::new("/a/b")));
        assert!(!is_within(Path::new("/x"), Path::new("/a")));
    }

    #[test]
    fn test_stem() {
        assert_eq!(stem("movie.mkv"), "movie");
        assert_eq!(stem("archive.tar.gz"), "archive.tar");
        assert_eq!(stem("plain"), "plain");
        assert_eq!(stem(".hidden"), ".hidden");
    }

    #[test]
    fn test_humansize() {
        assert_eq!(humansize(0), "0.00 B");
        assert_eq!(humansize(1023), "1023.00 B");
        assert_eq!(humansize(1024), "1.00 KiB");
        assert_eq!(humansize(52_428_800), "50.00 MiB");
        assert_eq!(humansize(3 << 30), "3.00 GiB");
    }

    #[test]
    fn test_locate_follows_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        assert_eq!(locate(&link), locate(&target));
        // Nonexistent paths stay lexical.
        let ghost = dir.path().join("ghost");
        assert_eq!(locate(&ghost), ghost);
    }
}
