//! Recursive, attribute-preserving copy with an incremental skip, so a
//! placement interrupted mid-way is simply resumed on the next attempt.

use std::fs;
use std::path::Path;

use crate::error::EngineError;
use crate::Result;

#[derive(Debug, Default, Clone, Copy)]
pub struct CopyStats {
    pub files: u64,
    pub bytes: u64,
    pub skipped: u64,
}

/// Copy `src` to `dst` (the final path, not the containing directory).
/// Directories merge into an existing `dst`; files already present with the
/// same size and a destination mtime no older than the source are skipped;
/// everything else is overwritten. Symlinks are recreated, not followed.
pub fn copy_recursive(src: &Path, dst: &Path) -> Result<CopyStats> {
    let mut stats = CopyStats::default();
    copy_entry(src, dst, &mut stats)?;
    Ok(stats)
}

fn copy_entry(src: &Path, dst: &Path, stats: &mut CopyStats) -> Result<()> {
    let meta = fs::symlink_metadata(src).map_err(|err| EngineError::io(src, err))?;
    let file_type = meta.file_type();

    if file_type.is_symlink() {
        let target = fs::read_link(src).map_err(|err| EngineError::io(src, err))?;
        if fs::symlink_metadata(dst).is_ok() {
            fs::remove_file(dst).map_err(|err| EngineError::io(dst, err))?;
        }
        std::os::unix::fs::symlink(&target, dst).map_err(|err| EngineError::io(dst, err))?;
        stats.files += 1;
    } else if file_type.is_dir() {
        fs::create_dir_all(dst).map_err(|err| EngineError::io(dst, err))?;
        let entries = fs::read_dir(src).map_err(|err| EngineError::io(src, err))?;
        for entry in entries {
            let entry = entry.map_err(|err| EngineError::io(src, err))?;
            copy_entry(&entry.path(), &dst.join(entry.file_name()), stats)?;
        }
        fs::set_permissions(dst, meta.permissions()).map_err(|err| EngineError::io(dst, err))?;
    } else {
        if unchanged(&meta, dst) {
            stats.skipped += 1;
            return Ok(());
        }
        fs::copy(src, dst).map_err(|err| EngineError::io(dst, err))?;
        stats.files += 1;
        stats.bytes += meta.len();
    }
    Ok(())
}

/// An earlier placement of this file that does not need redoing.
fn unchanged(src_meta: &fs::Metadata, dst: &Path) -> bool {
    let Ok(dst_meta) = fs::metadata(dst) else {
        return false;
    };
    if !dst_meta.is_file() || dst_meta.len() != src_meta.len() {
        return false;
    }
    match (dst_meta.modified(), src_meta.modified()) {
        (Ok(dst_time), Ok(src_time)) => dst_time >= src_time,
        _ => false,
    }
}
