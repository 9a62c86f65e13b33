//! Directory tree operations used to store and restore cache entries
//!
//! Functions here return plain `io::Result`; callers translate failures
//! into the stage-specific error for the step they are performing.

use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

/// Recursively copy `src` into `dst`
///
/// Existing files in `dst` are overwritten, missing directories are
/// created, and symlinks are recreated as symlinks with the same target
/// string (never dereferenced). Directories get the source's permission
/// bits. Returns the number of regular files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut copied = 0;
    let mut directories = Vec::new();

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let target = if rel.as_os_str().is_empty() {
            dst.to_path_buf()
        } else {
            dst.join(rel)
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
            directories.push((target, entry.metadata()?.permissions()));
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    // Children first, so a read-only directory is only locked once filled
    for (dir, permissions) in directories.into_iter().rev() {
        fs::set_permissions(&dir, permissions)?;
    }

    debug!(
        "Copied {} files from {} to {}",
        copied,
        src.display(),
        dst.display()
    );
    Ok(copied)
}

/// Recreate the symlink at `src` as `dst`, replacing a non-directory at `dst`
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;

    if let Ok(existing) = fs::symlink_metadata(dst) {
        if !existing.is_dir() {
            fs::remove_file(dst)?;
        }
    }

    create_symlink(&target, dst)
}

/// Create a symlink at `link` pointing to `target`
#[cfg(unix)]
pub fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Create a symlink at `link` pointing to `target`
#[cfg(windows)]
pub fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

/// List `root` and every path below it, each exactly once
///
/// Symlinks are listed but not followed, so a link cycle cannot cause
/// repeats. Order is filesystem traversal order with parents before
/// children.
pub fn collect_entries(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        entries.push(entry.into_path());
    }

    Ok(entries)
}

/// Remove `path` whether it is a directory tree, a file or a symlink
///
/// A missing path is not an error. Symlinks are removed, never followed.
pub fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Set the access time of `path` (following symlinks) to now
pub fn mark_used(path: &Path) -> io::Result<()> {
    let file = File::open(path)?;
    file.set_times(FileTimes::new().set_accessed(SystemTime::now()))
}
