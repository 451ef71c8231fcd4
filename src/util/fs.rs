//! Filesystem helpers for materialising a project in a temporary workspace

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Directories never copied into a workspace
const SKIPPED_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Copies the tree rooted at `src` into `dst`, creating `dst` as needed.
///
/// Symlinks are recreated rather than followed, and VCS metadata directories
/// are skipped. Returns the number of regular files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<u64> {
    fs::create_dir_all(dst)
        .with_context(|| format!("Failed to create directory: {}", dst.display()))?;

    let mut copied = 0;
    let walker = WalkDir::new(src)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && e.file_name()
                    .to_str()
                    .map(|name| SKIPPED_DIRS.contains(&name))
                    .unwrap_or(false))
        });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("{} escapes {}", entry.path().display(), src.display()))?;
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else if file_type.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory: {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy file: {}", entry.path().display()))?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let link = fs::read_link(src)
        .with_context(|| format!("Failed to read symlink: {}", src.display()))?;
    std::os::unix::fs::symlink(&link, dst)
        .with_context(|| format!("Failed to create symlink: {}", dst.display()))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    // Without native symlinks, copy whatever the link points at.
    let meta = fs::metadata(src)
        .with_context(|| format!("Failed to resolve symlink: {}", src.display()))?;
    if meta.is_dir() {
        copy_tree(&fs::canonicalize(src)?, dst)?;
    } else {
        fs::copy(src, dst)
            .with_context(|| format!("Failed to copy file: {}", src.display()))?;
    }
    Ok(())
}

/// Removes `path` and everything below it if it exists
pub fn remove_tree(path: &Path) -> Result<()> {
    if path.symlink_metadata().is_ok() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}
