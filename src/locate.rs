//! locate
//!
//! Upward directory search for marker files.
//!
//! A *marker* is a filename whose presence identifies a directory as a
//! meaningful root: `.git` for the version-control root, `package.json`
//! for the manifest root. The search starts at a given directory and
//! visits each successive parent until the filesystem root, returning the
//! first directory that contains the marker.
//!
//! Traversal is monotonic, so no cycle detection is needed; the root is
//! detected by a path having no distinct parent.

use std::path::{Path, PathBuf};

/// Find the nearest ancestor of `start` (including `start` itself) that
/// contains an entry named `marker`.
///
/// Performs read-only existence checks only. Returns `None` when the
/// filesystem root is reached without a match.
pub fn find_marker_root(start: &Path, marker: &str) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(marker).exists() {
            return Some(dir);
        }
        match dir.parent() {
            Some(parent) if parent != dir => dir = parent.to_path_buf(),
            _ => return None,
        }
    }
}

/// Resolve the git directory under a discovered version-control root.
///
/// Normally `<root>/.git` is a directory and is returned as-is. In linked
/// worktrees and submodules `.git` is a file containing a
/// `gitdir: <path>` pointer; the pointer is followed, resolving relative
/// paths against `root`. An unreadable or unparseable `.git` file is
/// treated as no git directory at all.
pub fn resolve_git_dir(root: &Path) -> Option<PathBuf> {
    let dot_git = root.join(".git");
    if dot_git.is_dir() {
        return Some(dot_git);
    }
    let content = std::fs::read_to_string(&dot_git).ok()?;
    let pointer = content.trim().strip_prefix("gitdir:")?.trim();
    let path = Path::new(pointer);
    if path.is_absolute() {
        Some(path.to_path_buf())
    } else {
        Some(root.join(path))
    }
}
