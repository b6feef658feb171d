//! Ancestor chain computation
//!
//! The chain for a path and a manage depth N is the path itself followed by
//! its parents, at most N entries long, never including `/`.

use std::path::{Path, PathBuf};

/// Ordered list of managed hierarchy levels
///
/// Level 0 is the target path; level k is its k-th ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorChain {
    levels: Vec<PathBuf>,
}

impl AncestorChain {
    /// Build the chain for `path`, walking at most `depth` levels
    pub fn new(path: &Path, depth: u32) -> Self {
        let mut levels = Vec::new();
        let mut current = Some(path);

        while let Some(level) = current {
            if levels.len() >= depth as usize || is_root(level) {
                break;
            }
            levels.push(level.to_path_buf());
            current = level.parent();
        }

        Self { levels }
    }

    /// Number of levels in the chain
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the chain is empty (only when the target is `/`)
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Levels from the target upward
    pub fn leaf_to_root(&self) -> impl Iterator<Item = &Path> {
        self.levels.iter().map(PathBuf::as_path)
    }

    /// Levels from the topmost managed ancestor down to the target
    ///
    /// This is the order attribute writes are applied in.
    pub fn root_to_leaf(&self) -> impl Iterator<Item = &Path> {
        self.levels.iter().rev().map(PathBuf::as_path)
    }
}

/// Whether a path is the filesystem root
pub fn is_root(path: &Path) -> bool {
    path.parent().is_none() && path.has_root()
}

/// Paths that must be created for `path` to exist, outermost first
///
/// Walks upward past any managed window until `exists` reports an existing
/// ancestor or the root is reached. Each entry carries how many managed
/// levels remain at that point: the target starts at `depth` and every step
/// upward costs one. The plan is empty when `path` is the root or already
/// exists.
pub fn missing_ancestors(
    path: &Path,
    depth: u32,
    mut exists: impl FnMut(&Path) -> bool,
) -> Vec<(PathBuf, i64)> {
    if is_root(path) || exists(path) {
        return Vec::new();
    }

    let mut missing = vec![(path.to_path_buf(), i64::from(depth))];
    let mut remaining = i64::from(depth);
    let mut current = path.parent();

    while let Some(parent) = current {
        if is_root(parent) || exists(parent) {
            break;
        }
        remaining -= 1;
        missing.push((parent.to_path_buf(), remaining));
        current = parent.parent();
    }

    missing.reverse();
    missing
}
