//! Cached metadata snapshot of the target path
//!
//! The target is stat'ed at most once per reconciliation cycle. Soft failures
//! (missing path, a file where a directory was expected, permission denied,
//! invalid name) all read as "absent"; anything else is an error.

use std::io;
use std::path::Path;

use nix::errno::Errno;

use crate::error::ReconcileError;
use crate::infra::filesystem::{DirectoryOps, PathMetadata};

/// Snapshot cache state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatCache {
    /// Never stat'ed
    #[default]
    Uninitialized,
    /// Result of the last stat; `None` means absent
    Cached(Option<PathMetadata>),
    /// A re-stat is needed before the next read
    Invalidated,
}

impl StatCache {
    /// The cached snapshot, stat'ing `path` first if needed
    pub fn get(
        &mut self,
        fs: &impl DirectoryOps,
        path: &Path,
    ) -> Result<Option<PathMetadata>, ReconcileError> {
        if let Self::Cached(snapshot) = self {
            return Ok(*snapshot);
        }
        let snapshot = stat_soft(fs, path)?;
        *self = Self::Cached(snapshot);
        Ok(snapshot)
    }

    /// Force a re-stat on the next read
    pub fn invalidate(&mut self) {
        *self = Self::Invalidated;
    }

    /// Whether a stat result is currently held
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }
}

/// Stat a path, mapping the expected failures to `None`
pub fn stat_soft(
    fs: &impl DirectoryOps,
    path: &Path,
) -> Result<Option<PathMetadata>, ReconcileError> {
    match fs.stat(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(error) => classify(path, error),
    }
}

fn classify(path: &Path, error: io::Error) -> Result<Option<PathMetadata>, ReconcileError> {
    let errno = error.raw_os_error().map(Errno::from_raw);
    match errno {
        Some(Errno::ENOENT | Errno::ENOTDIR) => Ok(None),
        Some(Errno::EACCES) => {
            tracing::warn!("Could not stat '{}'; permission denied", path.display());
            Ok(None)
        }
        Some(Errno::EINVAL) => {
            tracing::warn!("Could not stat '{}'; invalid pathname", path.display());
            Ok(None)
        }
        _ if error.kind() == io::ErrorKind::NotFound => Ok(None),
        _ => Err(ReconcileError::Stat {
            path: path.to_path_buf(),
            source: error,
        }),
    }
}
