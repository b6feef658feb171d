//! Filesystem operations
//!
//! Handles the directory syscalls the reconciler needs: stat, mkdir, rmdir,
//! chown and chmod. Every call is a single blocking syscall on one path.

use std::fs::DirBuilder;
use std::io;
use std::os::unix::fs::{DirBuilderExt, MetadataExt, PermissionsExt};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use nix::sys::stat::{umask, Mode};

/// Serialises umask changes between threads of one process
static UMASK_LOCK: Mutex<()> = Mutex::new(());

/// The parts of a path's metadata the reconciler looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathMetadata {
    /// Full `st_mode`, file type bits included
    pub mode: u32,
    /// Owner uid
    pub uid: u32,
    /// Group gid
    pub gid: u32,
    /// Whether the path is a directory
    pub is_dir: bool,
}

impl PathMetadata {
    /// Permission bits only
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }
}

/// Directory-level filesystem primitives
pub trait DirectoryOps {
    /// Stat a path, following symlinks
    fn stat(&self, path: &Path) -> io::Result<PathMetadata>;

    /// Whether anything exists at `path`
    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }

    /// Create one directory; with `Some(mode)` the permission bits are
    /// exactly `mode`, unaffected by the process umask
    fn mkdir(&self, path: &Path, mode: Option<u32>) -> io::Result<()>;

    /// Remove one empty directory
    fn rmdir(&self, path: &Path) -> io::Result<()>;

    /// Change owner and/or group; `None` leaves that id unchanged
    fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()>;

    /// Set permission bits
    fn chmod(&self, path: &Path, mode: u32) -> io::Result<()>;
}

impl<T: DirectoryOps + ?Sized> DirectoryOps for &T {
    fn stat(&self, path: &Path) -> io::Result<PathMetadata> {
        (**self).stat(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn mkdir(&self, path: &Path, mode: Option<u32>) -> io::Result<()> {
        (**self).mkdir(path, mode)
    }

    fn rmdir(&self, path: &Path) -> io::Result<()> {
        (**self).rmdir(path)
    }

    fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
        (**self).chown(path, uid, gid)
    }

    fn chmod(&self, path: &Path, mode: u32) -> io::Result<()> {
        (**self).chmod(path, mode)
    }
}

/// The real POSIX filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixFs;

impl DirectoryOps for PosixFs {
    fn stat(&self, path: &Path) -> io::Result<PathMetadata> {
        let meta = std::fs::metadata(path)?;
        Ok(PathMetadata {
            mode: meta.mode(),
            uid: meta.uid(),
            gid: meta.gid(),
            is_dir: meta.is_dir(),
        })
    }

    fn mkdir(&self, path: &Path, mode: Option<u32>) -> io::Result<()> {
        match mode {
            Some(mode) => {
                let _lock = UMASK_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
                mkdir_exact(path, mode)
            }
            None => DirBuilder::new().create(path),
        }
    }

    fn rmdir(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir(path)
    }

    fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
        std::os::unix::fs::chown(path, uid, gid)
    }

    fn chmod(&self, path: &Path, mode: u32) -> io::Result<()> {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
    }
}

/// Create a directory with exactly `mode`; the caller holds `UMASK_LOCK`
fn mkdir_exact(path: &Path, mode: u32) -> io::Result<()> {
    let _guard = UmaskGuard::clear();
    DirBuilder::new().mode(mode).create(path)
}

/// Clears the process umask for its lifetime and restores the previous value
/// on drop, including when the guarded call fails
#[derive(Debug)]
struct UmaskGuard {
    previous: Mode,
}

impl UmaskGuard {
    fn clear() -> Self {
        Self {
            previous: umask(Mode::empty()),
        }
    }
}

impl Drop for UmaskGuard {
    fn drop(&mut self) {
        umask(self.previous);
    }
}

/// Whether an error means "directory not empty"
///
/// Some platforms report `EEXIST` instead of `ENOTEMPTY` from rmdir.
pub fn is_not_empty(error: &io::Error) -> bool {
    matches!(
        error.raw_os_error(),
        Some(code) if code == nix::errno::Errno::ENOTEMPTY as i32
            || code == nix::errno::Errno::EEXIST as i32
    )
}
