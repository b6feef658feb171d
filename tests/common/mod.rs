//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use filepath::core::reconciler::Reconciler;
use filepath::core::resource::{DesiredState, ManagedPath};
use filepath::config::defaults::DEFAULT_MAXIMUM_UID;
use tempfile::TempDir;

/// Temporary directory tree
///
/// Every path handed out is absolute, so it can be used as a managed path
/// directly.
pub struct TestTree {
    /// Root of the tree
    pub dir: TempDir,
}

impl TestTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Root of the tree
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Absolute path of `rel` inside the tree
    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Absolute path of `rel` as a string
    pub fn path_str(&self, rel: &str) -> String {
        self.join(rel).display().to_string()
    }

    /// Create a directory and its parents
    pub fn create_dir(&self, rel: &str) {
        std::fs::create_dir_all(self.join(rel)).expect("Failed to create directory");
    }

    /// Create a file, creating its parents first
    pub fn create_file(&self, rel: &str, content: &str) {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Whether `rel` exists
    pub fn exists(&self, rel: &str) -> bool {
        self.join(rel).exists()
    }

    /// Permission bits of `rel`
    pub fn mode(&self, rel: &str) -> u32 {
        mode_of(&self.join(rel))
    }

    /// Set permission bits of `rel`
    pub fn set_mode(&self, rel: &str, mode: u32) {
        std::fs::set_permissions(self.join(rel), std::fs::Permissions::from_mode(mode))
            .expect("Failed to set permissions");
    }

    /// Owner and group of `rel`
    pub fn owner(&self, rel: &str) -> (u32, u32) {
        let meta = std::fs::metadata(self.join(rel)).expect("Failed to stat");
        (meta.uid(), meta.gid())
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Permission bits of a path
pub fn mode_of(path: &Path) -> u32 {
    std::fs::metadata(path)
        .expect("Failed to stat")
        .permissions()
        .mode()
        & 0o7777
}

/// Desired state for an absolute path
pub fn desired(path: impl Into<String>) -> DesiredState {
    DesiredState::for_path(path)
}

/// Reconciler over the real filesystem
pub fn reconciler(desired: DesiredState) -> Reconciler {
    let resource = ManagedPath::new(desired).expect("valid desired state");
    Reconciler::system(resource, DEFAULT_MAXIMUM_UID)
}

/// Run the filepath binary with an isolated config directory
pub fn run_filepath(tree: &TestTree, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_filepath"));
    cmd.current_dir(tree.path());
    cmd.env("FILEPATH_CONFIG_DIR", tree.join(".config"));
    cmd.env_remove("RUST_LOG");
    for arg in args {
        cmd.arg(arg);
    }
    cmd.output().expect("Failed to execute filepath")
}

/// A user name that does not exist on any sane system
pub const MISSING_USER: &str = "filepath-test-no-such-user";
