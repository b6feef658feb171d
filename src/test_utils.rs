//! Test utilities
//!
//! Proptest generators plus in-memory stand-ins for the filesystem and the
//! account database that record every call made against them.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a single path segment
    pub fn segment() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,8}"
    }

    /// Generate a normalised absolute path with one to six components
    pub fn absolute_path() -> impl Strategy<Value = String> {
        prop::collection::vec(segment(), 1..=6).prop_map(|parts| format!("/{}", parts.join("/")))
    }

    /// Generate a manage depth
    pub fn manage_depth() -> impl Strategy<Value = u32> {
        1u32..=8
    }

    /// Generate permission bits
    pub fn permission_bits() -> impl Strategy<Value = u32> {
        0u32..=0o7777
    }
}

#[cfg(test)]
pub mod fakes {
    use std::cell::{Cell, RefCell};
    use std::collections::{BTreeMap, HashMap};
    use std::io;
    use std::path::{Path, PathBuf};

    use nix::errno::Errno;

    use crate::core::chain::is_root;
    use crate::infra::accounts::AccountDatabase;
    use crate::infra::filesystem::{DirectoryOps, PathMetadata};

    /// A syscall made against [`FakeFs`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Op {
        Mkdir(PathBuf, Option<u32>),
        Rmdir(PathBuf),
        Chown(PathBuf, Option<u32>, Option<u32>),
        Chmod(PathBuf, u32),
    }

    #[derive(Debug, Clone, Copy)]
    struct Entry {
        meta: PathMetadata,
    }

    /// In-memory directory tree
    ///
    /// `/` always exists. New directories get mode 0755 unless one is given,
    /// and are owned by `default_owner`.
    #[derive(Debug)]
    pub struct FakeFs {
        entries: RefCell<BTreeMap<PathBuf, Entry>>,
        ops: RefCell<Vec<Op>>,
        failures: RefCell<HashMap<PathBuf, Errno>>,
        stat_failures: RefCell<HashMap<PathBuf, Errno>>,
        default_owner: Cell<(u32, u32)>,
    }

    impl FakeFs {
        pub fn new() -> Self {
            Self {
                entries: RefCell::new(BTreeMap::new()),
                ops: RefCell::new(Vec::new()),
                failures: RefCell::new(HashMap::new()),
                stat_failures: RefCell::new(HashMap::new()),
                default_owner: Cell::new((0, 0)),
            }
        }

        /// Pre-populate directories (and their parents)
        pub fn with_dirs(self, paths: &[&str]) -> Self {
            for path in paths {
                let mut current = PathBuf::new();
                for component in Path::new(path).components() {
                    current.push(component);
                    if !is_root(&current) {
                        self.insert(&current, 0o040_755, false);
                    }
                }
            }
            self
        }

        /// Pre-populate a regular file
        pub fn with_file(self, path: &str) -> Self {
            self.insert(Path::new(path), 0o100_644, true);
            self
        }

        /// Make every mutating call on `path` fail with `errno`
        pub fn fail_on(self, path: &str, errno: Errno) -> Self {
            self.failures.borrow_mut().insert(PathBuf::from(path), errno);
            self
        }

        /// Make stat on `path` fail with `errno`
        pub fn fail_stat(self, path: &str, errno: Errno) -> Self {
            self.stat_failures
                .borrow_mut()
                .insert(PathBuf::from(path), errno);
            self
        }

        /// Owner and group given to entries created from now on
        pub fn owned_by(self, uid: u32, gid: u32) -> Self {
            self.default_owner.set((uid, gid));
            self
        }

        /// Overwrite the owner and group of an existing entry
        pub fn set_owner(&self, path: &str, uid: u32, gid: u32) {
            if let Some(entry) = self.entries.borrow_mut().get_mut(Path::new(path)) {
                entry.meta.uid = uid;
                entry.meta.gid = gid;
            }
        }

        /// Overwrite the permission bits of an existing entry
        pub fn set_mode(&self, path: &str, bits: u32) {
            if let Some(entry) = self.entries.borrow_mut().get_mut(Path::new(path)) {
                entry.meta.mode = (entry.meta.mode & !0o7777) | bits;
            }
        }

        pub fn contains(&self, path: &str) -> bool {
            self.entries.borrow().contains_key(Path::new(path))
        }

        pub fn meta(&self, path: &str) -> Option<PathMetadata> {
            self.entries.borrow().get(Path::new(path)).map(|e| e.meta)
        }

        /// Every mutating call made so far
        pub fn ops(&self) -> Vec<Op> {
            self.ops.borrow().clone()
        }

        pub fn clear_ops(&self) {
            self.ops.borrow_mut().clear();
        }

        fn insert(&self, path: &Path, mode: u32, is_file: bool) {
            let (uid, gid) = self.default_owner.get();
            self.entries.borrow_mut().insert(
                path.to_path_buf(),
                Entry {
                    meta: PathMetadata {
                        mode,
                        uid,
                        gid,
                        is_dir: !is_file,
                    },
                },
            );
        }

        fn injected(&self, path: &Path) -> io::Result<()> {
            match self.failures.borrow().get(path) {
                Some(errno) => Err(io::Error::from_raw_os_error(*errno as i32)),
                None => Ok(()),
            }
        }

        fn record(&self, op: Op) {
            self.ops.borrow_mut().push(op);
        }

        fn not_found() -> io::Error {
            io::Error::from_raw_os_error(Errno::ENOENT as i32)
        }
    }

    impl Default for FakeFs {
        fn default() -> Self {
            Self::new()
        }
    }

    impl DirectoryOps for FakeFs {
        fn stat(&self, path: &Path) -> io::Result<PathMetadata> {
            if let Some(errno) = self.stat_failures.borrow().get(path) {
                return Err(io::Error::from_raw_os_error(*errno as i32));
            }
            if is_root(path) {
                return Ok(PathMetadata {
                    mode: 0o040_755,
                    uid: 0,
                    gid: 0,
                    is_dir: true,
                });
            }
            self.entries
                .borrow()
                .get(path)
                .map(|e| e.meta)
                .ok_or_else(Self::not_found)
        }

        fn mkdir(&self, path: &Path, mode: Option<u32>) -> io::Result<()> {
            self.record(Op::Mkdir(path.to_path_buf(), mode));
            self.injected(path)?;
            if self.exists(path) {
                return Err(io::Error::from_raw_os_error(Errno::EEXIST as i32));
            }
            match path.parent() {
                Some(parent) if self.stat(parent).map(|m| m.is_dir).unwrap_or(false) => {}
                _ => return Err(Self::not_found()),
            }
            self.insert(path, 0o040_000 | mode.unwrap_or(0o755), false);
            Ok(())
        }

        fn rmdir(&self, path: &Path) -> io::Result<()> {
            self.record(Op::Rmdir(path.to_path_buf()));
            self.injected(path)?;
            if !self.entries.borrow().contains_key(path) {
                return Err(Self::not_found());
            }
            let has_children = self
                .entries
                .borrow()
                .keys()
                .any(|p| p.parent() == Some(path));
            if has_children {
                return Err(io::Error::from_raw_os_error(Errno::ENOTEMPTY as i32));
            }
            self.entries.borrow_mut().remove(path);
            Ok(())
        }

        fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
            self.record(Op::Chown(path.to_path_buf(), uid, gid));
            self.injected(path)?;
            let mut entries = self.entries.borrow_mut();
            let entry = entries.get_mut(path).ok_or_else(Self::not_found)?;
            if let Some(uid) = uid {
                entry.meta.uid = uid;
            }
            if let Some(gid) = gid {
                entry.meta.gid = gid;
            }
            Ok(())
        }

        fn chmod(&self, path: &Path, mode: u32) -> io::Result<()> {
            self.record(Op::Chmod(path.to_path_buf(), mode));
            self.injected(path)?;
            let mut entries = self.entries.borrow_mut();
            let entry = entries.get_mut(path).ok_or_else(Self::not_found)?;
            entry.meta.mode = (entry.meta.mode & !0o7777) | (mode & 0o7777);
            Ok(())
        }
    }

    /// In-memory passwd/group database that counts lookups
    #[derive(Debug, Default)]
    pub struct FakeAccounts {
        users: HashMap<String, u32>,
        groups: HashMap<String, u32>,
        failing: bool,
        lookups: Cell<usize>,
    }

    impl FakeAccounts {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_user(mut self, name: &str, uid: u32) -> Self {
            self.users.insert(name.to_string(), uid);
            self
        }

        pub fn with_group(mut self, name: &str, gid: u32) -> Self {
            self.groups.insert(name.to_string(), gid);
            self
        }

        /// Every lookup fails with EIO
        pub fn failing(mut self) -> Self {
            self.failing = true;
            self
        }

        pub fn lookups(&self) -> usize {
            self.lookups.get()
        }

        fn begin(&self) -> io::Result<()> {
            self.lookups.set(self.lookups.get() + 1);
            if self.failing {
                Err(io::Error::from_raw_os_error(Errno::EIO as i32))
            } else {
                Ok(())
            }
        }
    }

    impl AccountDatabase for FakeAccounts {
        fn uid_by_name(&self, name: &str) -> io::Result<Option<u32>> {
            self.begin()?;
            Ok(self.users.get(name).copied())
        }

        fn user_by_uid(&self, uid: u32) -> io::Result<Option<String>> {
            self.begin()?;
            Ok(self
                .users
                .iter()
                .find(|(_, id)| **id == uid)
                .map(|(name, _)| name.clone()))
        }

        fn gid_by_name(&self, name: &str) -> io::Result<Option<u32>> {
            self.begin()?;
            Ok(self.groups.get(name).copied())
        }

        fn group_by_gid(&self, gid: u32) -> io::Result<Option<String>> {
            self.begin()?;
            Ok(self
                .groups
                .iter()
                .find(|(_, id)| **id == gid)
                .map(|(name, _)| name.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;
    use std::path::Path;
    use crate::config::defaults::MIN_PROPTEST_ITERATIONS;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(MIN_PROPTEST_ITERATIONS))]

        #[test]
        fn test_absolute_path_generator(path in absolute_path()) {
            prop_assert!(path.starts_with('/'));
            prop_assert!(!path.ends_with('/'));
            prop_assert!(Path::new(&path).is_absolute());
        }

        #[test]
        fn test_manage_depth_generator(depth in manage_depth()) {
            prop_assert!(depth >= 1);
        }
    }
}
