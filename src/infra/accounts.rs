//! User and group database lookups
//!
//! Thin wrapper over the system passwd/group databases. A name or id that does
//! not exist is `Ok(None)`; only a failing backend is an error.

use std::io;

use nix::errno::Errno;
use nix::unistd::{Gid, Group, Uid, User};

/// Account database seam
pub trait AccountDatabase {
    /// uid for a user name
    fn uid_by_name(&self, name: &str) -> io::Result<Option<u32>>;

    /// User name for a uid
    fn user_by_uid(&self, uid: u32) -> io::Result<Option<String>>;

    /// gid for a group name
    fn gid_by_name(&self, name: &str) -> io::Result<Option<u32>>;

    /// Group name for a gid
    fn group_by_gid(&self, gid: u32) -> io::Result<Option<String>>;
}

impl<T: AccountDatabase + ?Sized> AccountDatabase for &T {
    fn uid_by_name(&self, name: &str) -> io::Result<Option<u32>> {
        (**self).uid_by_name(name)
    }

    fn user_by_uid(&self, uid: u32) -> io::Result<Option<String>> {
        (**self).user_by_uid(uid)
    }

    fn gid_by_name(&self, name: &str) -> io::Result<Option<u32>> {
        (**self).gid_by_name(name)
    }

    fn group_by_gid(&self, gid: u32) -> io::Result<Option<String>> {
        (**self).group_by_gid(gid)
    }
}

/// The system passwd and group databases
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAccounts;

impl AccountDatabase for SystemAccounts {
    fn uid_by_name(&self, name: &str) -> io::Result<Option<u32>> {
        not_found_as_none(User::from_name(name)).map(|user| user.map(|u| u.uid.as_raw()))
    }

    fn user_by_uid(&self, uid: u32) -> io::Result<Option<String>> {
        not_found_as_none(User::from_uid(Uid::from_raw(uid))).map(|user| user.map(|u| u.name))
    }

    fn gid_by_name(&self, name: &str) -> io::Result<Option<u32>> {
        not_found_as_none(Group::from_name(name)).map(|group| group.map(|g| g.gid.as_raw()))
    }

    fn group_by_gid(&self, gid: u32) -> io::Result<Option<String>> {
        not_found_as_none(Group::from_gid(Gid::from_raw(gid))).map(|group| group.map(|g| g.name))
    }
}

/// getpwnam(3) and friends may report a missing entry through errno
fn not_found_as_none<T>(result: nix::Result<Option<T>>) -> io::Result<Option<T>> {
    match result {
        Ok(found) => Ok(found),
        Err(Errno::ENOENT | Errno::ESRCH | Errno::EBADF | Errno::EPERM) => Ok(None),
        Err(errno) => Err(io::Error::from(errno)),
    }
}

/// Whether the process runs with an effective uid of root
pub fn is_privileged() -> bool {
    Uid::effective().is_root()
}

/// Effective uid and gid of the process
pub fn effective_ids() -> (u32, u32) {
    (Uid::effective().as_raw(), Gid::effective().as_raw())
}
