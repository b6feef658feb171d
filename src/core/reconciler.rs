//! Hierarchy reconciliation
//!
//! Drives one [`ManagedPath`] towards its desired state: creates the
//! directory and any missing parents, removes it together with up to
//! `manage_depth - 1` emptied ancestors, and applies owner, group and mode to
//! every managed level.
//!
//! Writes walk the ancestor chain parent-first, so a failure deep in the
//! chain leaves the shallower levels already converged. Nothing is rolled
//! back.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::defaults::DEFAULT_CREATE_MODE;
use crate::core::chain::{is_root, missing_ancestors};
use crate::core::identity::{IdentityResolver, Lookup, Principal};
use crate::core::mode::{format_mode, Mode};
use crate::core::resource::{Ensure, ManagedPath};
use crate::core::snapshot::{stat_soft, StatCache};
use crate::error::ReconcileError;
use crate::infra::accounts::{self, AccountDatabase, SystemAccounts};
use crate::infra::filesystem::{is_not_empty, DirectoryOps, PosixFs};

/// Lifecycle state as seen through the current snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// No snapshot taken this cycle
    Unknown,
    /// Target does not exist
    Absent,
    /// Target exists
    Present,
}

/// Result of a create, update or destroy call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The target (and any missing parents) were created
    DirectoryCreated,
    /// The target (and possibly ancestors) were removed
    DirectoryRemoved,
    /// At least one attribute changed
    Updated,
    /// Nothing needed doing
    InSync,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectoryCreated => write!(f, "directory created"),
            Self::DirectoryRemoved => write!(f, "directory removed"),
            Self::Updated => write!(f, "updated"),
            Self::InSync => write!(f, "in sync"),
        }
    }
}

/// A single filesystem mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Change {
    /// mkdir
    CreateDir { path: PathBuf, mode: Option<String> },
    /// rmdir
    RemoveDir { path: PathBuf },
    /// chown of the owner
    Owner { path: PathBuf, uid: u32 },
    /// chown of the group
    Group { path: PathBuf, gid: u32 },
    /// chmod
    Mode { path: PathBuf, from: String, to: String },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDir { path, mode: Some(mode) } => {
                write!(f, "created {} (mode {mode})", path.display())
            }
            Self::CreateDir { path, mode: None } => write!(f, "created {}", path.display()),
            Self::RemoveDir { path } => write!(f, "removed {}", path.display()),
            Self::Owner { path, uid } => write!(f, "owner of {} set to {uid}", path.display()),
            Self::Group { path, gid } => write!(f, "group of {} set to {gid}", path.display()),
            Self::Mode { path, from, to } => {
                write!(f, "mode of {} changed {from} -> {to}", path.display())
            }
        }
    }
}

/// A current attribute value read from the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum Current<T> {
    /// The target does not exist
    Absent,
    /// Id above the configured maximum, most likely a negative id
    Invalid(u32),
    /// The value on disk
    Value(T),
}

/// A resolved owner or group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// Numeric id
    pub id: u32,
    /// Name, when the id resolves
    pub name: Option<String>,
}

/// What an [`Reconciler::apply`] call did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Target path
    pub path: PathBuf,
    /// Overall outcome
    pub outcome: Outcome,
    /// Mutations performed, in order
    pub changes: Vec<Change>,
}

/// Reconciles one managed path
#[derive(Debug)]
pub struct Reconciler<F = PosixFs, A = SystemAccounts> {
    resource: ManagedPath,
    fs: F,
    identity: IdentityResolver<A>,
    snapshot: StatCache,
    privileged: bool,
    warned_unprivileged: bool,
    changes: Vec<Change>,
}

impl Reconciler<PosixFs, SystemAccounts> {
    /// Reconciler over the real filesystem and account databases
    pub fn system(resource: ManagedPath, maximum_uid: u32) -> Self {
        Self::new(resource, PosixFs, SystemAccounts, maximum_uid)
    }
}

impl<F: DirectoryOps, A: AccountDatabase> Reconciler<F, A> {
    /// Create a reconciler
    ///
    /// Whether ownership may be changed is taken from the effective uid.
    pub fn new(resource: ManagedPath, fs: F, accounts: A, maximum_uid: u32) -> Self {
        Self {
            resource,
            fs,
            identity: IdentityResolver::new(accounts, maximum_uid),
            snapshot: StatCache::default(),
            privileged: accounts::is_privileged(),
            warned_unprivileged: false,
            changes: Vec::new(),
        }
    }

    /// Override whether ownership changes are attempted during sync
    #[must_use]
    pub fn privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    /// The managed resource
    pub fn resource(&self) -> &ManagedPath {
        &self.resource
    }

    /// The managed resource, for changing desired owner, group or mode
    pub fn resource_mut(&mut self) -> &mut ManagedPath {
        &mut self.resource
    }

    /// The filesystem in use
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Start a new reconciliation cycle
    ///
    /// Drops the snapshot, the identity cache and the change log.
    pub fn begin_cycle(&mut self) {
        self.snapshot.invalidate();
        self.identity.clear();
        self.changes.clear();
    }

    /// Mark the snapshot stale so the next read re-stats the target
    pub fn invalidate(&mut self) {
        self.snapshot.invalidate();
    }

    /// Lifecycle state according to the snapshot, without stat'ing
    pub fn state(&self) -> LifecycleState {
        match self.snapshot {
            StatCache::Cached(Some(_)) => LifecycleState::Present,
            StatCache::Cached(None) => LifecycleState::Absent,
            StatCache::Uninitialized | StatCache::Invalidated => LifecycleState::Unknown,
        }
    }

    /// Whether the target exists
    pub fn exists(&mut self) -> Result<bool, ReconcileError> {
        Ok(self
            .snapshot
            .get(&self.fs, self.resource.path())?
            .is_some())
    }

    /// Mutations made since the cycle began
    pub fn take_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }

    /// Bring the target to its desired state
    ///
    /// Starts a new cycle, then creates, updates or destroys depending on
    /// the desired and current existence.
    pub fn apply(&mut self) -> Result<ApplyReport, ReconcileError> {
        self.begin_cycle();
        let exists = self.exists()?;

        let outcome = match (self.resource.ensure(), exists) {
            (Ensure::Present, false) => self.create()?,
            (Ensure::Present, true) => self.update()?,
            (Ensure::Absent, true) => self.destroy()?,
            (Ensure::Absent, false) => Outcome::InSync,
        };

        Ok(ApplyReport {
            path: self.resource.path().to_path_buf(),
            outcome,
            changes: self.take_changes(),
        })
    }

    /// Create the target and every missing parent
    ///
    /// Parents are created outermost first. The desired mode is applied at
    /// creation time only to directories inside the managed window; anything
    /// above it gets default permissions. Owner, group and mode are then
    /// synchronised across all managed levels. A target that is already a
    /// directory only gets that synchronisation.
    pub fn create(&mut self) -> Result<Outcome, ReconcileError> {
        let mode = self.resource.mode().cloned();
        let plan = missing_ancestors(self.resource.path(), self.resource.manage_depth(), |p| {
            self.fs.stat(p).is_ok_and(|meta| meta.is_dir)
        });
        if plan.is_empty() {
            return self.update();
        }

        for (dir, remaining) in plan {
            let bits = mode
                .as_ref()
                .filter(|_| remaining >= 1)
                .map(|m| m.resolve(DEFAULT_CREATE_MODE, true));

            self.fs
                .mkdir(&dir, bits)
                .map_err(|source| ReconcileError::CreateDir {
                    path: dir.clone(),
                    source,
                })?;
            tracing::info!("Created directory '{}'", dir.display());
            self.changes.push(Change::CreateDir {
                path: dir,
                mode: bits.map(format_mode),
            });
        }

        self.snapshot.invalidate();
        self.sync_properties()?;
        Ok(Outcome::DirectoryCreated)
    }

    /// Converge owner, group and mode on every managed level
    pub fn update(&mut self) -> Result<Outcome, ReconcileError> {
        let before = self.changes.len();
        self.sync_properties()?;
        Ok(if self.changes.len() > before {
            Outcome::Updated
        } else {
            Outcome::InSync
        })
    }

    /// Remove the target and up to `manage_depth - 1` ancestors
    ///
    /// The target must be empty. An ancestor that is not empty once its
    /// child is gone ends the walk quietly.
    pub fn destroy(&mut self) -> Result<Outcome, ReconcileError> {
        if is_root(self.resource.path()) {
            return Err(ReconcileError::RootRemoval);
        }

        let chain = self.resource.chain();
        for (index, level) in chain.leaf_to_root().enumerate() {
            match self.fs.rmdir(level) {
                Ok(()) => {
                    tracing::info!("Removed directory '{}'", level.display());
                    self.changes.push(Change::RemoveDir {
                        path: level.to_path_buf(),
                    });
                }
                Err(error) if index > 0 && is_not_empty(&error) => {
                    tracing::debug!(
                        "Stopping at '{}': still has other entries",
                        level.display()
                    );
                    break;
                }
                Err(error) if is_not_empty(&error) => {
                    self.snapshot.invalidate();
                    return Err(ReconcileError::NotEmpty {
                        path: level.to_path_buf(),
                    });
                }
                Err(source) => {
                    self.snapshot.invalidate();
                    return Err(ReconcileError::RemoveDir {
                        path: level.to_path_buf(),
                        source,
                    });
                }
            }
        }

        self.snapshot.invalidate();
        Ok(Outcome::DirectoryRemoved)
    }

    /// Set the owner on every managed level
    pub fn set_owner(&mut self, value: &Principal) -> Result<(), ReconcileError> {
        let uid = self.resolve_uid(value)?;
        self.apply_owner(value, uid, false)
    }

    /// Set the group on every managed level
    pub fn set_group(&mut self, value: &Principal) -> Result<(), ReconcileError> {
        let gid = self.resolve_gid(value)?;
        self.apply_group(value, gid)
    }

    /// Set the mode on every managed level
    ///
    /// An unparsable mode fails the same way a failed chmod does.
    pub fn set_mode(&mut self, value: &str) -> Result<(), ReconcileError> {
        let mode = Mode::parse(value).map_err(|source| ReconcileError::SetMode {
            path: self.resource.path().to_path_buf(),
            mode: value.to_string(),
            source: Box::new(source),
        })?;
        self.apply_mode(&mode)
    }

    /// Current owner of the target
    pub fn current_owner(&mut self) -> Result<Current<Account>, ReconcileError> {
        let Some(meta) = self.snapshot.get(&self.fs, self.resource.path())? else {
            return Ok(Current::Absent);
        };
        if self.identity.exceeds_maximum(meta.uid) {
            tracing::warn!(
                "Apparently using negative UID ({}) on a platform that does not consistently handle them",
                meta.uid
            );
            return Ok(Current::Invalid(meta.uid));
        }
        let name = self
            .identity
            .uid_to_name(&Principal::Id(meta.uid))
            .map_err(|source| self.identity_error(source))?
            .found();
        Ok(Current::Value(Account { id: meta.uid, name }))
    }

    /// Current group of the target
    pub fn current_group(&mut self) -> Result<Current<Account>, ReconcileError> {
        let Some(meta) = self.snapshot.get(&self.fs, self.resource.path())? else {
            return Ok(Current::Absent);
        };
        if self.identity.exceeds_maximum(meta.gid) {
            tracing::warn!(
                "Apparently using negative GID ({}) on a platform that does not consistently handle them",
                meta.gid
            );
            return Ok(Current::Invalid(meta.gid));
        }
        let name = self
            .identity
            .gid_to_name(&Principal::Id(meta.gid))
            .map_err(|source| self.identity_error(source))?
            .found();
        Ok(Current::Value(Account { id: meta.gid, name }))
    }

    /// Current mode of the target, as four octal digits
    pub fn current_mode(&mut self) -> Result<Current<String>, ReconcileError> {
        Ok(
            match self.snapshot.get(&self.fs, self.resource.path())? {
                Some(meta) => Current::Value(format_mode(meta.mode)),
                None => Current::Absent,
            },
        )
    }

    fn sync_properties(&mut self) -> Result<(), ReconcileError> {
        if let Some(owner) = self.resource.owner().cloned() {
            let uid = self.resolve_uid(&owner)?;
            self.apply_owner(&owner, uid, true)?;
        }
        if let Some(group) = self.resource.group().cloned() {
            let gid = self.resolve_gid(&group)?;
            self.apply_group(&group, gid)?;
        }
        if let Some(mode) = self.resource.mode().cloned() {
            self.apply_mode(&mode)?;
        }
        Ok(())
    }

    fn apply_owner(
        &mut self,
        value: &Principal,
        uid: u32,
        require_privilege: bool,
    ) -> Result<(), ReconcileError> {
        let chain = self.resource.chain();
        for level in chain.root_to_leaf() {
            let current = stat_soft(&self.fs, level)?;
            if current.is_some_and(|meta| meta.uid == uid) {
                tracing::debug!("Owner of '{}' already {uid}", level.display());
                continue;
            }
            if require_privilege && !self.privileged {
                if !self.warned_unprivileged {
                    tracing::warn!("Cannot manage ownership unless running as root");
                    self.warned_unprivileged = true;
                }
                return Ok(());
            }

            self.fs
                .chown(level, Some(uid), None)
                .map_err(|source| ReconcileError::SetOwner {
                    path: level.to_path_buf(),
                    value: value.to_string(),
                    source,
                })?;
            tracing::info!("Set owner of '{}' to {value}", level.display());
            self.changes.push(Change::Owner {
                path: level.to_path_buf(),
                uid,
            });
        }
        self.snapshot.invalidate();
        Ok(())
    }

    fn apply_group(&mut self, value: &Principal, gid: u32) -> Result<(), ReconcileError> {
        let chain = self.resource.chain();
        for level in chain.root_to_leaf() {
            let current = stat_soft(&self.fs, level)?;
            if current.is_some_and(|meta| meta.gid == gid) {
                tracing::debug!("Group of '{}' already {gid}", level.display());
                continue;
            }

            self.fs
                .chown(level, None, Some(gid))
                .map_err(|source| ReconcileError::SetGroup {
                    path: level.to_path_buf(),
                    value: value.to_string(),
                    source,
                })?;
            tracing::info!("Set group of '{}' to {value}", level.display());
            self.changes.push(Change::Group {
                path: level.to_path_buf(),
                gid,
            });
        }
        self.snapshot.invalidate();
        Ok(())
    }

    fn apply_mode(&mut self, mode: &Mode) -> Result<(), ReconcileError> {
        let chain = self.resource.chain();
        for level in chain.root_to_leaf() {
            let current = stat_soft(&self.fs, level)?;
            let (bits, is_dir) =
                current.map_or((0, true), |meta| (meta.permissions(), meta.is_dir));
            let desired = mode.resolve(bits, is_dir);
            if current.is_some() && bits == desired {
                tracing::debug!("Mode of '{}' already {}", level.display(), format_mode(bits));
                continue;
            }

            self.fs
                .chmod(level, desired)
                .map_err(|source| ReconcileError::SetMode {
                    path: level.to_path_buf(),
                    mode: mode.to_string(),
                    source: Box::new(source),
                })?;
            tracing::info!(
                "Changed mode of '{}' from {} to {}",
                level.display(),
                format_mode(bits),
                format_mode(desired)
            );
            self.changes.push(Change::Mode {
                path: level.to_path_buf(),
                from: format_mode(bits),
                to: format_mode(desired),
            });
        }
        self.snapshot.invalidate();
        Ok(())
    }

    fn resolve_uid(&mut self, value: &Principal) -> Result<u32, ReconcileError> {
        match self
            .identity
            .name_to_uid(value)
            .map_err(|source| self.identity_error(source))?
        {
            Lookup::Found(uid) => Ok(uid),
            Lookup::NotFound | Lookup::Invalid => Err(ReconcileError::UnknownUser {
                name: value.to_string(),
            }),
        }
    }

    fn resolve_gid(&mut self, value: &Principal) -> Result<u32, ReconcileError> {
        match self
            .identity
            .name_to_gid(value)
            .map_err(|source| self.identity_error(source))?
        {
            Lookup::Found(gid) => Ok(gid),
            Lookup::NotFound | Lookup::Invalid => Err(ReconcileError::UnknownGroup {
                name: value.to_string(),
            }),
        }
    }

    fn identity_error(&self, source: crate::error::IdentityError) -> ReconcileError {
        ReconcileError::Identity {
            path: self.target().to_path_buf(),
            source,
        }
    }

    fn target(&self) -> &Path {
        self.resource.path()
    }
}
