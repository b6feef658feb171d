//! Managed path resource
//!
//! A [`ManagedPath`] is one validated desired-state record: a directory, how
//! many levels of its hierarchy may be touched, and the owner, group and mode
//! those levels should carry.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::defaults::DEFAULT_MANAGE_DEPTH;
use crate::core::chain::AncestorChain;
use crate::core::identity::Principal;
use crate::core::mode::Mode;
use crate::error::ValidationError;

/// Desired existence state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    /// The directory should exist
    #[default]
    Present,
    /// The directory should not exist
    Absent,
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

/// Raw desired state as declared by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    /// Fully qualified directory path
    #[serde(default)]
    pub path: Option<String>,

    /// Whether the directory should exist
    #[serde(default)]
    pub ensure: Ensure,

    /// Desired owner
    #[serde(default)]
    pub owner: Option<Principal>,

    /// Desired group
    #[serde(default)]
    pub group: Option<Principal>,

    /// Desired mode
    #[serde(default)]
    pub mode: Option<String>,

    /// Number of hierarchy levels to manage
    #[serde(default)]
    pub managedepth: Option<i64>,
}

impl DesiredState {
    /// Desired state for a path with every other field defaulted
    pub fn for_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }
}

/// A validated managed path
///
/// `path` and `manage_depth` are fixed at construction; owner, group and mode
/// may be reassigned between reconciliation calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedPath {
    path: PathBuf,
    manage_depth: u32,
    ensure: Ensure,
    owner: Option<Principal>,
    group: Option<Principal>,
    mode: Option<Mode>,
}

impl ManagedPath {
    /// Validate a desired-state record
    pub fn new(desired: DesiredState) -> Result<Self, ValidationError> {
        let raw = desired.path.ok_or(ValidationError::MissingPath)?;
        let path = normalize_path(&raw)?;

        let manage_depth = match desired.managedepth {
            None => DEFAULT_MANAGE_DEPTH,
            Some(value) => u32::try_from(value)
                .ok()
                .filter(|depth| *depth >= 1)
                .ok_or(ValidationError::ManageDepth { value })?,
        };

        let mode = desired
            .mode
            .map(|mode| {
                Mode::parse(&mode).map_err(|source| ValidationError::Mode {
                    mode: mode.clone(),
                    source,
                })
            })
            .transpose()?;

        Ok(Self {
            path,
            manage_depth,
            ensure: desired.ensure,
            owner: desired.owner.map(|o| validate_principal(o, "Owner")).transpose()?,
            group: desired.group.map(|g| validate_principal(g, "Group")).transpose()?,
            mode,
        })
    }

    /// The target directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of managed hierarchy levels
    pub fn manage_depth(&self) -> u32 {
        self.manage_depth
    }

    /// Desired existence state
    pub fn ensure(&self) -> Ensure {
        self.ensure
    }

    /// Desired owner
    pub fn owner(&self) -> Option<&Principal> {
        self.owner.as_ref()
    }

    /// Desired group
    pub fn group(&self) -> Option<&Principal> {
        self.group.as_ref()
    }

    /// Desired mode
    pub fn mode(&self) -> Option<&Mode> {
        self.mode.as_ref()
    }

    /// The managed levels of this path
    pub fn chain(&self) -> AncestorChain {
        AncestorChain::new(&self.path, self.manage_depth)
    }

    /// Change the desired existence state
    pub fn set_ensure(&mut self, ensure: Ensure) {
        self.ensure = ensure;
    }

    /// Change the desired owner
    pub fn set_owner(&mut self, owner: Option<Principal>) -> Result<(), ValidationError> {
        self.owner = owner.map(|o| validate_principal(o, "Owner")).transpose()?;
        Ok(())
    }

    /// Change the desired group
    pub fn set_group(&mut self, group: Option<Principal>) -> Result<(), ValidationError> {
        self.group = group.map(|g| validate_principal(g, "Group")).transpose()?;
        Ok(())
    }

    /// Change the desired mode
    pub fn set_mode(&mut self, mode: Option<&str>) -> Result<(), ValidationError> {
        self.mode = mode
            .map(|mode| {
                Mode::parse(mode).map_err(|source| ValidationError::Mode {
                    mode: mode.to_string(),
                    source,
                })
            })
            .transpose()?;
        Ok(())
    }
}

fn validate_principal(value: Principal, kind: &'static str) -> Result<Principal, ValidationError> {
    match value.normalized() {
        Principal::Name(name) if name.is_empty() => Err(ValidationError::EmptyPrincipal { kind }),
        value => Ok(value),
    }
}

/// Check that a path is absolute and strip redundant separators
fn normalize_path(raw: &str) -> Result<PathBuf, ValidationError> {
    let path = Path::new(raw);
    if !path.is_absolute() {
        return Err(ValidationError::RelativePath {
            path: raw.to_string(),
        });
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(ValidationError::ParentComponent {
            path: raw.to_string(),
        });
    }
    Ok(path.components().collect())
}
