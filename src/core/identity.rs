//! Identity resolution
//!
//! Converts between symbolic user/group names and numeric ids. Results are
//! cached for the lifetime of a reconciliation cycle; [`IdentityResolver::clear`]
//! drops the cache so accounts created between cycles are picked up.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;
use crate::infra::accounts::AccountDatabase;

/// A user or group given either by name or by numeric id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Principal {
    /// Numeric id
    Id(u32),
    /// Symbolic name
    Name(String),
}

impl Principal {
    /// Interpret a string: all digits is an id, anything else a name
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = value.parse() {
                return Self::Id(id);
            }
        }
        Self::Name(value.to_string())
    }

    /// Normalise a deserialized value (`"503"` becomes `Id(503)`)
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Name(name) => Self::parse(&name),
            id @ Self::Id(_) => id,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<u32> for Principal {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for Principal {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// Outcome of a lookup
///
/// Keeps "does not exist" apart from "not a valid id at all".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Resolved
    Found(T),
    /// No such user or group
    NotFound,
    /// Id above the configured maximum
    Invalid,
}

impl<T> Lookup<T> {
    /// The resolved value, if any
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound | Self::Invalid => None,
        }
    }

    /// Whether the lookup resolved
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Namespace {
    User,
    Group,
}

/// Cached, bidirectional name/id resolver for users and groups
#[derive(Debug)]
pub struct IdentityResolver<A> {
    accounts: A,
    maximum_id: u32,
    ids: HashMap<(Namespace, String), Option<u32>>,
    names: HashMap<(Namespace, u32), Option<String>>,
}

impl<A: AccountDatabase> IdentityResolver<A> {
    /// Create a resolver over an account database
    pub fn new(accounts: A, maximum_id: u32) -> Self {
        Self {
            accounts,
            maximum_id,
            ids: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Highest id considered valid
    pub fn maximum_id(&self) -> u32 {
        self.maximum_id
    }

    /// Whether a raw id from the filesystem is above the ceiling
    pub fn exceeds_maximum(&self, id: u32) -> bool {
        id > self.maximum_id
    }

    /// Drop all cached lookups
    pub fn clear(&mut self) {
        self.ids.clear();
        self.names.clear();
    }

    /// Resolve a user to its uid
    ///
    /// Numeric values are returned as they are, without range checks.
    pub fn name_to_uid(&mut self, value: &Principal) -> Result<Lookup<u32>, IdentityError> {
        self.name_to_id(Namespace::User, value)
    }

    /// Resolve a group to its gid
    pub fn name_to_gid(&mut self, value: &Principal) -> Result<Lookup<u32>, IdentityError> {
        self.name_to_id(Namespace::Group, value)
    }

    /// Resolve a user to its name
    ///
    /// Names pass through unchanged; ids above the maximum are `Invalid`
    /// without a lookup.
    pub fn uid_to_name(&mut self, value: &Principal) -> Result<Lookup<String>, IdentityError> {
        self.id_to_name(Namespace::User, value)
    }

    /// Resolve a group to its name
    pub fn gid_to_name(&mut self, value: &Principal) -> Result<Lookup<String>, IdentityError> {
        self.id_to_name(Namespace::Group, value)
    }

    fn name_to_id(
        &mut self,
        namespace: Namespace,
        value: &Principal,
    ) -> Result<Lookup<u32>, IdentityError> {
        let name = match value {
            Principal::Id(id) => return Ok(Lookup::Found(*id)),
            Principal::Name(name) => name,
        };

        let key = (namespace, name.clone());
        let resolved = if let Some(cached) = self.ids.get(&key) {
            *cached
        } else {
            let resolved = match namespace {
                Namespace::User => self.accounts.uid_by_name(name).map_err(|source| {
                    IdentityError::User {
                        value: name.clone(),
                        source,
                    }
                })?,
                Namespace::Group => self.accounts.gid_by_name(name).map_err(|source| {
                    IdentityError::Group {
                        value: name.clone(),
                        source,
                    }
                })?,
            };
            tracing::debug!("Resolved {namespace:?} '{name}' to {resolved:?}");
            self.ids.insert(key, resolved);
            resolved
        };

        Ok(resolved.map_or(Lookup::NotFound, Lookup::Found))
    }

    fn id_to_name(
        &mut self,
        namespace: Namespace,
        value: &Principal,
    ) -> Result<Lookup<String>, IdentityError> {
        let id = match value {
            Principal::Id(id) if self.exceeds_maximum(*id) => return Ok(Lookup::Invalid),
            Principal::Id(id) => *id,
            Principal::Name(name) => return Ok(Lookup::Found(name.clone())),
        };

        let key = (namespace, id);
        let resolved = if let Some(cached) = self.names.get(&key) {
            cached.clone()
        } else {
            let resolved = match namespace {
                Namespace::User => {
                    self.accounts
                        .user_by_uid(id)
                        .map_err(|source| IdentityError::User {
                            value: id.to_string(),
                            source,
                        })?
                }
                Namespace::Group => {
                    self.accounts
                        .group_by_gid(id)
                        .map_err(|source| IdentityError::Group {
                            value: id.to_string(),
                            source,
                        })?
                }
            };
            self.names.insert(key, resolved.clone());
            resolved
        };

        Ok(resolved.map_or(Lookup::NotFound, Lookup::Found))
    }
}
