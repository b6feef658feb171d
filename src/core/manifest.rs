//! Manifest (filepath.toml) parsing and validation
//!
//! A manifest declares any number of managed paths as `[[filepath]]` tables.
//! String values may reference environment variables using `${VAR}` syntax.

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::resource::{DesiredState, ManagedPath};
use crate::error::ManifestError;

/// A set of desired states
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Declared paths, in file order
    #[serde(default, rename = "filepath")]
    pub entries: Vec<DesiredState>,
}

impl Manifest {
    /// Load a manifest from a file
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a manifest, substituting `${VAR}` in every string value
    pub fn from_toml(content: &str) -> Result<Self, ManifestError> {
        let mut value: toml::Value =
            toml::from_str(content).map_err(|source| ManifestError::Parse { source })?;
        substitute_in_value(&mut value);
        value
            .try_into()
            .map_err(|source| ManifestError::Parse { source })
    }

    /// Validate every entry
    ///
    /// Fails on the first invalid entry, or when two entries name the same
    /// path after normalisation.
    pub fn resources(&self) -> Result<Vec<ManagedPath>, ManifestError> {
        let mut seen = HashSet::new();
        let mut resources = Vec::with_capacity(self.entries.len());

        for (index, entry) in self.entries.iter().enumerate() {
            let resource = ManagedPath::new(entry.clone())
                .map_err(|source| ManifestError::Invalid { index, source })?;
            if !seen.insert(resource.path().to_path_buf()) {
                return Err(ManifestError::DuplicatePath {
                    path: resource.path().to_path_buf(),
                });
            }
            resources.push(resource);
        }

        Ok(resources)
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env var regex")
    })
}

/// Substitute environment variables in a string using `${VAR}` syntax
///
/// Unset variables expand to the empty string.
///
/// ```
/// use filepath::core::manifest::substitute_env_vars;
///
/// std::env::set_var("FILEPATH_DOC_ROOT", "/srv");
/// assert_eq!(substitute_env_vars("${FILEPATH_DOC_ROOT}/app"), "/srv/app");
/// std::env::remove_var("FILEPATH_DOC_ROOT");
/// ```
pub fn substitute_env_vars(input: &str) -> String {
    env_var_pattern()
        .replace_all(input, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

fn substitute_in_value(value: &mut toml::Value) {
    match value {
        toml::Value::String(s) => *s = substitute_env_vars(s),
        toml::Value::Array(items) => items.iter_mut().for_each(substitute_in_value),
        toml::Value::Table(table) => table
            .iter_mut()
            .for_each(|(_, v)| substitute_in_value(v)),
        _ => {}
    }
}
