//! Error types for filepath
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Desired-state validation errors
///
/// Raised while building a [`crate::core::resource::ManagedPath`], never
/// during filesystem operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No path was given
    #[error("Title or name must be provided")]
    MissingPath,

    /// Path is not absolute
    #[error("File paths must be fully qualified, not '{path}'")]
    RelativePath { path: String },

    /// Path walks upward through `..`
    #[error("File path '{path}' must not contain '..' components")]
    ParentComponent { path: String },

    /// Manage depth below one
    #[error("Managedepth must be a positive integer, not '{value}'")]
    ManageDepth { value: i64 },

    /// Empty owner or group
    #[error("{kind} must not be empty")]
    EmptyPrincipal { kind: &'static str },

    /// Mode string did not parse
    #[error("Invalid mode '{mode}': {source}")]
    Mode {
        mode: String,
        #[source]
        source: ModeError,
    },
}

/// Mode string parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModeError {
    /// Empty string
    #[error("mode must not be empty")]
    Empty,

    /// Numeric mode above 07777
    #[error("numeric mode {value:o} exceeds 7777")]
    OutOfRange { value: u32 },

    /// Symbolic clause not understood
    #[error("malformed symbolic clause '{clause}'")]
    MalformedClause { clause: String },
}

/// Unexpected account database failures
///
/// A name or id that simply does not exist is not an error; see
/// [`crate::core::identity::Lookup::NotFound`].
#[derive(Error, Debug)]
pub enum IdentityError {
    /// User database lookup aborted
    #[error("Failed to look up user '{value}': {source}")]
    User {
        value: String,
        #[source]
        source: std::io::Error,
    },

    /// Group database lookup aborted
    #[error("Failed to look up group '{value}': {source}")]
    Group {
        value: String,
        #[source]
        source: std::io::Error,
    },
}

/// Hierarchy reconciliation errors
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Attempted removal of `/`
    #[error("Refusing to remove the filesystem root")]
    RootRemoval,

    /// The requested target still has entries
    #[error("Directory '{path}' is not empty")]
    NotEmpty { path: PathBuf },

    /// Desired owner does not exist
    #[error("Could not find user '{name}'")]
    UnknownUser { name: String },

    /// Desired group does not exist
    #[error("Could not find group '{name}'")]
    UnknownGroup { name: String },

    /// Account database failure while resolving for a path
    #[error("Failed to resolve identity for '{path}': {source}")]
    Identity {
        path: PathBuf,
        #[source]
        source: IdentityError,
    },

    /// Stat failed for a reason other than absence
    #[error("Could not stat '{path}': {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// mkdir failed
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// rmdir failed
    #[error("Failed to remove directory '{path}': {source}")]
    RemoveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// chown (owner) failed
    #[error("Failed to set owner to '{value}' on '{path}': {source}")]
    SetOwner {
        path: PathBuf,
        value: String,
        #[source]
        source: std::io::Error,
    },

    /// chown (group) failed
    #[error("Failed to set group to '{value}' on '{path}': {source}")]
    SetGroup {
        path: PathBuf,
        value: String,
        #[source]
        source: std::io::Error,
    },

    /// chmod failed, or the mode could not be interpreted
    #[error("failed to set mode {mode} on '{path}': {source}")]
    SetMode {
        path: PathBuf,
        mode: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Manifest loading errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Failed to read the manifest file
    #[error("Failed to read manifest '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the manifest file
    #[error("Failed to parse manifest: {source}")]
    Parse {
        #[source]
        source: toml::de::Error,
    },

    /// Resource failed validation
    #[error("Invalid resource #{index}: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: ValidationError,
    },

    /// Two resources name the same path
    #[error("Duplicate declaration for path '{path}'")]
    DuplicatePath { path: PathBuf },
}

/// Top-level filepath error type
#[derive(Error, Debug)]
pub enum FilepathError {
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Reconcile error
    #[error("{0}")]
    Reconcile(#[from] ReconcileError),

    /// Manifest error
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Global configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::core::global_config::GlobalConfigError),
}
