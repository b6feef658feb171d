//! Default configuration values

/// Number of hierarchy levels managed when none is given
pub const DEFAULT_MANAGE_DEPTH: u32 = 1;

/// Highest uid/gid considered valid
///
/// Anything above this is a negative id that the platform reported as a large
/// unsigned value.
pub const DEFAULT_MAXIMUM_UID: u32 = 4_294_967_290;

/// Permission bits a symbolic mode is resolved against when creating
pub const DEFAULT_CREATE_MODE: u32 = 0o755;

/// Name of the global configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
