//! Integration tests for global configuration
//!
//! - Reads config.toml from the config directory
//! - Settings cover the identity ceiling and output preferences

use filepath::config::defaults::DEFAULT_MAXIMUM_UID;
use filepath::core::global_config::{GlobalConfig, GlobalConfigError};
use tempfile::TempDir;

#[test]
fn test_global_config_loads_from_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
[identity]
maximum_uid = 65533

[output]
quiet = false
json = true
"#,
    )
    .expect("Failed to write config file");

    let config = GlobalConfig::load_from_path(&config_path).expect("Failed to load global config");

    assert_eq!(config.identity.maximum_uid, Some(65533));
    assert_eq!(config.maximum_uid(), 65533);
    assert_eq!(config.output.quiet, Some(false));
    assert_eq!(config.output.json, Some(true));
}

#[test]
fn test_global_config_defaults_when_missing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let config = GlobalConfig::load_from_path(&temp_dir.path().join("config.toml"))
        .expect("Missing config should give defaults");

    assert_eq!(config.maximum_uid(), DEFAULT_MAXIMUM_UID);
    assert!(config.output.quiet.is_none());
}

#[test]
fn test_global_config_partial_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "[output]\nquiet = true\n").expect("Failed to write config file");

    let config = GlobalConfig::load_from_path(&config_path).expect("Failed to load global config");

    assert_eq!(config.output.quiet, Some(true));
    assert_eq!(config.maximum_uid(), DEFAULT_MAXIMUM_UID);
}

#[test]
fn test_global_config_invalid_toml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "[identity\nmaximum_uid = ").expect("Failed to write config file");

    let err = GlobalConfig::load_from_path(&config_path).unwrap_err();

    assert!(matches!(err, GlobalConfigError::ParseError { .. }));
}

#[test]
fn test_global_config_rejects_negative_ceiling() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "[identity]\nmaximum_uid = -1\n").expect("Failed to write config file");

    assert!(GlobalConfig::load_from_path(&config_path).is_err());
}
