//! Integration tests for manifest loading and application

mod common;

use common::TestTree;
use filepath::config::defaults::DEFAULT_MAXIMUM_UID;
use filepath::core::apply::apply_manifest;
use filepath::core::manifest::Manifest;
use filepath::core::reconciler::Outcome;
use filepath::core::resource::Ensure;
use filepath::error::ManifestError;

#[test]
fn test_load_missing_manifest() {
    let tree = TestTree::new();
    let err = Manifest::load(&tree.join("absent.toml")).unwrap_err();
    assert!(matches!(err, ManifestError::Read { .. }));
}

#[test]
fn test_load_and_apply() {
    let tree = TestTree::new();
    let manifest = format!(
        r#"
[[filepath]]
path = "{deep}"
mode = "0700"

[[filepath]]
path = "{shallow}"
mode = "0755"
"#,
        deep = tree.path_str("base/inner"),
        shallow = tree.path_str("base"),
    );
    tree.create_file("filepath.toml", &manifest);

    let manifest = Manifest::load(&tree.join("filepath.toml")).unwrap();
    let report = apply_manifest(&manifest, DEFAULT_MAXIMUM_UID).unwrap();

    assert!(report.is_success());
    assert_eq!(report.resources[0].path, tree.join("base"));
    assert_eq!(report.resources[0].outcome, Some(Outcome::DirectoryCreated));
    assert_eq!(tree.mode("base"), 0o755);
    assert_eq!(tree.mode("base/inner"), 0o700);
}

#[test]
fn test_environment_substitution_in_paths() {
    let tree = TestTree::new();
    std::env::set_var("FILEPATH_IT_MANIFEST_ROOT", tree.path());
    let manifest = Manifest::from_toml(
        "[[filepath]]\npath = \"${FILEPATH_IT_MANIFEST_ROOT}/env\"\nensure = \"present\"",
    )
    .unwrap();
    std::env::remove_var("FILEPATH_IT_MANIFEST_ROOT");

    let resources = manifest.resources().unwrap();
    assert_eq!(resources[0].path(), tree.join("env"));
    assert_eq!(resources[0].ensure(), Ensure::Present);

    apply_manifest(&manifest, DEFAULT_MAXIMUM_UID).unwrap();
    assert!(tree.exists("env"));
}

#[test]
fn test_invalid_entry_applies_nothing() {
    let tree = TestTree::new();
    let manifest = Manifest::from_toml(&format!(
        "[[filepath]]\npath = \"{}\"\n\n[[filepath]]\npath = \"{}\"\nmode = \"rwxrwxrwx\"\n",
        tree.path_str("ok"),
        tree.path_str("bad")
    ))
    .unwrap();

    let err = apply_manifest(&manifest, DEFAULT_MAXIMUM_UID).unwrap_err();

    assert!(matches!(err, ManifestError::Invalid { index: 1, .. }));
    assert!(!tree.exists("ok"));
}
