//! `init` bootstrap and config lookup integration tests.

use assert_fs::prelude::*;
use bumbo_core::{
    config::BumboConfig,
    project::{self, ProjectLayout},
    CoreError,
};
use predicates::prelude::predicate;
use std::fs;

// ---------------------------------------------------------------------------
// 1. init
// ---------------------------------------------------------------------------

#[test]
fn init_without_forceignore_fails() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let err = project::init_at(&ProjectLayout::new(root.path())).unwrap_err();
    assert!(matches!(err, CoreError::ForceIgnoreMissing { .. }), "got: {err}");
    assert_eq!(err.code(), "ForceIgnoreMissing");
    root.child(".bumbo").assert(predicate::path::missing());
}

#[test]
fn init_appends_both_staging_globs() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child(".forceignore").write_str("**/jsconfig.json").unwrap();

    let report = project::init_at(&ProjectLayout::new(root.path())).expect("init");
    assert_eq!(report.appended, vec!["*.tmp".to_string(), "*.dtmp".to_string()]);
    assert!(report.config_written);

    let contents = fs::read_to_string(root.path().join(".forceignore")).unwrap();
    assert_eq!(contents, "**/jsconfig.json\n*.tmp\n*.dtmp\n");
    root.child(".bumbo/init").assert(predicate::path::exists());
    root.child(".bumbo/config.yaml").assert(predicate::path::exists());
}

#[test]
fn init_is_idempotent() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child(".forceignore").write_str("*.tmp\n").unwrap();
    let layout = ProjectLayout::new(root.path());

    let first = project::init_at(&layout).expect("first init");
    assert_eq!(first.appended, vec!["*.dtmp".to_string()]);
    let second = project::init_at(&layout).expect("second init");
    assert!(second.appended.is_empty());
    assert!(!second.config_written);

    let contents = fs::read_to_string(root.path().join(".forceignore")).unwrap();
    assert_eq!(contents.matches("*.tmp").count(), 1);
    assert_eq!(contents.matches("*.dtmp").count(), 1);
}

#[test]
fn default_config_written_by_init_loads_as_defaults() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child(".forceignore").touch().unwrap();
    project::init_at(&ProjectLayout::new(root.path())).expect("init");

    let config = BumboConfig::from_file(&root.path().join(".bumbo/config.yaml")).expect("load");
    assert_eq!(config, BumboConfig::default());
}

// ---------------------------------------------------------------------------
// 2. config lookup
// ---------------------------------------------------------------------------

#[test]
fn project_config_wins_over_user_config() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let home = assert_fs::TempDir::new().expect("tempdir");
    root.child(".bumbo/config.yaml")
        .write_str("sfdx_bin: /project/sfdx\n")
        .unwrap();
    home.child(".bumbo/config.yaml")
        .write_str("sfdx_bin: /home/sfdx\n")
        .unwrap();

    let config = BumboConfig::load_at(root.path(), Some(home.path())).expect("load");
    assert_eq!(config.sfdx_bin, "/project/sfdx");
}

#[test]
fn user_config_used_when_project_has_none() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".bumbo/config.yaml")
        .write_str("package_dir: src\n")
        .unwrap();

    let config = BumboConfig::load_at(root.path(), Some(home.path())).expect("load");
    assert_eq!(config.layout(root.path()).package_dir, root.path().join("src"));
}

#[test]
fn user_merge_tool_survives_init() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let home = assert_fs::TempDir::new().expect("tempdir");
    root.child(".forceignore").touch().unwrap();
    home.child(".bumbo/config.yaml")
        .write_str("merge_tool: /opt/kdiff3\ntarget_org: dev\n")
        .unwrap();

    project::init_at(&ProjectLayout::new(root.path())).expect("init");
    root.child(".bumbo/config.yaml").assert(predicate::path::exists());

    let config = BumboConfig::load_at(root.path(), Some(home.path())).expect("load");
    assert_eq!(config.target_org.as_deref(), Some("dev"));
    if std::env::var_os(bumbo_core::config::MERGE_TOOL_ENV).is_none() {
        assert_eq!(
            config.merge_tool,
            Some(std::path::PathBuf::from("/opt/kdiff3"))
        );
    }
}

#[test]
fn project_keys_override_user_keys_one_by_one() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let home = assert_fs::TempDir::new().expect("tempdir");
    root.child(".bumbo/config.yaml")
        .write_str("api_version: \"58.0\"\n")
        .unwrap();
    home.child(".bumbo/config.yaml")
        .write_str("api_version: \"50.0\"\nsfdx_bin: /home/sfdx\n")
        .unwrap();

    let config = BumboConfig::load_at(root.path(), Some(home.path())).expect("load");
    assert_eq!(config.api_version, "58.0");
    assert_eq!(config.sfdx_bin, "/home/sfdx");
}
