//! Registry error-message, atomic-write-safety, and upsert/remove persistence tests.
//! Storage: <home>/.laraserve/sites.yaml

use assert_fs::prelude::*;
use laraserve_core::{
    registry,
    types::{BackendId, SiteRecord},
    RegistryError,
};
use predicates::prelude::predicate;
use std::fs;
use std::path::PathBuf;

fn site(domain: &str) -> SiteRecord {
    SiteRecord {
        domain: domain.to_string(),
        path: PathBuf::from(format!("/home/dev/code/{domain}/public")),
        server: BackendId::Nginx,
        ssl: false,
    }
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_yaml_returns_corrupt_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let dir = home.path().join(".laraserve");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("sites.yaml"), b": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = registry::load_at(home.path()).unwrap_err();
    assert!(matches!(err, RegistryError::Corrupt { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains("sites.yaml"), "must contain file path, got: {msg}");
    assert!(msg.contains("corrupt"), "got: {msg}");
}

#[test]
fn load_wrong_shape_returns_corrupt_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let dir = home.path().join(".laraserve");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("sites.yaml"), b"- this is a list, not a mapping\n").expect("write");

    let err = registry::load_at(home.path()).unwrap_err();
    assert!(matches!(err, RegistryError::Corrupt { .. }), "got: {err}");
}

#[test]
fn load_unknown_server_is_corrupt() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let dir = home.path().join(".laraserve");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(
        dir.join("sites.yaml"),
        "version: 1\nupdated_at: 2026-01-01T00:00:00Z\nsites:\n  - domain: a.test\n    path: /srv/a\n    server: caddy\n",
    )
    .expect("write");

    let err = registry::load_at(home.path()).unwrap_err();
    assert!(matches!(err, RegistryError::Corrupt { .. }), "got: {err}");
}

#[cfg(unix)]
#[test]
fn load_from_locked_state_dir_is_an_error_not_empty() {
    use std::os::unix::fs::PermissionsExt;

    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::save_at(home.path(), &[site("shop.test")]).expect("save");
    let dir = registry::state_dir_at(home.path());
    fs::set_permissions(&dir, fs::Permissions::from_mode(0o000)).expect("chmod");

    // Privileged users read through mode bits; nothing to check there.
    let privileged = fs::read_dir(&dir).is_ok();
    let result = registry::load_at(home.path());
    fs::set_permissions(&dir, fs::Permissions::from_mode(0o700)).expect("restore");
    if privileged {
        return;
    }

    let err = result.unwrap_err();
    assert!(matches!(err, RegistryError::Unreadable { .. }), "got: {err}");
    assert!(err.to_string().contains("sites.yaml"), "got: {err}");
}

#[test]
fn state_dir_replaced_by_file_is_an_error_not_empty() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".laraserve").write_str("not a directory").expect("write");

    let err = registry::load_at(home.path()).unwrap_err();
    assert!(matches!(err, RegistryError::Unreadable { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn save_writes_human_readable_yaml() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::save_at(home.path(), &[site("blog.test")]).expect("save");

    home.child(".laraserve/sites.yaml")
        .assert(predicate::str::contains("domain: blog.test"))
        .assert(predicate::str::contains("server: nginx"))
        .assert(predicate::str::contains("version: 1"));
}

#[test]
fn mid_write_crash_leaves_original_intact() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::save_at(home.path(), &[site("blog.test")]).expect("save");

    let yaml_path = registry::registry_path_at(home.path());
    let original_bytes = fs::read(&yaml_path).expect("read original");

    // Simulate crash: .tmp written but process died before rename
    let tmp = yaml_path.with_file_name("sites.yaml.tmp");
    fs::write(&tmp, b"CRASH - INCOMPLETE WRITE").expect("write crash tmp");

    let current_bytes = fs::read(&yaml_path).expect("read after crash");
    assert_eq!(original_bytes, current_bytes, "original must be unchanged after crash");
    assert_eq!(registry::load_at(home.path()).expect("load"), vec![site("blog.test")]);
}

#[test]
fn save_over_leftover_tmp_succeeds() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let dir = home.path().join(".laraserve");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("sites.yaml.tmp"), b"stale").expect("write stale tmp");

    registry::save_at(home.path(), &[site("a.test")]).expect("save");
    assert!(!dir.join("sites.yaml.tmp").exists());
    assert_eq!(registry::load_at(home.path()).expect("load").len(), 1);
}

#[cfg(unix)]
#[test]
fn saved_registry_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::save_at(home.path(), &[site("a.test")]).expect("save");
    let mode = fs::metadata(registry::registry_path_at(home.path()))
        .expect("metadata")
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(mode, 0o600);
}

// ---------------------------------------------------------------------------
// 3. Upsert / remove through the store
// ---------------------------------------------------------------------------

#[test]
fn upsert_then_save_keeps_single_record_per_domain() {
    let home = assert_fs::TempDir::new().expect("tempdir");

    for _ in 0..2 {
        let records = registry::load_at(home.path()).expect("load");
        let records = registry::upsert(&records, site("blog.test"));
        registry::save_at(home.path(), &records).expect("save");
    }

    let records = registry::load_at(home.path()).expect("load");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].domain, "blog.test");
}

#[test]
fn remove_then_save_drops_only_that_domain() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::save_at(home.path(), &[site("a.test"), site("b.test"), site("c.test")])
        .expect("save");

    let records = registry::load_at(home.path()).expect("load");
    let (records, removed) = registry::remove(&records, "b.test");
    assert_eq!(removed.map(|r| r.domain), Some("b.test".to_string()));
    registry::save_at(home.path(), &records).expect("save");

    let domains: Vec<String> = registry::load_at(home.path())
        .expect("load")
        .into_iter()
        .map(|r| r.domain)
        .collect();
    assert_eq!(domains, vec!["a.test", "c.test"]);
}
