#![allow(clippy::unwrap_used)]
// Integration tests for inventory loading from disk.

use std::path::Path;

use gnmibuddy_config::{ConfigError, IssueKind, load_inventory, validate_inventory_file};
use gnmibuddy_core::{InventoryResolver, ResolveError};
use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;

fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn loads_json_inventory() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "inventory.json",
        r#"[
            {"name": "xrd-1", "ip_address": "172.20.20.3", "nos": "iosxr", "port": 57400,
             "username": "admin", "password": "admin", "insecure": false, "skip_verify": true},
            {"name": "xrd-2", "ip_address": "172.20.20.4", "nos": "iosxr",
             "username": "admin", "password": "admin"}
        ]"#,
    );

    let inv = load_inventory(&path).unwrap();
    assert_eq!(inv.names().collect::<Vec<_>>(), vec!["xrd-1", "xrd-2"]);

    let d1 = inv.resolve("xrd-1").unwrap();
    assert_eq!(d1.port, 57400);
    assert!(!d1.tls.insecure);
    assert!(d1.tls.skip_verify);

    let d2 = inv.resolve("xrd-2").unwrap();
    assert_eq!(d2.port, 830);
    assert!(d2.tls.insecure);

    assert_eq!(
        inv.resolve("xrd-9").unwrap_err(),
        ResolveError::NotFound {
            name: "xrd-9".into()
        }
    );
}

#[test]
fn loads_yaml_inventory() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "inventory.yaml",
        "- name: leaf-1\n  ip_address: 10.1.1.1\n  nos: iosxr\n  gnmi_timeout: 12\n",
    );

    let inv = load_inventory(&path).unwrap();
    let leaf = inv.resolve("leaf-1").unwrap();
    assert_eq!(leaf.timeout.as_secs(), 12);
    assert_eq!(leaf.credentials.username, None);
}

#[test]
fn padded_names_resolve_by_their_trimmed_form() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "inventory.json",
        r#"[{"name": " r1 ", "ip_address": "10.0.0.1", "nos": "iosxr"}]"#,
    );

    let inv = load_inventory(&path).unwrap();
    assert_eq!(inv.names().collect::<Vec<_>>(), vec!["r1"]);
    assert_eq!(inv.resolve("r1").unwrap().name, "r1");
    assert_eq!(inv.resolve(" r1 ").unwrap().name, "r1");
}

#[test]
fn password_env_takes_precedence() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("LAB_PW", "from-env");
        jail.create_file(
            "inventory.json",
            r#"[{"name": "r1", "ip_address": "10.0.0.1", "nos": "iosxr",
                 "username": "admin", "password": "inline", "password_env": "LAB_PW"}]"#,
        )?;

        let inv = load_inventory(Path::new("inventory.json")).unwrap();
        let r1 = inv.resolve("r1").unwrap();
        let pw = r1.credentials.password.as_ref().unwrap();
        assert_eq!(pw.expose_secret(), "from-env");
        Ok(())
    });
}

#[test]
fn invalid_inventory_reports_every_issue() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "inventory.json",
        r#"[
            {"name": "r1", "ip_address": "999.1.1.1", "nos": "iosxr"},
            {"name": "r1", "ip_address": "10.0.0.2", "nos": "iosxr", "port": 0}
        ]"#,
    );

    let err = load_inventory(&path).unwrap_err();
    let ConfigError::InvalidInventory { issues, .. } = &err else {
        panic!("expected InvalidInventory, got {err:?}");
    };
    let kinds: Vec<_> = issues.iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        vec![IssueKind::InvalidIpAddress, IssueKind::InvalidPort, IssueKind::DuplicateName]
    );

    let report = validate_inventory_file(&path).unwrap();
    assert!(!report.is_valid());
    assert_eq!(report.total, 2);
    assert_eq!(report.valid, 0);
}

#[test]
fn missing_and_malformed_files() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("nope.json");
    assert!(matches!(
        load_inventory(&missing).unwrap_err(),
        ConfigError::InventoryNotFound { .. }
    ));

    let broken = write(dir.path(), "broken.json", "{ not json");
    assert!(matches!(
        load_inventory(&broken).unwrap_err(),
        ConfigError::Parse { .. }
    ));
}
