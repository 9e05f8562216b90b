//! Vault facade lifecycle and dispatch surface.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io::Write;
use std::sync::Arc;

use serde_json::{json, Value};

use rulevault_core::error::ErrorCode;
use rulevault_store::config::{AdapterClass, Config, ModelConfigType};
use rulevault_store::PolicyVault;

const RBAC_MODEL: &str = r#"
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[role_definition]
g = _, _

[matchers]
m = g(r.sub, p.sub) && r.obj == p.obj && r.act == p.act
"#;

fn text_config(url: &str) -> Config {
    Config {
        adapter_class: AdapterClass::Sqlite,
        url: url.to_string(),
        model_config_type: ModelConfigType::Text,
        model_config_file_path: None,
        model_config_text: Some(RBAC_MODEL.to_string()),
        log_enable: false,
    }
}

fn s(x: &str) -> Value {
    Value::String(x.to_string())
}

#[test]
fn engine_is_cached_until_force_new() {
    let mut vault = PolicyVault::new(&text_config(":memory:")).unwrap();

    let e1 = vault.engine(false).unwrap();
    let e2 = vault.engine(false).unwrap();
    assert!(Arc::ptr_eq(&e1, &e2), "same instance without force_new");

    let e3 = vault.engine(true).unwrap();
    assert!(!Arc::ptr_eq(&e1, &e3), "force_new replaces the cache");

    let e4 = vault.engine(false).unwrap();
    assert!(Arc::ptr_eq(&e3, &e4), "replacement is cached");
}

#[test]
fn model_from_file_source() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(RBAC_MODEL.as_bytes()).unwrap();

    let cfg = Config {
        adapter_class: AdapterClass::Sqlite,
        url: ":memory:".to_string(),
        model_config_type: ModelConfigType::File,
        model_config_file_path: Some(f.path().to_path_buf()),
        model_config_text: None,
        log_enable: false,
    };
    let mut vault = PolicyVault::new(&cfg).unwrap();
    vault.engine(false).unwrap();
}

#[test]
fn bad_model_text_is_config_error() {
    let mut cfg = text_config(":memory:");
    cfg.model_config_text = Some("[request_definition]\nr = sub\n".to_string());
    let err = PolicyVault::new(&cfg).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Config);
}

#[test]
fn missing_model_source_is_config_error() {
    let mut cfg = text_config(":memory:");
    cfg.model_config_text = None;
    let err = PolicyVault::new(&cfg).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Config);
}

#[test]
fn dispatch_round_trip() {
    let mut vault = PolicyVault::new(&text_config(":memory:")).unwrap();

    let added = vault
        .dispatch("addPolicy", &[s("alice"), s("data1"), s("read")])
        .unwrap();
    assert_eq!(added, Value::Bool(true));

    let allowed = vault
        .dispatch("enforce", &[s("alice"), s("data1"), s("read")])
        .unwrap();
    assert_eq!(allowed, Value::Bool(true));

    let denied = vault
        .dispatch("enforce", &[s("bob"), s("data1"), s("read")])
        .unwrap();
    assert_eq!(denied, Value::Bool(false));

    let policy = vault.dispatch("getPolicy", &[]).unwrap();
    assert_eq!(policy, json!([["alice", "data1", "read"]]));
}

#[test]
fn dispatch_grouping_operations() {
    let mut vault = PolicyVault::new(&text_config(":memory:")).unwrap();

    vault
        .dispatch("addPolicy", &[s("admin"), s("data1"), s("write")])
        .unwrap();
    vault.dispatch("addGroupingPolicy", &[s("alice"), s("admin")]).unwrap();

    let allowed = vault
        .dispatch("enforce", &[s("alice"), s("data1"), s("write")])
        .unwrap();
    assert_eq!(allowed, Value::Bool(true));

    let grouping = vault.dispatch("getGroupingPolicy", &[]).unwrap();
    assert_eq!(grouping, json!([["alice", "admin"]]));

    vault
        .dispatch("removeGroupingPolicy", &[s("alice"), s("admin")])
        .unwrap();
    let denied = vault
        .dispatch("enforce", &[s("alice"), s("data1"), s("write")])
        .unwrap();
    assert_eq!(denied, Value::Bool(false));
}

#[test]
fn dispatch_remove_filtered() {
    let mut vault = PolicyVault::new(&text_config(":memory:")).unwrap();

    vault.dispatch("addPolicy", &[s("alice"), s("data1"), s("read")]).unwrap();
    vault.dispatch("addPolicy", &[s("bob"), s("data2"), s("write")]).unwrap();

    let removed = vault
        .dispatch("removeFilteredPolicy", &[json!(0), s("alice")])
        .unwrap();
    assert_eq!(removed, Value::Bool(true));

    let policy = vault.dispatch("getPolicy", &[]).unwrap();
    assert_eq!(policy, json!([["bob", "data2", "write"]]));
}

#[test]
fn dispatch_unknown_operation_fails() {
    let mut vault = PolicyVault::new(&text_config(":memory:")).unwrap();
    let err = vault.dispatch("nonexistentCapability", &[]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnknownOperation);
    assert!(err.to_string().contains("nonexistentCapability"));
}

#[test]
fn dispatch_bad_arguments_fail() {
    let mut vault = PolicyVault::new(&text_config(":memory:")).unwrap();

    let err = vault.dispatch("addPolicy", &[json!(42)]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    let err = vault
        .dispatch("removeFilteredPolicy", &[s("not-an-index")])
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
}

#[test]
fn engine_errors_pass_through_unchanged() {
    let mut vault = PolicyVault::new(&text_config(":memory:")).unwrap();
    // Wrong request arity surfaces as the engine's own error, untranslated.
    let err = vault.dispatch("enforce", &[s("alice")]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
    assert!(err.to_string().contains("model declares 3"));
}

#[test]
fn auto_save_survives_force_new() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("{}", dir.path().join("rules.db").display());
    let mut vault = PolicyVault::new(&text_config(&url)).unwrap();

    vault.dispatch("addPolicy", &[s("alice"), s("data1"), s("read")]).unwrap();

    // Fresh engine reloads from storage.
    vault.engine(true).unwrap();
    let allowed = vault
        .dispatch("enforce", &[s("alice"), s("data1"), s("read")])
        .unwrap();
    assert_eq!(allowed, Value::Bool(true));
}

#[test]
fn reload_model_applies_to_next_engine() {
    let mut vault = PolicyVault::new(&text_config(":memory:")).unwrap();
    vault.engine(false).unwrap();
    vault.reload_model().unwrap();
    // Cached engine untouched; a forced rebuild picks the model up.
    vault.engine(true).unwrap();
}

#[test]
fn log_enable_path_runs() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut cfg = text_config(":memory:");
    cfg.log_enable = true;
    let mut vault = PolicyVault::new(&cfg).unwrap();
    vault.dispatch("addPolicy", &[s("alice"), s("data1"), s("read")]).unwrap();
    let allowed = vault
        .dispatch("enforce", &[s("alice"), s("data1"), s("read")])
        .unwrap();
    assert_eq!(allowed, Value::Bool(true));
}
