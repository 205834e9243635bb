//! scenario_secrets_role_enforcement
//!
//! Invariants:
//! 1. RECONCILER fails closed without the document store token.
//! 2. RECONCILER with `transport: direct` also requires the provider key.
//! 3. PROXY fails closed without the provider key.
//! 4. Errors name the env var, never a value.
//! 5. Resolved secrets never leak through `Debug`.
//!
//! Failure cases use sentinel env var names that are never set, so no test
//! mutates the process environment. Success cases point at `PATH`, which is
//! always present.

use vlb_config::load_layered_yaml_from_strings;
use vlb_config::secrets::{resolve_secrets, resolve_secrets_optional};
use vlb_config::ConfigRole;

fn load(yaml: &str) -> serde_json::Value {
    load_layered_yaml_from_strings(&[yaml])
        .expect("test yaml must parse cleanly")
        .config_json
}

#[test]
fn reconciler_fails_without_store_token() {
    let cfg = load(
        r#"
store:
  token_env: "VLB_SENTINEL_STORE_TOKEN_MISSING_R1"
"#,
    );
    let msg = resolve_secrets(&cfg, ConfigRole::Reconciler)
        .unwrap_err()
        .to_string();
    assert!(msg.contains("SECRETS_MISSING"), "got: {msg}");
    assert!(msg.contains("role=RECONCILER"), "got: {msg}");
    assert!(msg.contains("VLB_SENTINEL_STORE_TOKEN_MISSING_R1"), "got: {msg}");
}

#[test]
fn reconciler_via_proxy_does_not_need_provider_key() {
    let cfg = load(
        r#"
store:
  token_env: "PATH"
source:
  transport: "proxy"
  api_key_env: "VLB_SENTINEL_PROVIDER_KEY_MISSING_R2"
"#,
    );
    let secrets = resolve_secrets(&cfg, ConfigRole::Reconciler).unwrap();
    assert!(secrets.store_token.is_some());
    assert!(secrets.source_api_key.is_none());
}

#[test]
fn reconciler_direct_requires_provider_key() {
    let cfg = load(
        r#"
store:
  token_env: "PATH"
source:
  transport: "direct"
  api_key_env: "VLB_SENTINEL_PROVIDER_KEY_MISSING_R3"
"#,
    );
    let msg = resolve_secrets(&cfg, ConfigRole::Reconciler)
        .unwrap_err()
        .to_string();
    assert!(msg.contains("transport=direct"), "got: {msg}");
    assert!(msg.contains("VLB_SENTINEL_PROVIDER_KEY_MISSING_R3"), "got: {msg}");
}

#[test]
fn proxy_fails_without_provider_key() {
    let cfg = load(
        r#"
source:
  api_key_env: "VLB_SENTINEL_PROVIDER_KEY_MISSING_P1"
"#,
    );
    let msg = resolve_secrets(&cfg, ConfigRole::Proxy)
        .unwrap_err()
        .to_string();
    assert!(msg.contains("role=PROXY"), "got: {msg}");
    assert!(msg.contains("VLB_SENTINEL_PROVIDER_KEY_MISSING_P1"), "got: {msg}");
}

#[test]
fn proxy_does_not_need_store_token() {
    let cfg = load(
        r#"
store:
  token_env: "VLB_SENTINEL_STORE_TOKEN_MISSING_P2"
source:
  api_key_env: "PATH"
"#,
    );
    let secrets = resolve_secrets(&cfg, ConfigRole::Proxy).unwrap();
    assert!(secrets.store_token.is_none());
    assert!(secrets.source_api_key.is_some());
}

#[test]
fn resolved_values_are_redacted_in_debug() {
    let cfg = load(
        r#"
store:
  token_env: "PATH"
"#,
    );
    let secrets = resolve_secrets_optional(&cfg);
    let path_value = std::env::var("PATH").unwrap();
    let dbg = format!("{secrets:?}");
    assert!(dbg.contains("<REDACTED>"));
    assert!(!dbg.contains(&path_value));
}

#[test]
fn unknown_role_is_rejected() {
    let err = ConfigRole::parse("scheduler").unwrap_err();
    assert!(err.to_string().contains("CONFIG_UNKNOWN_ROLE"));
    assert_eq!(ConfigRole::parse(" Proxy ").unwrap(), ConfigRole::Proxy);
}
