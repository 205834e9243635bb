//! scenario_config_hash_stable
//!
//! Invariants:
//! 1. The same layered documents always hash to the same value, regardless
//!    of key order in the YAML source.
//! 2. A later layer overrides an earlier one leaf-by-leaf; untouched siblings survive.
//! 3. Changing any effective value changes the hash.
//! 4. Loading from files matches loading from strings.

use std::io::Write;

use vlb_config::{load_layered_yaml, load_layered_yaml_from_strings};

const BASE: &str = r#"
store:
  repo: "group/tracker"
  branch: "main"
source:
  name: "SuperLulino"
  tag: "4088"
engine:
  cooldown_ms: 2000
"#;

const BASE_REORDERED: &str = r#"
engine:
  cooldown_ms: 2000
source:
  tag: "4088"
  name: "SuperLulino"
store:
  branch: "main"
  repo: "group/tracker"
"#;

const OVERRIDE: &str = r#"
engine:
  cooldown_ms: 500
"#;

#[test]
fn hash_is_independent_of_key_order() {
    let a = load_layered_yaml_from_strings(&[BASE]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_REORDERED]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn override_layer_replaces_leaf_and_keeps_siblings() {
    let loaded = load_layered_yaml_from_strings(&[BASE, OVERRIDE]).unwrap();
    let cfg = loaded.tracker().unwrap();
    assert_eq!(cfg.engine.cooldown_ms, 500);
    assert_eq!(cfg.store.repo, "group/tracker");
    assert_eq!(cfg.source.name, "SuperLulino");
}

#[test]
fn changed_value_changes_hash() {
    let a = load_layered_yaml_from_strings(&[BASE]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE, OVERRIDE]).unwrap();
    assert_ne!(a.config_hash, b.config_hash);
    assert_eq!(a.config_hash.len(), 64);
}

#[test]
fn files_and_strings_hash_identically() {
    let dir = tempfile::tempdir().unwrap();
    let base_path = dir.path().join("base.yaml");
    let over_path = dir.path().join("local.yaml");
    std::fs::File::create(&base_path)
        .unwrap()
        .write_all(BASE.as_bytes())
        .unwrap();
    std::fs::File::create(&over_path)
        .unwrap()
        .write_all(OVERRIDE.as_bytes())
        .unwrap();

    let from_files = load_layered_yaml(&[
        base_path.to_str().unwrap(),
        over_path.to_str().unwrap(),
    ])
    .unwrap();
    let from_strings = load_layered_yaml_from_strings(&[BASE, OVERRIDE]).unwrap();
    assert_eq!(from_files.config_hash, from_strings.config_hash);
}

#[test]
fn missing_file_is_reported_with_path() {
    let err = load_layered_yaml(&["/definitely/not/here.yaml"]).unwrap_err();
    assert!(format!("{err:#}").contains("/definitely/not/here.yaml"));
}
