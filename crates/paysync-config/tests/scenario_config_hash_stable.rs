//! The config hash is stable for identical input, changes with content, and
//! file layering matches string layering.

use std::io::Write;

use paysync_config::{load_layered_yaml, load_layered_yaml_from_strings};

const BASE: &str = "gateway:\n  mode: sandbox\nfrontend:\n  base_url: \"https://shop.example\"\n";
const OVERRIDE: &str = "gateway:\n  mode: production\n";

#[test]
fn same_input_same_hash() {
    let a = load_layered_yaml_from_strings(&[BASE, OVERRIDE]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE, OVERRIDE]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn different_input_different_hash() {
    let a = load_layered_yaml_from_strings(&[BASE]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE, OVERRIDE]).unwrap();
    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn files_layer_like_strings() {
    let dir = tempfile::tempdir().unwrap();
    let base_path = dir.path().join("base.yaml");
    let over_path = dir.path().join("prod.yaml");
    std::fs::File::create(&base_path)
        .unwrap()
        .write_all(BASE.as_bytes())
        .unwrap();
    std::fs::File::create(&over_path)
        .unwrap()
        .write_all(OVERRIDE.as_bytes())
        .unwrap();

    let from_files = load_layered_yaml(&[&base_path, &over_path]).unwrap();
    let from_strings = load_layered_yaml_from_strings(&[BASE, OVERRIDE]).unwrap();
    assert_eq!(from_files.config_hash, from_strings.config_hash);
    assert_eq!(from_files.config_json["gateway"]["mode"], "production");
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    let err = load_layered_yaml(&[&missing]).expect_err("missing file must error");
    assert!(err.to_string().contains("failed to read yaml path"));
}
