use hrp_config::{load_layered_yaml_from_strings, report_unused_keys, ConfigMode, UnusedKeyPolicy};

/// Unused keys are reported under Warn, fatal under Fail, and keys under
/// consumed prefixes are never flagged.

const YAML: &str = r#"
store:
  backend: "local"
  local_root: "/tmp/registry"
registry:
  bucket: "heart-attack-predictor"
data:
  target_column: "Result"
evaluation:
  report_dir: "exports/evaluations"
legacy:
  changed_threshold_score: 0.02
"#;

#[test]
fn warn_mode_reports_unused_keys_without_error() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Train, &loaded.config_json, UnusedKeyPolicy::Warn).unwrap();

    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/legacy/changed_threshold_score".to_string()]
    );
    assert_eq!(report.mode, "TRAIN");
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let err = report_unused_keys(ConfigMode::Train, &loaded.config_json, UnusedKeyPolicy::Fail)
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_UNUSED_KEYS"), "got: {msg}");
    assert!(msg.contains("/legacy/changed_threshold_score"), "got: {msg}");
}

#[test]
fn serve_mode_does_not_consume_training_sections() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Serve, &loaded.config_json, UnusedKeyPolicy::Warn).unwrap();

    assert!(report
        .unused_leaf_pointers
        .contains(&"/evaluation/report_dir".to_string()));
    assert!(!report
        .unused_leaf_pointers
        .contains(&"/data/target_column".to_string()));
    assert!(!report
        .unused_leaf_pointers
        .iter()
        .any(|p| p.starts_with("/store")));
}

#[test]
fn clean_config_passes_fail_policy() {
    let yaml = r#"
store:
  backend: "s3"
registry:
  model_key: "model-registry/model.json"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Serve, &loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
}
