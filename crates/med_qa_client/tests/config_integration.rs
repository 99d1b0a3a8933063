//! Integration tests for config load/save.

use med_qa_client::config::{self, Config, RagSettings};
use med_qa_client::QueryType;
use predicates::prelude::*;
use std::time::Duration;

#[test]
fn load_existing_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(
        &config_path,
        r#"
api:
  base_url: "http://rag.example.com:8000"
  llm_model: "baichuan2-13b-chat"
  embedding_model: "corom-chinese-medical"
  timeout_secs: 30
chat:
  default_mode: agent
"#,
    )
    .unwrap();

    let cfg = config::load(&config_path).expect("load should succeed");
    assert_eq!(
        cfg.api.base_url.as_deref(),
        Some("http://rag.example.com:8000")
    );
    assert_eq!(cfg.api.llm_model.as_deref(), Some("baichuan2-13b-chat"));
    assert_eq!(
        cfg.api.embedding_model.as_deref(),
        Some("corom-chinese-medical")
    );
    assert_eq!(cfg.api.timeout_secs, Some(30));
    assert_eq!(cfg.default_mode(), QueryType::Agent);

    let settings = cfg.resolved();
    assert_eq!(settings.timeout, Duration::from_secs(30));
}

#[test]
fn save_creates_directory_and_file_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("med-qa");
    let config_path = config_dir.join("config.yaml");
    assert!(!config_dir.exists(), "config dir should not exist yet");

    let mut cfg = Config::default();
    cfg.api.base_url = Some("http://localhost:8000".into());
    cfg.chat.default_mode = Some(QueryType::Qa);

    config::save(&config_path, &cfg).expect("save should succeed");
    let pred = predicates::path::exists();
    assert!(pred.eval(&config_path), "config file should exist after save");
    assert!(config_dir.exists(), "config directory should be created");
}

#[test]
fn round_trip_preserves_schema() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    let yaml = r#"
api:
  base_url: "http://rag.example.com:8000"
  llm_model: "qwen-flash"
  embedding_model: "bge-m3"
chat:
  default_mode: qa
"#;
    std::fs::write(&config_path, yaml).unwrap();

    let loaded = config::load(&config_path).expect("load should succeed");
    config::save(&config_path, &loaded).expect("save should succeed");

    let contents = std::fs::read_to_string(&config_path).unwrap();
    for needle in ["api:", "base_url", "chat:", "default_mode: qa"] {
        let pred = predicates::str::contains(needle);
        assert!(pred.eval(&contents), "saved file should contain {needle}");
    }
    // Unset optional keys are not written out.
    assert!(predicates::str::contains("timeout_secs").not().eval(&contents));

    let reloaded = config::load(&config_path).expect("reload should succeed");
    assert_eq!(reloaded.resolved(), loaded.resolved());
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("absent.yaml");

    assert!(config::load(&config_path).is_err());
    let cfg = config::load_or_default(&config_path).expect("defaults");
    assert_eq!(cfg.resolved(), RagSettings::default());
    assert_eq!(cfg.resolved().base_url, config::DEFAULT_BASE_URL);
}

#[test]
fn malformed_yaml_is_an_error_not_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, "api: [unterminated").unwrap();

    let err = config::load_or_default(&config_path).unwrap_err();
    assert!(matches!(err, config::ConfigError::Parse { .. }));
}

#[test]
fn unknown_mode_in_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, "chat:\n  default_mode: triage\n").unwrap();
    assert!(config::load(&config_path).is_err());
}

/// Config path resolves to `~/.med-qa/config.yaml` using the current platform's home dir.
/// We override the HOME env var to a temp dir to verify the resolution.
#[test]
fn default_config_path_uses_home_directory() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().to_str().unwrap().to_string();

    let key = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    let original = std::env::var(key).ok();

    std::env::set_var(key, &home);
    let path = config::default_config_path();
    match original {
        Some(v) => std::env::set_var(key, v),
        None => std::env::remove_var(key),
    }

    let path = path.expect("should resolve a config path");
    let expected = dir.path().join(".med-qa").join("config.yaml");
    assert_eq!(path, expected);
}
