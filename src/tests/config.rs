use std::collections::HashMap;

use crate::config::Config;
use crate::filters::{FilterCategory, FilterProfile};

fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

/// Fresh start: no config.yaml, defaults are written out
#[test]
fn test_defaults_written_on_first_load() {
    let dir = temp_dir();
    let base_path = dir.path().join("nested");

    let config = Config::load_with(&base_path).unwrap();

    assert!(base_path.join("config.yaml").exists());
    assert_eq!(config.base_path(), base_path.as_path());
    assert_eq!(config.store.url, "http://localhost:8000");
    assert_eq!(config.web.port, 8080);
    assert_eq!(config.search.default_limit, 10);
    assert_eq!(config.search.max_limit, 100);
    assert!((config.search.weights.profile - 0.4).abs() < f32::EPSILON);

    // the written file loads back to the same values
    let reloaded = Config::load_with(&base_path).unwrap();
    assert_eq!(reloaded, config);
}

/// Partial file: missing keys are filled in and written back
#[test]
fn test_partial_config_is_upgraded() {
    let dir = temp_dir();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "web:\n  port: 9000\n").unwrap();

    let config = Config::load_with(dir.path()).unwrap();
    assert_eq!(config.web.port, 9000);
    assert_eq!(config.web.host, "0.0.0.0");

    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("port: 9000"));
    assert!(saved.contains("max_limit: 100"));
}

#[test]
fn test_profiles_and_custom_patterns() {
    let dir = temp_dir();
    std::fs::write(
        dir.path().join("config.yaml"),
        r#"
filter_profiles:
  skills_only:
    enabled_filters: [skills]
    strict_mode: true
custom_patterns:
- category: location
  pattern: 제주
  value: 제주
"#,
    )
    .unwrap();

    let config = Config::load_with(dir.path()).unwrap();

    let profile = FilterProfile::resolve("skills_only", &config.filter_profiles);
    assert_eq!(profile.name, "skills_only");
    assert_eq!(profile.enabled_filters, vec![FilterCategory::Skills]);
    assert!(profile.strict_mode);
    assert_eq!(profile.min_score_threshold, 0.0);

    assert_eq!(config.custom_patterns.len(), 1);
    assert_eq!(config.custom_patterns[0].category, FilterCategory::Location);
}

#[test]
fn test_invalid_values_are_rejected() {
    let cases = [
        "search:\n  weights:\n    profile: -0.1\n    skills: 0.5\n    experience: 0.5\n",
        "search:\n  default_limit: 0\n",
        "search:\n  default_limit: 50\n  max_limit: 20\n",
        "filter_profiles:\n  empty:\n    enabled_filters: []\n",
        "store:\n  url: ''\n",
    ];

    for yaml in cases {
        let dir = temp_dir();
        std::fs::write(dir.path().join("config.yaml"), yaml).unwrap();
        assert!(Config::load_with(dir.path()).is_err(), "accepted: {yaml}");
    }
}

#[test]
fn test_malformed_yaml_is_an_error() {
    let dir = temp_dir();
    std::fs::write(dir.path().join("config.yaml"), "web: [unclosed").unwrap();

    let err = Config::load_with(dir.path()).unwrap_err();
    assert!(err.to_string().contains("malformed"));
}

#[test]
fn test_env_overrides() {
    let env: HashMap<&str, &str> = [
        ("DEVSEARCH_STORE_URL", "http://chroma:8000"),
        ("DEVSEARCH_MODEL", "multilingual-e5-small"),
        ("DEVSEARCH_HOST", "127.0.0.1"),
        ("DEVSEARCH_PORT", " 3000 "),
    ]
    .into_iter()
    .collect();

    let mut config = Config::default();
    config
        .apply_env(|key| env.get(key).map(|value| value.to_string()))
        .unwrap();

    assert_eq!(config.store.url, "http://chroma:8000");
    assert_eq!(config.embedding.model, "multilingual-e5-small");
    assert_eq!(config.web.host, "127.0.0.1");
    assert_eq!(config.web.port, 3000);
}

#[test]
fn test_env_overrides_are_validated() {
    let mut config = Config::default();
    assert!(config
        .apply_env(|key| (key == "DEVSEARCH_PORT").then(|| "http".to_string()))
        .is_err());

    let mut config = Config::default();
    assert!(config
        .apply_env(|key| (key == "DEVSEARCH_STORE_URL").then(|| "  ".to_string()))
        .is_err());
}

#[test]
fn test_env_overrides_are_not_saved() {
    let dir = temp_dir();
    let mut config = Config::load_with(dir.path()).unwrap();
    config
        .apply_env(|key| (key == "DEVSEARCH_HOST").then(|| "127.0.0.1".to_string()))
        .unwrap();

    let reloaded = Config::load_with(dir.path()).unwrap();
    assert_eq!(reloaded.web.host, "0.0.0.0");
}
