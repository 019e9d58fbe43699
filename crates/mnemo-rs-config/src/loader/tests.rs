//! Tests for layered configuration loading.

use super::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Project layout with a `.git` marker and a nested cwd.
fn project(temp: &TempDir) -> (PathBuf, PathBuf) {
    let project_root = temp.path().join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");
    (project_root, cwd)
}

#[test]
fn parse_minimal_config() {
    let config = MnemoConfig::load_from_str("{}").expect("config");
    assert_eq!(config, MnemoConfig::default());
    assert_eq!(config.memory.path, ".mnemo/memory.db");
    assert_eq!(config.memory.search_limit, 5);
    assert_eq!(config.memory.keyword_candidate_multiplier, 3);
    assert_eq!(config.memory.vector_weight, 0.7);
    assert_eq!(config.memory.keyword_weight, 0.3);
    assert!(config.embedding.enabled);
    assert_eq!(config.embedding.model, "bge-small-en-v1.5");
}

#[test]
fn parses_json5_syntax() {
    let json5 = r#"{
        // comments and trailing commas are allowed
        memory: { path: "/var/lib/mnemo.db", search_limit: 8, },
        embedding: { enabled: false, dimension: 384 },
    }"#;
    let config = MnemoConfig::load_from_str(json5).expect("config");
    assert_eq!(config.memory.path, "/var/lib/mnemo.db");
    assert_eq!(config.memory.search_limit, 8);
    assert!(!config.embedding.enabled);
    assert_eq!(config.embedding.dimension, Some(384));
}

#[test]
fn rejects_unknown_top_level_key() {
    let err = MnemoConfig::load_from_str("{ unexpected: true }").unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("unknown key"));
    assert!(msg.contains("config:unexpected"));
}

#[test]
fn rejects_unknown_nested_key() {
    let err = MnemoConfig::load_from_str("{ memory: { recall_k: 3 } }").unwrap_err();
    assert!(format!("{err}").contains("memory.recall_k"));
}

#[test]
fn rejects_wrong_field_types() {
    let err = MnemoConfig::load_from_str(r#"{ memory: { search_limit: "five" } }"#).unwrap_err();
    assert!(format!("{err}").contains("memory.search_limit"));

    let err = MnemoConfig::load_from_str("{ memory: { list_limit: -1 } }").unwrap_err();
    assert!(format!("{err}").contains("non-negative"));

    let err = MnemoConfig::load_from_str("{ embedding: { enabled: 1 } }").unwrap_err();
    assert!(format!("{err}").contains("embedding.enabled"));
}

#[test]
fn validate_rejects_bad_weights() {
    let err = MnemoConfig::load_from_str("{ memory: { vector_weight: -0.5 } }").unwrap_err();
    assert!(format!("{err}").contains("memory.vector_weight"));

    let err = MnemoConfig::load_from_str("{ memory: { vector_weight: 0, keyword_weight: 0 } }")
        .unwrap_err();
    assert!(format!("{err}").contains("both be zero"));

    let keyword_only =
        MnemoConfig::load_from_str("{ memory: { vector_weight: 0, keyword_weight: 1 } }")
            .expect("keyword-only weights are valid");
    assert_eq!(keyword_only.memory.keyword_weight, 1.0);
}

#[test]
fn validate_rejects_zero_multiplier_and_dimension() {
    let err = MnemoConfig::load_from_str("{ memory: { keyword_candidate_multiplier: 0 } }")
        .unwrap_err();
    assert!(format!("{err}").contains("keyword_candidate_multiplier"));

    let err = MnemoConfig::load_from_str("{ embedding: { dimension: 0 } }").unwrap_err();
    assert!(format!("{err}").contains("embedding.dimension"));
}

#[test]
fn later_layers_win() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, cwd) = project(&temp);

    let user_config = temp.path().join("user.json5");
    write_json5(
        &user_config,
        r#"{ memory: { path: "user.db", search_limit: 7 }, embedding: { model: "all-minilm-l6-v2" } }"#,
    );
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        r#"{ memory: { path: "project.db" } }"#,
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ memory: { path: "cwd.db" } }"#,
    );

    let mut options = LayeredConfigOptions::new(&cwd);
    options.user_config_path = Some(user_config);

    let layered = MnemoConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.memory.path, "cwd.db");
    assert_eq!(layered.config.memory.search_limit, 7);
    assert_eq!(layered.config.embedding.model, "all-minilm-l6-v2");
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::User,
            ConfigLayerSource::Project,
            ConfigLayerSource::Cwd
        ]
    );
}

#[test]
fn runtime_override_wins() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, cwd) = project(&temp);
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        "{ embedding: { enabled: true } }",
    );
    let runtime_config = temp.path().join("runtime.json5");
    write_json5(&runtime_config, "{ embedding: { enabled: false } }");

    let mut options = LayeredConfigOptions::new(&cwd).with_runtime_path(&runtime_config);
    options.user_config_path = None;

    let layered = MnemoConfig::load_layered_with_options(options).expect("layered");
    assert!(!layered.config.embedding.enabled);
    assert_eq!(
        layered.layers.last().map(|layer| layer.source),
        Some(ConfigLayerSource::Runtime)
    );
}

#[test]
fn cwd_at_project_root_loads_file_once() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, _) = project(&temp);
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        "{ memory: { list_limit: 20 } }",
    );

    let mut options = LayeredConfigOptions::new(&project_root);
    options.user_config_path = None;

    let layered = MnemoConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.memory.list_limit, 20);
    assert_eq!(layered.layers.len(), 1);
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let mut options =
        LayeredConfigOptions::new(temp.path()).with_runtime_path(temp.path().join("absent.json5"));
    options.user_config_path = None;
    let err = MnemoConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed(_)));
}

#[test]
fn invalid_layer_reports_its_origin() {
    let temp = TempDir::new().expect("tmp");
    let (_, cwd) = project(&temp);
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), "{ memory: { bogus: 1 } }");

    let mut options = LayeredConfigOptions::new(&cwd);
    options.user_config_path = None;
    let err = MnemoConfig::load_layered_with_options(options).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("));
    assert!(msg.contains("memory.bogus"));
}

#[test]
fn resolves_relative_db_path_against_base() {
    let config = MnemoConfig::builder().path("data/memory.db").build();
    assert_eq!(
        config.resolve_db_path("/srv/agent"),
        PathBuf::from("/srv/agent/data/memory.db")
    );
    let absolute = MnemoConfig::builder().path("/tmp/memory.db").build();
    assert_eq!(
        absolute.resolve_db_path("/srv/agent"),
        PathBuf::from("/tmp/memory.db")
    );
}
