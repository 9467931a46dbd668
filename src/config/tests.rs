//! Configuration tests
//!
//! The template written by `to_toml()` must parse back into the same values,
//! so a field added to `Config` without a TOML line shows up here.

use super::*;
use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn no_env(_: &str) -> Option<String> {
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Round-trip tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_roundtrip_default() {
    let config = Config::default();
    let toml_str = config.to_toml();

    let parsed: Result<FileConfig, _> = toml::from_str(&toml_str);
    assert!(
        parsed.is_ok(),
        "Default config should round-trip.\nTOML:\n{}\nError: {:?}",
        toml_str,
        parsed.err()
    );

    let resolved = Config::resolve(parsed.unwrap(), no_env);
    assert_eq!(resolved.api_url, config.api_url);
    assert_eq!(resolved.data_dir, config.data_dir);
    assert_eq!(resolved.session, config.session);
    assert_eq!(resolved.views, config.views);
    assert_eq!(resolved.logging, config.logging);
}

#[test]
fn test_config_roundtrip_custom_values() {
    let mut config = Config::default();
    config.api_url = "https://api.lungora.test".to_string();
    config.data_dir = PathBuf::from(r"C:\Users\admin\lungora");
    config.request_timeout_secs = 5;
    config.session.refresh_interval_secs = 120;
    config.session.validate_on_start = false;
    config.views.page_size = 25;
    config.logging.file_enabled = true;
    config.logging.file_rotation = LogRotation::Hourly;

    let parsed: FileConfig = toml::from_str(&config.to_toml()).unwrap();
    let resolved = Config::resolve(parsed, no_env);

    assert_eq!(resolved.api_url, "https://api.lungora.test");
    assert_eq!(resolved.data_dir, PathBuf::from(r"C:\Users\admin\lungora"));
    assert_eq!(resolved.request_timeout_secs, 5);
    assert_eq!(resolved.session.refresh_interval_secs, 120);
    assert!(!resolved.session.validate_on_start);
    assert_eq!(resolved.views.page_size, 25);
    assert!(resolved.logging.file_enabled);
    assert_eq!(resolved.logging.file_rotation, LogRotation::Hourly);
}

// ─────────────────────────────────────────────────────────────────────────────
// Precedence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_env_overrides_file() {
    let file: FileConfig = toml::from_str(
        r#"
api_url = "https://file.lungora.test/"
data_dir = "/var/lib/lungora"
request_timeout_secs = 10
"#,
    )
    .unwrap();

    let config = Config::resolve(
        file,
        env_from(&[
            (ENV_API_URL, "https://env.lungora.test/"),
            (ENV_TIMEOUT, "3"),
        ]),
    );

    assert_eq!(config.api_url, "https://env.lungora.test");
    assert_eq!(config.data_dir, PathBuf::from("/var/lib/lungora"));
    assert_eq!(config.request_timeout_secs, 3);
    assert_eq!(
        config.credentials_path(),
        PathBuf::from("/var/lib/lungora/credentials.json")
    );
}

#[test]
fn test_partial_file_uses_defaults() {
    let file: FileConfig = toml::from_str(
        r#"
[session]
validate_on_start = false

[logging]
file_rotation = "hourly"
"#,
    )
    .unwrap();

    let config = Config::resolve(file, env_from(&[(ENV_DATA_DIR, "/srv/lungora")]));
    assert_eq!(config.api_url, DEFAULT_API_URL);
    assert!(!config.session.validate_on_start);
    assert_eq!(config.session.refresh_interval_secs, 14 * 60);
    assert_eq!(config.logging.file_rotation, LogRotation::Hourly);
    assert_eq!(config.logging.level, "warn");
    // Log files follow the data directory unless placed explicitly
    assert_eq!(config.logging.file_dir, PathBuf::from("/srv/lungora/logs"));
    assert_eq!(config.views.page_size, crate::collection::DEFAULT_PAGE_SIZE);
}

#[test]
fn test_zero_values_fall_back_to_defaults() {
    let file: FileConfig = toml::from_str(
        r#"
request_timeout_secs = 0

[session]
refresh_interval_secs = 0

[views]
page_size = 0
"#,
    )
    .unwrap();

    let config = Config::resolve(file, env_from(&[(ENV_TIMEOUT, "not-a-number")]));
    assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert_eq!(config.session.refresh_interval_secs, 14 * 60);
    assert_eq!(config.views.page_size, crate::collection::DEFAULT_PAGE_SIZE);
}

#[test]
fn test_write_default_creates_parents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    Config::write_default(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(toml::from_str::<FileConfig>(&contents).is_ok());
}

#[test]
fn test_unknown_keys_ignored_type_errors_rejected() {
    assert!(toml::from_str::<FileConfig>("theme = \"dark\"").is_ok());
    assert!(toml::from_str::<FileConfig>("request_timeout_secs = \"soon\"").is_err());
}

#[test]
fn test_unknown_rotation_rejected() {
    let parsed = toml::from_str::<FileConfig>("[logging]\nfile_rotation = \"sometimes\"");
    assert!(parsed.is_err());
}

#[test]
fn test_read_file_reports_malformed_config() {
    let dir = tempfile::tempdir().unwrap();

    // Missing file: defaults
    let missing = Config::read_file(&dir.path().join("absent.toml")).unwrap();
    assert!(missing.api_url.is_none());

    let path = dir.path().join("config.toml");
    std::fs::write(&path, "api_url = https://unquoted.example\n").unwrap();
    let err = Config::read_file(&path).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Invalid config file"));
    assert!(message.contains("config.toml"));
}
