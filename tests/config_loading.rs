//! Integration test: Configuration utilities
//!
//! Tests config path resolution and YAML loading.

use hub_chat::bin_common::{load_config_from_env, ConfigType};
use hub_chat::config::{ClientSettings, ConfigError};
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_client_config_default() {
    // Clear env var to test default
    env::remove_var("HUB_CONFIG_PATH");

    let config_path = load_config_from_env(ConfigType::Client);
    assert_eq!(config_path.to_str().unwrap(), "config/hub_client.yaml");
}

#[test]
fn test_custom_config() {
    let custom = ConfigType::Custom("custom/path.yaml".to_string());
    let config_path = load_config_from_env(custom);

    assert_eq!(config_path.to_str().unwrap(), "custom/path.yaml");
}

#[test]
fn test_load_settings_from_file() {
    let file = write_config(
        r#"
url: "http://localhost:5000/chathub"
user_name: "tester"
skip_negotiate: true
server_timeout_ms: 60000
headers:
  X-Client: "hub-chat"
log_level: "debug"
"#,
    );

    let settings = ClientSettings::load(file.path()).unwrap();
    assert_eq!(settings.url, "http://localhost:5000/chathub");
    assert_eq!(settings.user_name, "tester");
    assert!(settings.skip_negotiate);
    assert_eq!(settings.server_timeout_ms, 60_000);
    assert_eq!(settings.keep_alive_interval_ms, 15_000);
    assert_eq!(settings.headers.get("X-Client").map(String::as_str), Some("hub-chat"));
    assert_eq!(settings.log_level, "debug");
}

#[test]
fn test_load_rejects_zero_timeout() {
    let file = write_config("url: \"http://localhost\"\nhandshake_timeout_ms: 0\n");

    let result = ClientSettings::load(file.path());
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_load_rejects_invalid_yaml() {
    let file = write_config("url: [unterminated");

    let result = ClientSettings::load(file.path());
    assert!(matches!(result, Err(ConfigError::YamlError(_))));
}

#[test]
fn test_load_missing_file() {
    let result = ClientSettings::load("does/not/exist.yaml");
    assert!(matches!(result, Err(ConfigError::FileError(_))));
}

#[test]
fn test_bundled_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/hub_client.yaml");
    let yaml = std::fs::read_to_string(path).unwrap();

    let settings = ClientSettings::from_yaml(&yaml).unwrap();
    settings.validate().unwrap();
    assert_eq!(settings.broadcast_method, "broadcastMessage");
}
