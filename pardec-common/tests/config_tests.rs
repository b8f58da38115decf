//! Settings loading and resolution priority
//!
//! Tests that manipulate PARDEC_* environment variables are marked #[serial]
//! so they do not race each other.

use pardec_common::config::{load_settings, resolve_optional, resolve_setting, Settings};
use pardec_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_settings(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&path).expect("Failed to create settings file");
    file.write_all(content.as_bytes()).expect("Failed to write settings file");
    path
}

#[test]
fn test_load_explicit_settings_file() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(
        &dir,
        r#"
        [decode]
        channels = 1
        frames_per_thread = 250
        codec = "ima-adpcm"

        [logging]
        file = "/tmp/pardec.log"
        "#,
    );

    let settings = load_settings(Some(&path)).expect("settings should load");
    assert_eq!(settings.decode.channels, Some(1));
    assert_eq!(settings.decode.frames_per_thread, Some(250));
    assert_eq!(settings.decode.codec.as_deref(), Some("ima-adpcm"));
    assert_eq!(settings.logging.file, Some(PathBuf::from("/tmp/pardec.log")));
    assert_eq!(settings.logging.verbose, None);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    match load_settings(Some(&missing)) {
        Err(Error::SettingsRead { path, .. }) => assert_eq!(path, missing),
        other => panic!("Expected SettingsRead error, got {:?}", other),
    }
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, "[decode]\nchannels = \"two\"\n");

    assert!(matches!(
        load_settings(Some(&path)),
        Err(Error::SettingsParse { .. })
    ));
}

#[test]
#[serial]
fn test_env_overrides_file_value() {
    env::set_var("PARDEC_TEST_CHANNELS", "1");
    let value = resolve_setting(None, "PARDEC_TEST_CHANNELS", Some(2u16), 2).unwrap();
    env::remove_var("PARDEC_TEST_CHANNELS");

    assert_eq!(value, 1);
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    env::set_var("PARDEC_TEST_FRAMES", "100");
    let value = resolve_setting(Some(7u32), "PARDEC_TEST_FRAMES", Some(9), 500).unwrap();
    env::remove_var("PARDEC_TEST_FRAMES");

    assert_eq!(value, 7);
}

#[test]
#[serial]
fn test_file_then_default_when_env_unset() {
    env::remove_var("PARDEC_TEST_FRAMES");

    assert_eq!(resolve_setting(None, "PARDEC_TEST_FRAMES", Some(9u32), 500).unwrap(), 9);
    assert_eq!(resolve_setting(None, "PARDEC_TEST_FRAMES", None, 500u32).unwrap(), 500);
}

#[test]
#[serial]
fn test_empty_env_value_is_ignored() {
    env::set_var("PARDEC_TEST_LOG", "   ");
    let value = resolve_optional::<PathBuf>(None, "PARDEC_TEST_LOG", None).unwrap();
    env::remove_var("PARDEC_TEST_LOG");

    assert!(value.is_none());
}

#[test]
#[serial]
fn test_unparseable_env_value_is_config_error() {
    env::set_var("PARDEC_TEST_CHANNELS", "stereo");
    let result = resolve_setting(None, "PARDEC_TEST_CHANNELS", None, 2u16);
    env::remove_var("PARDEC_TEST_CHANNELS");

    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("PARDEC_TEST_CHANNELS"), "{}", msg),
        other => panic!("Expected Config error, got {:?}", other),
    }
}

#[test]
fn test_default_settings_are_empty() {
    let settings = Settings::default();
    assert!(settings.decode.channels.is_none());
    assert!(settings.logging.file.is_none());
}
