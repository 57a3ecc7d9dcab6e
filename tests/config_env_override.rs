use serial_test::serial;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

use atomic_replace::config::{load_config, LoadResult, CONFIG_ENV};
use atomic_replace::{default_config_path, Durability, LogLevel};

#[test]
#[serial]
fn env_override_is_used_and_parsed() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("custom_config.xml");
    fs::write(
        &cfg_path,
        r#"<config>
  <log_level>info</log_level>
  <durability>data</durability>
  <file_mode>0640</file_mode>
  <sweep_min_age_seconds>90</sweep_min_age_seconds>
</config>"#,
    )
    .unwrap();

    // Serialized: the environment is process-wide
    unsafe {
        std::env::set_var(CONFIG_ENV, &cfg_path);
    }

    assert_eq!(default_config_path().unwrap(), cfg_path);
    let loaded = load_config();

    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }

    match loaded.unwrap() {
        LoadResult::Loaded(cfg, path) => {
            assert_eq!(path, cfg_path);
            assert_eq!(cfg.log_level, LogLevel::Info);
            assert_eq!(cfg.durability, Durability::Data);
            assert_eq!(cfg.file_mode, Some(0o640));
            assert!(cfg.preserve_permissions, "unset fields keep defaults");
            assert_eq!(cfg.sweep_min_age, Duration::from_secs(90));
        }
        other => panic!("expected Loaded, got {other:?}"),
    }
}

#[test]
#[serial]
fn missing_file_means_defaults() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("absent.xml");
    unsafe {
        std::env::set_var(CONFIG_ENV, &cfg_path);
    }
    let loaded = load_config();
    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }
    match loaded.unwrap() {
        LoadResult::Defaults(Some(p)) => assert_eq!(p, cfg_path),
        other => panic!("expected Defaults, got {other:?}"),
    }
}

#[test]
#[serial]
fn malformed_file_is_an_error() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("bad.xml");
    fs::write(&cfg_path, "<config><durability>whenever</durability></config>").unwrap();
    unsafe {
        std::env::set_var(CONFIG_ENV, &cfg_path);
    }
    let loaded = load_config();
    unsafe {
        std::env::remove_var(CONFIG_ENV);
    }
    assert!(loaded.is_err());
}
