//! Integration tests for layered configuration loading

use frame_id_map::config::{global_config_path, ConfigLoader, DEFAULT_OWNER_THREAD_NAME};
use std::fs;
use tempfile::TempDir;

use crate::integration::test_utils::with_env;

#[test]
fn test_defaults_without_any_source() {
    let config_home = TempDir::new().unwrap();
    let config = with_env(
        &[("XDG_CONFIG_HOME", config_home.path().to_str().unwrap())],
        || ConfigLoader::load(None).unwrap(),
    );
    assert_eq!(config.owner.thread_name, DEFAULT_OWNER_THREAD_NAME);
    assert_eq!(config.dispatch.max_completions_per_pump, 0);
    assert_eq!(config.logging.output, "stderr");
}

#[test]
fn test_global_then_explicit_then_environment() {
    let config_home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    let global_dir = config_home.path().join("frame-id-map");
    fs::create_dir_all(&global_dir).unwrap();
    fs::write(
        global_dir.join("config.toml"),
        "[owner]\nthread_name = \"global-owner\"\n\n[dispatch]\nmax_completions_per_pump = 4\n\n[logging]\nlevel = \"warn\"\n",
    )
    .unwrap();

    let explicit = work.path().join("override.toml");
    fs::write(&explicit, "[dispatch]\nmax_completions_per_pump = 8\n").unwrap();

    let config = with_env(
        &[
            ("XDG_CONFIG_HOME", config_home.path().to_str().unwrap()),
            ("FRAME_ID_MAP_OWNER__THREAD_NAME", "env-owner"),
        ],
        || {
            assert_eq!(
                global_config_path().unwrap(),
                global_dir.join("config.toml")
            );
            ConfigLoader::load(Some(&explicit)).unwrap()
        },
    );

    // Environment beats both files.
    assert_eq!(config.owner.thread_name, "env-owner");
    // Explicit file beats the global file.
    assert_eq!(config.dispatch.max_completions_per_pump, 8);
    // Untouched keys fall through from the global file.
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_missing_explicit_file_fails() {
    let config_home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let missing = work.path().join("nope.toml");

    let result = with_env(
        &[("XDG_CONFIG_HOME", config_home.path().to_str().unwrap())],
        || ConfigLoader::load(Some(&missing)),
    );
    assert!(result.is_err());
}

#[test]
fn test_invalid_values_are_reported_together() {
    let work = TempDir::new().unwrap();
    let path = work.path().join("bad.toml");
    fs::write(
        &path,
        "[owner]\nthread_name = \"\"\n\n[logging]\nlevel = \"loud\"\noutput = \"printer\"\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 3);
    assert!(config.ensure_valid().is_err());
}
