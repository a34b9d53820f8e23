//! Config file resolution tests
//!
//! Uses serial_test to prevent environment variable races: tests that touch
//! MONOTRACK_CONFIG are marked #[serial].

use monotrack_common::config::{ConfigResolver, CONFIG_ENV_VAR};
use monotrack_common::Error;
use serial_test::serial;
use std::env;
use std::path::Path;

#[test]
#[serial]
fn test_env_var_used_when_no_cli_arg() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("env.toml");
    std::fs::write(&path, "[server]\nport = 6000\n").unwrap();

    env::set_var(CONFIG_ENV_VAR, &path);
    let resolved = ConfigResolver::new().resolve(None).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved.as_deref(), Some(path.as_path()));
}

#[test]
#[serial]
fn test_cli_arg_beats_env_var() {
    let dir = tempfile::tempdir().unwrap();
    let env_path = dir.path().join("env.toml");
    let cli_path = dir.path().join("cli.toml");
    std::fs::write(&env_path, "").unwrap();
    std::fs::write(&cli_path, "").unwrap();

    env::set_var(CONFIG_ENV_VAR, &env_path);
    let resolved = ConfigResolver::new().resolve(Some(&cli_path)).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved.as_deref(), Some(cli_path.as_path()));
}

#[test]
#[serial]
fn test_missing_env_file_is_config_error() {
    env::set_var(CONFIG_ENV_VAR, "/nonexistent/dir/monotrack.toml");
    let result = ConfigResolver::new().resolve(None);
    env::remove_var(CONFIG_ENV_VAR);

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_read_returns_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("read.toml");
    std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

    let (_, contents) = ConfigResolver::new()
        .read(Some(Path::new(&path)))
        .unwrap()
        .unwrap();
    assert!(contents.contains("debug"));
}
