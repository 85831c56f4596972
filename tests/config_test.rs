// tests/config_test.rs
use harbor_release::config::{load_config, Config, CONFIG_FILE_NAME};
use harbor_release::ReleaseError;
use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

/// Point `dirs::config_dir` at an empty directory for the duration of a test
struct ConfigHome {
    _dir: TempDir,
    previous: Option<String>,
}

impl ConfigHome {
    fn new() -> (Self, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();
        let previous = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", &path);
        (
            ConfigHome {
                _dir: dir,
                previous,
            },
            path,
        )
    }
}

impl Drop for ConfigHome {
    fn drop(&mut self) {
        match &self.previous {
            Some(value) => env::set_var("XDG_CONFIG_HOME", value),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }
    }
}

#[test]
#[serial]
fn test_defaults_without_any_file() {
    let (_home, _) = ConfigHome::new();
    let root = TempDir::new().unwrap();

    let config = load_config(None, root.path()).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn test_explicit_path() {
    let (_home, _) = ConfigHome::new();
    let root = TempDir::new().unwrap();
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
[project]
name = "Dockwatch"
tag_prefix = "release-"

[files]
manifest = "Cargo.toml"
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(Some(temp_file.path()), root.path()).unwrap();
    assert_eq!(config.project.name, "Dockwatch");
    assert_eq!(config.project.tag_for("1.0.0"), "release-1.0.0");
    assert_eq!(config.files.manifest, PathBuf::from("Cargo.toml"));
    assert_eq!(config.files.metadata, PathBuf::from("app/__init__.py"));
}

#[test]
#[serial]
fn test_missing_explicit_path_is_an_error() {
    let (_home, _) = ConfigHome::new();
    let root = TempDir::new().unwrap();
    let missing = root.path().join("nope.toml");

    let err = load_config(Some(&missing), root.path()).unwrap_err();
    assert!(matches!(err, ReleaseError::FileNotFound(path) if path == missing));
}

#[test]
#[serial]
fn test_project_file_wins_over_user_file() {
    let (_home, config_home) = ConfigHome::new();
    fs::write(
        config_home.join(format!(".{}", CONFIG_FILE_NAME)),
        "[project]\nremote = \"user\"\n",
    )
    .unwrap();
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join(CONFIG_FILE_NAME),
        "[project]\nremote = \"upstream\"\n",
    )
    .unwrap();

    let config = load_config(None, root.path()).unwrap();
    assert_eq!(config.project.remote, "upstream");
}

#[test]
#[serial]
fn test_user_file_is_used_without_project_file() {
    let (_home, config_home) = ConfigHome::new();
    fs::write(
        config_home.join(format!(".{}", CONFIG_FILE_NAME)),
        "[files]\nrelease_notes_dir = \"docs/releases\"\n",
    )
    .unwrap();
    let root = TempDir::new().unwrap();

    let config = load_config(None, root.path()).unwrap();
    assert_eq!(config.files.release_notes_dir, PathBuf::from("docs/releases"));
    assert_eq!(config.project.remote, "origin");
}

#[test]
#[serial]
fn test_malformed_file_is_a_config_error() {
    let (_home, _) = ConfigHome::new();
    let root = TempDir::new().unwrap();
    fs::write(root.path().join(CONFIG_FILE_NAME), "[files\nmanifest = 3").unwrap();

    let err = load_config(None, root.path()).unwrap_err();
    assert!(matches!(err, ReleaseError::Config(_)));
}
