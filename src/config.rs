use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReleaseError, Result};

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "harbor-release.toml";

/// Represents the complete configuration for harbor-release.
///
/// Contains project metadata used when rendering release notes and the
/// locations of the files that declare the project version.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub files: FilesConfig,
}

fn default_project_name() -> String {
    "Harbor Container Updater".to_string()
}

fn default_repository() -> String {
    "https://github.com/DeusExTaco/harbor".to_string()
}

fn default_image() -> String {
    "ghcr.io/deusextaco/harbor".to_string()
}

fn default_tag_prefix() -> String {
    "v".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

/// Project identity used in release notes and tags.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProjectConfig {
    #[serde(default = "default_project_name")]
    pub name: String,

    /// Web URL of the repository, used for compare links
    #[serde(default = "default_repository")]
    pub repository: String,

    /// Container image reference without a tag
    #[serde(default = "default_image")]
    pub image: String,

    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    #[serde(default = "default_remote")]
    pub remote: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            name: default_project_name(),
            repository: default_repository(),
            image: default_image(),
            tag_prefix: default_tag_prefix(),
            remote: default_remote(),
        }
    }
}

impl ProjectConfig {
    /// Tag name for a version, e.g. `v0.1.0`
    pub fn tag_for(&self, version: &str) -> String {
        format!("{}{}", self.tag_prefix, version)
    }
}

fn default_manifest() -> PathBuf {
    PathBuf::from("pyproject.toml")
}

fn default_metadata() -> PathBuf {
    PathBuf::from("app/__init__.py")
}

fn default_manifest_version_key() -> String {
    "version".to_string()
}

fn default_metadata_version_key() -> String {
    "__version__".to_string()
}

fn default_metadata_milestone_key() -> String {
    "__milestone__".to_string()
}

fn default_release_notes_dir() -> PathBuf {
    PathBuf::from("release-notes")
}

/// Locations of the version declaration files.
///
/// Relative paths are resolved against the project root.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FilesConfig {
    /// Package manifest declaring `version`
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// Application metadata declaring version and milestone
    #[serde(default = "default_metadata")]
    pub metadata: PathBuf,

    #[serde(default = "default_manifest_version_key")]
    pub manifest_version_key: String,

    #[serde(default = "default_metadata_version_key")]
    pub metadata_version_key: String,

    #[serde(default = "default_metadata_milestone_key")]
    pub metadata_milestone_key: String,

    #[serde(default = "default_release_notes_dir")]
    pub release_notes_dir: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        FilesConfig {
            manifest: default_manifest(),
            metadata: default_metadata(),
            manifest_version_key: default_manifest_version_key(),
            metadata_version_key: default_metadata_version_key(),
            metadata_milestone_key: default_metadata_milestone_key(),
            release_notes_dir: default_release_notes_dir(),
        }
    }
}

impl FilesConfig {
    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        root.join(&self.manifest)
    }

    pub fn metadata_path(&self, root: &Path) -> PathBuf {
        root.join(&self.metadata)
    }

    pub fn release_notes_path(&self, root: &Path, tag: &str) -> PathBuf {
        root.join(&self.release_notes_dir)
            .join(format!("{}.md", tag))
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `harbor-release.toml` in the project root
/// 3. `.harbor-release.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>, root: &Path) -> Result<Config> {
    let local = root.join(CONFIG_FILE_NAME);

    let path = if let Some(path) = config_path {
        if !path.exists() {
            return Err(ReleaseError::FileNotFound(path.to_path_buf()));
        }
        path.to_path_buf()
    } else if local.exists() {
        local
    } else if let Some(config_dir) = dirs::config_dir() {
        let user_path = config_dir.join(format!(".{}", CONFIG_FILE_NAME));
        if user_path.exists() {
            user_path
        } else {
            tracing::debug!("no configuration file found, using defaults");
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    tracing::debug!(path = %path.display(), "loading configuration");
    let config_str = fs::read_to_string(&path)?;
    parse_config(&config_str)
}

/// Parse configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| ReleaseError::config(e.to_string()))
}
