//! Cross-file version consistency checks.
//!
//! The checker is read-only and never aborts half way: every failure is
//! recorded in the returned [`ValidationResult`] and the remaining checks still
//! run on whatever could be read.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::FilesConfig;
use crate::declaration::DeclarationFile;
use crate::domain::{milestone_for, Version};
use crate::error::ReleaseError;
use crate::warning::ReleaseWarning;

/// Values gathered during a validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pyproject_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_milestone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_milestone: Option<String>,
}

impl ValidationInfo {
    /// Gathered entries in display order
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("pyproject_version", &self.pyproject_version),
            ("app_version", &self.app_version),
            ("app_milestone", &self.app_milestone),
            ("expected_milestone", &self.expected_milestone),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }
}

/// Outcome of a consistency check
///
/// `valid` turns false on the first error and never reverts; warnings do not
/// affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
    info: ValidationInfo,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        ValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            info: ValidationInfo::default(),
        }
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.valid = false;
        self.errors.push(error.into());
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn info(&self) -> &ValidationInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut ValidationInfo {
        &mut self.info
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Reads the version declarations and checks that they agree
#[derive(Debug, Clone)]
pub struct ConsistencyChecker {
    manifest: PathBuf,
    metadata: PathBuf,
    manifest_label: String,
    metadata_label: String,
    manifest_version_key: String,
    metadata_version_key: String,
    metadata_milestone_key: String,
}

impl ConsistencyChecker {
    /// Build a checker for the files configured under `root`
    pub fn new(root: &Path, files: &FilesConfig) -> Self {
        ConsistencyChecker {
            manifest: files.manifest_path(root),
            metadata: files.metadata_path(root),
            manifest_label: files.manifest.display().to_string(),
            metadata_label: files.metadata.display().to_string(),
            manifest_version_key: files.manifest_version_key.clone(),
            metadata_version_key: files.metadata_version_key.clone(),
            metadata_milestone_key: files.metadata_milestone_key.clone(),
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata
    }

    /// Validate both declaration files against each other and, optionally, `target`
    pub fn validate_consistency(&self, target: Option<&str>) -> ValidationResult {
        let mut result = ValidationResult::new();

        let manifest_raw = match DeclarationFile::load(&self.manifest)
            .and_then(|file| file.field(&self.manifest_version_key))
        {
            Ok(declaration) => Some(declaration.value),
            Err(e) => {
                result.add_error(e.to_string());
                None
            }
        };
        result.info.pyproject_version = manifest_raw.clone();

        let (app_raw, app_milestone) = match DeclarationFile::load(&self.metadata) {
            Ok(file) => {
                let version = match file.field(&self.metadata_version_key) {
                    Ok(declaration) => Some(declaration.value),
                    Err(e) => {
                        result.add_error(e.to_string());
                        None
                    }
                };
                let milestone = match file.field(&self.metadata_milestone_key) {
                    Ok(declaration) => Some(declaration.value),
                    Err(e) => {
                        result.add_error(e.to_string());
                        None
                    }
                };
                (version, milestone)
            }
            Err(e) => {
                result.add_error(e.to_string());
                (None, None)
            }
        };
        result.info.app_version = app_raw.clone();
        result.info.app_milestone = app_milestone.clone();

        let manifest_version = manifest_raw
            .as_deref()
            .and_then(|raw| self.parse_declared(raw, &self.manifest_label, &mut result));
        let app_version = app_raw
            .as_deref()
            .and_then(|raw| self.parse_declared(raw, &self.metadata_label, &mut result));

        if let (Some(manifest), Some(app)) = (&manifest_version, &app_version) {
            if manifest != app {
                result.add_error(
                    ReleaseError::VersionMismatch {
                        left_label: self.manifest_label.clone(),
                        left: manifest.to_string(),
                        right_label: self.metadata_label.clone(),
                        right: app.to_string(),
                    }
                    .to_string(),
                );
            }
        }

        if let Some(target) = target {
            match Version::parse(target) {
                Err(e) => result.add_error(format!("{} (target)", e)),
                Ok(target_version) => {
                    if let Some(current) = &manifest_raw {
                        if current != target_version.as_str() {
                            result.add_error(
                                ReleaseError::TargetMismatch {
                                    current: current.clone(),
                                    target: target_version.to_string(),
                                }
                                .to_string(),
                            );
                        }
                    }
                }
            }
        }

        if let Some(manifest) = &manifest_version {
            let expected = milestone_for(manifest);
            result.info.expected_milestone = Some(expected.label().to_string());

            if let Some(declared) = &app_milestone {
                if declared != expected.label() {
                    result.add_warning(
                        ReleaseWarning::MilestoneMismatch {
                            declared: declared.clone(),
                            expected: expected.label().to_string(),
                            version: manifest.to_string(),
                        }
                        .to_string(),
                    );
                }
            }
        }

        debug!(
            valid = result.is_valid(),
            errors = result.errors().len(),
            warnings = result.warnings().len(),
            "consistency check finished"
        );
        result
    }

    fn parse_declared(
        &self,
        raw: &str,
        label: &str,
        result: &mut ValidationResult,
    ) -> Option<Version> {
        match Version::parse(raw) {
            Ok(version) => Some(version),
            Err(e) => {
                result.add_error(format!("{} in {}", e, label));
                None
            }
        }
    }
}
