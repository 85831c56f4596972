//! Release workflows behind the `status`, `versions`, `increment`, `prepare`
//! and `tag` commands.
//!
//! Workflows gather and mutate state but never print; the binary renders the
//! returned reports.

use chrono::{NaiveDate, Utc};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::changelog::ChangelogGenerator;
use crate::config::{Config, FilesConfig};
use crate::consistency::{ConsistencyChecker, ValidationResult};
use crate::declaration::DeclarationFile;
use crate::domain::{milestone_for, IncrementPolicy, Milestone, Version};
use crate::error::{ReleaseError, Result};
use crate::history::HistoryMiner;
use crate::vcs::Repository;

/// Snapshot of the release state of the working copy
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub branch: Option<String>,
    /// `None` when the working tree state could not be determined
    pub clean: Option<bool>,
    pub validation: ValidationResult,
    pub latest_tag: Option<String>,
    pub commits_since_tag: usize,
}

/// Local and remote tags
#[derive(Debug, Clone)]
pub struct VersionsReport {
    pub local: Vec<String>,
    pub remote: std::result::Result<Vec<String>, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareOptions {
    pub allow_dirty: bool,
    pub commit: bool,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        PrepareOptions {
            allow_dirty: false,
            commit: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrepareOutcome {
    pub version: Version,
    pub milestone: Milestone,
    pub release_notes: PathBuf,
    pub commit: Option<String>,
    pub validation: ValidationResult,
}

/// A validated, not yet created release tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPlan {
    pub version: Version,
    pub milestone: Milestone,
    pub tag: String,
    pub message: String,
}

impl TagPlan {
    pub fn refname(&self) -> String {
        format!("refs/tags/{}", self.tag)
    }
}

/// Sort tags newest first by semantic-version precedence
///
/// Tags that do not parse (after removing `prefix`) follow in lexicographic order.
pub fn sort_tags(tags: &[String], prefix: &str) -> Vec<String> {
    let parse = |tag: &str| semver::Version::parse(tag.strip_prefix(prefix).unwrap_or(tag)).ok();

    let mut sorted = tags.to_vec();
    sorted.sort_by(|a, b| match (parse(a), parse(b)) {
        (Some(va), Some(vb)) => vb.cmp(&va).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    });
    sorted.dedup();
    sorted
}

/// Version declared in the package manifest under `root`
pub fn manifest_version(root: &Path, files: &FilesConfig) -> Result<Version> {
    let file = DeclarationFile::load(files.manifest_path(root))?;
    let declaration = file.field(&files.manifest_version_key)?;
    Version::parse(&declaration.value)
}

/// Next version under `policy`, starting from the manifest version
///
/// The policy is checked before the manifest is read.
pub fn next_version(root: &Path, files: &FilesConfig, policy: &str) -> Result<Version> {
    let policy: IncrementPolicy = policy.parse()?;
    let current = manifest_version(root, files)?;
    let next = current.increment(policy);
    debug!(%current, %next, %policy, "computed next version");
    Ok(next)
}

pub struct ReleaseManager<'a, R: Repository + ?Sized> {
    root: PathBuf,
    config: &'a Config,
    repo: &'a R,
}

impl<'a, R: Repository + ?Sized> ReleaseManager<'a, R> {
    pub fn new(root: impl Into<PathBuf>, config: &'a Config, repo: &'a R) -> Self {
        ReleaseManager {
            root: root.into(),
            config,
            repo,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn checker(&self) -> ConsistencyChecker {
        ConsistencyChecker::new(&self.root, &self.config.files)
    }

    pub fn validate(&self, target: Option<&str>) -> ValidationResult {
        self.checker().validate_consistency(target)
    }

    /// Version declared in the package manifest
    pub fn current_version(&self) -> Result<Version> {
        manifest_version(&self.root, &self.config.files)
    }

    pub fn next_version(&self, policy: &str) -> Result<Version> {
        next_version(&self.root, &self.config.files, policy)
    }

    pub fn status(&self) -> StatusReport {
        let miner = HistoryMiner::new(self.repo);
        let latest_tag = miner.latest_tag();
        let commits_since_tag = miner.commits_since(latest_tag.as_deref()).len();

        StatusReport {
            branch: self.repo.current_branch().ok().flatten(),
            clean: self.repo.is_clean().ok(),
            validation: self.validate(None),
            latest_tag,
            commits_since_tag,
        }
    }

    pub fn versions(&self) -> Result<VersionsReport> {
        let prefix = &self.config.project.tag_prefix;
        let local = sort_tags(&self.repo.local_tags()?, prefix);
        let remote = self
            .repo
            .remote_tags(&self.config.project.remote)
            .map(|tags| sort_tags(&tags, prefix))
            .map_err(|e| e.to_string());
        Ok(VersionsReport { local, remote })
    }

    fn ensure_clean(&self) -> Result<()> {
        if self.repo.is_clean()? {
            Ok(())
        } else {
            Err(ReleaseError::release(
                "working tree has uncommitted changes; commit or stash them first",
            ))
        }
    }

    /// Bump the declaration files to `version` and write its release notes
    pub fn prepare(&self, version: &str, options: PrepareOptions) -> Result<PrepareOutcome> {
        self.prepare_at(version, options, Utc::now().date_naive())
    }

    pub fn prepare_at(
        &self,
        version: &str,
        options: PrepareOptions,
        date: NaiveDate,
    ) -> Result<PrepareOutcome> {
        let version = Version::parse(version)?;
        if !options.allow_dirty {
            self.ensure_clean()?;
        }
        let milestone = milestone_for(&version);
        let files = &self.config.files;

        let manifest_path = files.manifest_path(&self.root);
        let mut manifest = DeclarationFile::load(&manifest_path)?;
        manifest.set_field(&files.manifest_version_key, version.as_str())?;

        let metadata_path = files.metadata_path(&self.root);
        let mut metadata = DeclarationFile::load(&metadata_path)?;
        metadata.set_field(&files.metadata_version_key, version.as_str())?;
        metadata.set_field(&files.metadata_milestone_key, milestone.label())?;

        manifest.save()?;
        metadata.save()?;
        info!(%version, %milestone, "updated version declarations");

        let validation = self.validate(Some(version.as_str()));
        if !validation.is_valid() {
            return Err(ReleaseError::release(format!(
                "version files are inconsistent after update: {}",
                validation.errors().join("; ")
            )));
        }

        let tag = self.config.project.tag_for(version.as_str());
        let release_notes = files.release_notes_path(&self.root, &tag);
        ChangelogGenerator::new(self.repo, &self.config.project)
            .generate_at(&version, milestone, date)
            .write_to(&release_notes)?;

        let commit = if options.commit {
            let touched = [&manifest_path, &metadata_path, &release_notes]
                .iter()
                .map(|path| path.canonicalize())
                .collect::<std::io::Result<Vec<PathBuf>>>()?;
            let paths: Vec<&Path> = touched.iter().map(PathBuf::as_path).collect();
            let message = format!("chore(release): prepare {}", tag);
            Some(self.repo.commit_paths(&paths, &message)?)
        } else {
            None
        };

        Ok(PrepareOutcome {
            version,
            milestone,
            release_notes,
            commit,
            validation,
        })
    }

    /// Check every precondition for tagging `version`
    pub fn plan_tag(&self, version: &str) -> Result<TagPlan> {
        let version = Version::parse(version)?;

        let validation = self.validate(Some(version.as_str()));
        if !validation.is_valid() {
            return Err(ReleaseError::release(format!(
                "version files do not match {}: {}",
                version,
                validation.errors().join("; ")
            )));
        }
        self.ensure_clean()?;

        let tag = self.config.project.tag_for(version.as_str());
        if self.repo.local_tags()?.iter().any(|t| *t == tag) {
            return Err(ReleaseError::release(format!("tag '{}' already exists", tag)));
        }

        let milestone = milestone_for(&version);
        Ok(TagPlan {
            message: format!("Release {} ({})", tag, milestone),
            version,
            milestone,
            tag,
        })
    }

    /// Create the planned annotated tag on HEAD
    pub fn create_tag(&self, plan: &TagPlan) -> Result<()> {
        self.repo.create_annotated_tag(&plan.tag, &plan.message)?;
        info!(tag = %plan.tag, "created tag");
        Ok(())
    }

    /// Push a created tag to the configured remote
    pub fn push_tag(&self, plan: &TagPlan) -> Result<()> {
        let remote = &self.config.project.remote;
        self.repo.push_ref(remote, &plan.refname())?;
        info!(tag = %plan.tag, %remote, "pushed tag");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sort_tags_by_precedence() {
        let sorted = sort_tags(
            &tags(&["v0.2.0", "v0.10.0", "v0.2.0-rc.1", "nightly", "v1.0.0", "alpha"]),
            "v",
        );
        assert_eq!(
            sorted,
            tags(&["v1.0.0", "v0.10.0", "v0.2.0", "v0.2.0-rc.1", "alpha", "nightly"])
        );
    }

    #[test]
    fn test_sort_tags_dedups() {
        assert_eq!(sort_tags(&tags(&["v0.1.0", "v0.1.0"]), "v"), tags(&["v0.1.0"]));
    }

    #[test]
    fn test_tag_plan_refname() {
        let plan = TagPlan {
            version: Version::new(0, 1, 0),
            milestone: Milestone::M0,
            tag: "v0.1.0".to_string(),
            message: "Release v0.1.0 (M0)".to_string(),
        };
        assert_eq!(plan.refname(), "refs/tags/v0.1.0");
    }
}
