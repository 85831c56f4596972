use crate::domain::CommitRecord;
use crate::error::{ReleaseError, Result};
use crate::vcs::{History, Repository};
use std::cell::RefCell;
use std::path::Path;

/// Mock repository for testing without actual git operations
///
/// History is a single linear branch. Tags point at commit positions, and
/// workflow operations are recorded so tests can assert on them.
#[derive(Debug, Default)]
pub struct MockRepository {
    commits: Vec<CommitRecord>,
    /// (tag name, number of commits it covers)
    tags: Vec<(String, usize)>,
    remote_tags: Vec<String>,
    branch: Option<String>,
    dirty: bool,
    fail_queries: bool,
    created_tags: RefCell<Vec<(String, String)>>,
    pushed_refs: RefCell<Vec<(String, String)>>,
    commits_made: RefCell<Vec<String>>,
}

impl MockRepository {
    /// Create a new empty mock repository on branch `main`
    pub fn new() -> Self {
        MockRepository {
            branch: Some("main".to_string()),
            ..Default::default()
        }
    }

    /// Append a commit on top of the current history
    pub fn add_commit(&mut self, commit: CommitRecord) {
        self.commits.push(commit);
    }

    /// Tag the current tip of history
    pub fn tag_head(&mut self, name: impl Into<String>) {
        self.tags.push((name.into(), self.commits.len()));
    }

    pub fn add_remote_tag(&mut self, name: impl Into<String>) {
        self.remote_tags.push(name.into());
    }

    pub fn set_branch(&mut self, branch: Option<&str>) {
        self.branch = branch.map(str::to_string);
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Make every history query fail, as an unavailable VCS would
    pub fn fail_queries(&mut self) {
        self.fail_queries = true;
    }

    /// Annotated tags created so far as (name, message)
    pub fn created_tags(&self) -> Vec<(String, String)> {
        self.created_tags.borrow().clone()
    }

    /// Refs pushed so far as (remote, ref)
    pub fn pushed_refs(&self) -> Vec<(String, String)> {
        self.pushed_refs.borrow().clone()
    }

    /// Commit messages recorded by `commit_paths`
    pub fn commits_made(&self) -> Vec<String> {
        self.commits_made.borrow().clone()
    }

    fn check_available(&self) -> Result<()> {
        if self.fail_queries {
            Err(ReleaseError::vcs("mock repository unavailable"))
        } else {
            Ok(())
        }
    }

    fn position_of(&self, reference: &str) -> Result<usize> {
        if reference == "HEAD" {
            return Ok(self.commits.len());
        }
        self.tags
            .iter()
            .find(|(name, _)| name == reference)
            .map(|(_, position)| *position)
            .ok_or_else(|| ReleaseError::vcs(format!("unknown revision '{}'", reference)))
    }
}

impl History for MockRepository {
    fn tags(&self) -> Result<Vec<String>> {
        self.check_available()?;
        let mut tags: Vec<&(String, usize)> = self.tags.iter().collect();
        // Nearest first; later-created tags win ties
        tags.reverse();
        tags.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(tags.into_iter().map(|(name, _)| name.clone()).collect())
    }

    fn log_range(&self, since: Option<&str>, until: &str) -> Result<Vec<CommitRecord>> {
        self.check_available()?;
        let start = match since {
            Some(since) => self.position_of(since)?,
            None => 0,
        };
        let end = self.position_of(until)?;
        if start >= end {
            return Ok(Vec::new());
        }
        Ok(self.commits[start..end].to_vec())
    }
}

impl Repository for MockRepository {
    fn current_branch(&self) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.branch.clone())
    }

    fn local_tags(&self) -> Result<Vec<String>> {
        self.check_available()?;
        let mut tags: Vec<String> = self.tags.iter().map(|(name, _)| name.clone()).collect();
        tags.extend(self.created_tags.borrow().iter().map(|(name, _)| name.clone()));
        Ok(tags)
    }

    fn remote_tags(&self, remote: &str) -> Result<Vec<String>> {
        self.check_available()?;
        if remote != "origin" {
            return Err(ReleaseError::vcs(format!("Cannot find remote '{}'", remote)));
        }
        Ok(self.remote_tags.clone())
    }

    fn is_clean(&self) -> Result<bool> {
        self.check_available()?;
        Ok(!self.dirty)
    }

    fn commit_paths(&self, _paths: &[&Path], message: &str) -> Result<String> {
        self.check_available()?;
        let mut made = self.commits_made.borrow_mut();
        made.push(message.to_string());
        Ok(format!("{:040x}", made.len()))
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        if self.local_tags()?.iter().any(|t| t == name) {
            return Err(ReleaseError::release(format!("tag '{}' already exists", name)));
        }
        self.created_tags
            .borrow_mut()
            .push((name.to_string(), message.to_string()));
        Ok(())
    }

    fn push_ref(&self, remote: &str, refname: &str) -> Result<()> {
        self.check_available()?;
        self.pushed_refs
            .borrow_mut()
            .push((remote.to_string(), refname.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn commit(hash: &str, subject: &str) -> CommitRecord {
        CommitRecord::new(
            hash,
            subject,
            "Author",
            DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn test_mock_log_range() {
        let mut repo = MockRepository::new();
        repo.add_commit(commit("aaaaaaaa01", "first"));
        repo.tag_head("v0.1.0");
        repo.add_commit(commit("bbbbbbbb02", "second"));
        repo.add_commit(commit("cccccccc03", "third"));

        let since = repo.log_range(Some("v0.1.0"), "HEAD").unwrap();
        assert_eq!(since.len(), 2);
        assert_eq!(since[0].subject, "second");
        assert_eq!(repo.log_range(None, "HEAD").unwrap().len(), 3);
        assert!(repo.log_range(Some("v9.0.0"), "HEAD").is_err());
    }

    #[test]
    fn test_mock_tags_nearest_first() {
        let mut repo = MockRepository::new();
        repo.add_commit(commit("aaaaaaaa01", "first"));
        repo.tag_head("v0.1.0");
        repo.add_commit(commit("bbbbbbbb02", "second"));
        repo.tag_head("v0.2.0");
        assert_eq!(repo.tags().unwrap(), vec!["v0.2.0", "v0.1.0"]);
    }

    #[test]
    fn test_mock_failure_mode() {
        let mut repo = MockRepository::new();
        repo.fail_queries();
        assert!(repo.tags().is_err());
        assert!(repo.log_range(None, "HEAD").is_err());
    }

    #[test]
    fn test_mock_records_workflow_operations() {
        let repo = MockRepository::new();
        repo.create_annotated_tag("v0.1.0", "Release v0.1.0").unwrap();
        assert!(repo.create_annotated_tag("v0.1.0", "again").is_err());
        repo.push_ref("origin", "refs/tags/v0.1.0").unwrap();
        assert_eq!(
            repo.pushed_refs(),
            vec![("origin".to_string(), "refs/tags/v0.1.0".to_string())]
        );
        assert_eq!(repo.local_tags().unwrap(), vec!["v0.1.0"]);
    }
}
