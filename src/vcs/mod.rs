//! Version control abstraction layer
//!
//! Release tooling talks to git only through the traits in this module:
//!
//! - [History]: the two read queries history mining needs (`tags`, `log_range`)
//! - [Repository]: the workflow operations used by `status`, `versions`,
//!   `prepare` and `tag`
//!
//! Implementations:
//!
//! - [repository::Git2Repository]: a real repository opened through `git2`
//! - [mock::MockRepository]: an in-memory repository for tests

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::CommitRecord;
use crate::error::Result;
use std::path::Path;

/// Read-only history queries
pub trait History {
    /// Tags reachable from HEAD, nearest first
    ///
    /// The first element is what `git describe --tags --abbrev=0` reports.
    fn tags(&self) -> Result<Vec<String>>;

    /// Non-merge commits reachable from `until` but not from `since`
    ///
    /// Returns commits in chronological order (oldest first). With `since`
    /// set to `None` the whole history of `until` is returned. An unknown
    /// `since` ref is an error.
    fn log_range(&self, since: Option<&str>, until: &str) -> Result<Vec<CommitRecord>>;
}

/// Workflow operations on top of [History]
pub trait Repository: History {
    /// Short name of the checked-out branch, `None` when HEAD is detached
    fn current_branch(&self) -> Result<Option<String>>;

    /// All local tag names
    fn local_tags(&self) -> Result<Vec<String>>;

    /// Tag names advertised by a remote
    fn remote_tags(&self, remote: &str) -> Result<Vec<String>>;

    /// Whether tracked files have no staged or unstaged changes
    fn is_clean(&self) -> Result<bool>;

    /// Stage `paths` (relative to the work tree) and commit them on HEAD
    ///
    /// Returns the new commit hash.
    fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<String>;

    /// Create an annotated tag on HEAD
    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Push a fully qualified ref (e.g. `refs/tags/v0.1.0`) to a remote
    fn push_ref(&self, remote: &str, refname: &str) -> Result<()>;
}

/// History used when no repository could be opened; every query fails
///
/// Mining treats the failures as an empty history, so changelogs still render.
#[derive(Debug, Clone)]
pub struct NoRepository {
    reason: String,
}

impl NoRepository {
    pub fn new(reason: impl Into<String>) -> Self {
        NoRepository {
            reason: reason.into(),
        }
    }
}

impl History for NoRepository {
    fn tags(&self) -> Result<Vec<String>> {
        Err(crate::error::ReleaseError::vcs(self.reason.clone()))
    }

    fn log_range(&self, _since: Option<&str>, _until: &str) -> Result<Vec<CommitRecord>> {
        Err(crate::error::ReleaseError::vcs(self.reason.clone()))
    }
}
