//! Commit history mining.
//!
//! Mining is best-effort: a failing query is logged and treated as "nothing
//! found", so an unreachable VCS and a repository without tags look the same
//! to the changelog.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::domain::{classify, CommitCategory, CommitRecord};
use crate::vcs::History;

/// Commits grouped by category, each group in history order
pub type CategorizedCommits = BTreeMap<CommitCategory, Vec<CommitRecord>>;

pub struct HistoryMiner<'a, H: History + ?Sized> {
    history: &'a H,
}

impl<'a, H: History + ?Sized> HistoryMiner<'a, H> {
    pub fn new(history: &'a H) -> Self {
        HistoryMiner { history }
    }

    /// Nearest tag reachable from HEAD, `None` if there is none or the query fails
    pub fn latest_tag(&self) -> Option<String> {
        match self.history.tags() {
            Ok(tags) => tags.into_iter().next(),
            Err(e) => {
                debug!(error = %e, "tag lookup failed");
                None
            }
        }
    }

    /// Commits after `tag` up to HEAD, oldest first; full history without a tag
    pub fn commits_since(&self, tag: Option<&str>) -> Vec<CommitRecord> {
        match self.history.log_range(tag, "HEAD") {
            Ok(commits) => {
                debug!(since = ?tag, count = commits.len(), "mined commits");
                commits
            }
            Err(e) => {
                warn!(since = ?tag, error = %e, "history unavailable, continuing without commits");
                Vec::new()
            }
        }
    }
}

/// Group commits by category; every category has an entry, possibly empty
pub fn categorize(commits: &[CommitRecord]) -> CategorizedCommits {
    let mut categorized: CategorizedCommits = CommitCategory::RENDER_ORDER
        .iter()
        .map(|category| (*category, Vec::new()))
        .collect();

    for commit in commits {
        categorized
            .entry(classify(commit))
            .or_default()
            .push(commit.clone());
    }
    categorized
}

/// Distinct commit authors in lexicographic order
pub fn contributors(commits: &[CommitRecord]) -> Vec<String> {
    commits
        .iter()
        .map(|commit| commit.author.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
