use crate::domain::CommitRecord;
use crate::error::{ReleaseError, Result};
use crate::vcs::{History, Repository};
use chrono::{DateTime, Utc};
use git2::{ErrorCode, Oid, RemoteCallbacks, Repository as Git2Repo, Sort};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    fn commit_id(&self, revision: &str) -> Result<Oid> {
        let object = self.repo.revparse_single(revision)?;
        Ok(object.peel_to_commit()?.id())
    }

    /// Tag names grouped by the commit they point at
    fn tag_targets(&self) -> Result<HashMap<Oid, Vec<String>>> {
        let mut targets: HashMap<Oid, Vec<String>> = HashMap::new();

        for name in self.repo.tag_names(None)?.iter().flatten() {
            let Ok(reference) = self.repo.find_reference(&format!("refs/tags/{}", name)) else {
                continue;
            };
            // Tags on trees or blobs cannot be reached from a commit walk
            if let Ok(commit) = reference.peel_to_commit() {
                targets.entry(commit.id()).or_default().push(name.to_string());
            }
        }

        for names in targets.values_mut() {
            names.sort_by(|a, b| b.cmp(a));
        }
        Ok(targets)
    }

    fn head_commit(&self) -> Result<Option<git2::Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Path relative to the work tree, as the index expects
    fn index_path(&self, path: &Path) -> Result<PathBuf> {
        if !path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| ReleaseError::vcs("repository has no work tree"))?;
        let workdir = workdir.canonicalize()?;
        let absolute = path.canonicalize()?;
        absolute
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| {
                ReleaseError::vcs(format!(
                    "'{}' is outside the work tree '{}'",
                    path.display(),
                    workdir.display()
                ))
            })
    }
}

fn commit_record(commit: &git2::Commit<'_>) -> CommitRecord {
    let timestamp =
        DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0).unwrap_or_default();
    CommitRecord {
        hash: commit.id().to_string(),
        subject: commit.summary().unwrap_or("(empty message)").to_string(),
        author: commit.author().name().unwrap_or("unknown").to_string(),
        timestamp,
    }
}

/// Credential callbacks for network operations.
///
/// Tries SSH keys from `~/.ssh`, then the SSH agent, then git's credential
/// helpers for HTTPS remotes.
fn credential_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        if allowed_types.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
            if let Ok(config) = git2::Config::open_default() {
                if let Ok(cred) = git2::Cred::credential_helper(&config, url, username_from_url) {
                    return Ok(cred);
                }
            }
        }

        git2::Cred::default()
    });
    callbacks
}

impl History for Git2Repository {
    fn tags(&self) -> Result<Vec<String>> {
        let targets = self.tag_targets()?;
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        let Some(head) = self.head_commit()? else {
            return Ok(Vec::new());
        };

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head.id())?;

        let mut reachable = Vec::new();
        for oid in revwalk {
            if let Some(names) = targets.get(&oid?) {
                reachable.extend(names.iter().cloned());
            }
        }
        Ok(reachable)
    }

    fn log_range(&self, since: Option<&str>, until: &str) -> Result<Vec<CommitRecord>> {
        let until_oid = self
            .commit_id(until)
            .map_err(|e| ReleaseError::vcs(format!("cannot resolve '{}': {}", until, e)))?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(until_oid)?;

        if let Some(since) = since {
            let since_oid = self
                .commit_id(since)
                .map_err(|e| ReleaseError::vcs(format!("cannot resolve '{}': {}", since, e)))?;
            revwalk.hide(since_oid)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            if commit.parent_count() > 1 {
                continue;
            }
            commits.push(commit_record(&commit));
        }

        // Revwalk yields newest first
        commits.reverse();
        debug!(since = ?since, until, count = commits.len(), "walked history");
        Ok(commits)
    }
}

impl Repository for Git2Repository {
    fn current_branch(&self) -> Result<Option<String>> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(str::to_string)),
            Ok(_) => Ok(None),
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.repo.find_reference("HEAD")?;
                Ok(head
                    .symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(str::to_string))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn local_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn remote_tags(&self, remote: &str) -> Result<Vec<String>> {
        let mut handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| ReleaseError::vcs(format!("Cannot find remote '{}': {}", remote, e)))?;

        let mut connection = handle
            .connect_auth(git2::Direction::Fetch, Some(credential_callbacks()), None)
            .map_err(|e| ReleaseError::vcs(format!("Cannot connect to '{}': {}", remote, e)))?;

        let mut tags: Vec<String> = connection
            .remote()
            .list()?
            .iter()
            .filter_map(|head| head.name().strip_prefix("refs/tags/"))
            .map(|name| name.trim_end_matches("^{}").to_string())
            .collect();

        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    fn is_clean(&self) -> Result<bool> {
        let mut options = git2::StatusOptions::new();
        options.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses.is_empty())
    }

    fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<String> {
        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(&self.index_path(path)?)?;
        }
        index.write()?;

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = self.repo.signature()?;
        let parent = self.head_commit()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        debug!(commit = %oid, "created commit");
        Ok(oid.to_string())
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        let target = self.repo.head()?.peel(git2::ObjectType::Commit)?;
        let signature = self.repo.signature()?;

        self.repo
            .tag(name, &target, &signature, message, false)
            .map_err(|e| ReleaseError::release(format!("Cannot create tag '{}': {}", name, e)))?;
        Ok(())
    }

    fn push_ref(&self, remote: &str, refname: &str) -> Result<()> {
        let mut handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| ReleaseError::vcs(format!("Cannot find remote '{}': {}", remote, e)))?;

        let mut callbacks = credential_callbacks();
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "Push rejected for {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec = format!("{}:{}", refname, refname);
        handle
            .push(&[refspec.as_str()], Some(&mut push_options))
            .map_err(|e| match e.class() {
                git2::ErrorClass::Net => {
                    ReleaseError::vcs(format!("Network error during push: {}", e))
                }
                _ => ReleaseError::vcs(format!("Failed to push '{}': {}", refname, e)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, Git2Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test Author").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        (dir, Git2Repository::from_git2(repo))
    }

    fn commit_file(dir: &TempDir, repo: &Git2Repository, name: &str, message: &str) -> String {
        fs::write(dir.path().join(name), message).unwrap();
        repo.commit_paths(&[Path::new(name)], message).unwrap()
    }

    #[test]
    fn test_empty_repository_has_no_tags() {
        let (_dir, repo) = init_repo();
        assert!(repo.tags().unwrap().is_empty());
        assert!(repo.current_branch().unwrap().is_some());
    }

    #[test]
    fn test_log_range_since_tag() {
        let (dir, repo) = init_repo();
        commit_file(&dir, &repo, "a.txt", "chore: initial");
        repo.create_annotated_tag("v0.1.0", "Release v0.1.0").unwrap();
        commit_file(&dir, &repo, "b.txt", "feat: add b");
        commit_file(&dir, &repo, "c.txt", "fix: repair c");

        assert_eq!(repo.tags().unwrap(), vec!["v0.1.0".to_string()]);

        let commits = repo.log_range(Some("v0.1.0"), "HEAD").unwrap();
        let subjects: Vec<&str> = commits.iter().map(|c| c.subject.as_str()).collect();
        assert_eq!(subjects, vec!["feat: add b", "fix: repair c"]);
        assert_eq!(commits[0].author, "Test Author");
        assert_eq!(commits[0].hash.len(), 40);

        let all = repo.log_range(None, "HEAD").unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_log_range_unknown_tag_is_error() {
        let (dir, repo) = init_repo();
        commit_file(&dir, &repo, "a.txt", "chore: initial");
        assert!(repo.log_range(Some("v9.9.9"), "HEAD").is_err());
    }

    #[test]
    fn test_nearest_tag_first() {
        let (dir, repo) = init_repo();
        commit_file(&dir, &repo, "a.txt", "one");
        repo.create_annotated_tag("v0.1.0", "first").unwrap();
        commit_file(&dir, &repo, "b.txt", "two");
        repo.create_annotated_tag("v0.2.0", "second").unwrap();

        assert_eq!(repo.tags().unwrap(), vec!["v0.2.0", "v0.1.0"]);
        let mut local = repo.local_tags().unwrap();
        local.sort();
        assert_eq!(local, vec!["v0.1.0", "v0.2.0"]);
    }

    #[test]
    fn test_is_clean_tracks_modifications() {
        let (dir, repo) = init_repo();
        commit_file(&dir, &repo, "a.txt", "one");
        assert!(repo.is_clean().unwrap());

        fs::write(dir.path().join("a.txt"), "changed").unwrap();
        assert!(!repo.is_clean().unwrap());

        // Untracked files do not count
        let (dir, repo) = init_repo();
        commit_file(&dir, &repo, "a.txt", "one");
        fs::write(dir.path().join("new.txt"), "untracked").unwrap();
        assert!(repo.is_clean().unwrap());
    }

    #[test]
    fn test_duplicate_tag_is_rejected() {
        let (dir, repo) = init_repo();
        commit_file(&dir, &repo, "a.txt", "one");
        repo.create_annotated_tag("v0.1.0", "first").unwrap();
        assert!(repo.create_annotated_tag("v0.1.0", "again").is_err());
    }

    #[test]
    fn test_missing_remote() {
        let (dir, repo) = init_repo();
        commit_file(&dir, &repo, "a.txt", "one");
        assert!(repo.remote_tags("origin").is_err());
        assert!(repo.push_ref("origin", "refs/tags/v0.1.0").is_err());
    }
}
