//! Changelog generation and formatting.
//!
//! Release notes are rendered from the commits mined since the previous tag,
//! the milestone roadmap and the project configuration. Output is
//! deterministic for a given date; [`ChangelogGenerator::generate`] uses the
//! current UTC date and the `*_at` variants take a pinned one.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::config::ProjectConfig;
use crate::domain::{CommitCategory, CommitRecord, Milestone, Version};
use crate::error::{ReleaseError, Result};
use crate::history::{categorize, contributors, CategorizedCommits, HistoryMiner};
use crate::vcs::History;

/// Output format of a changelog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangelogFormat {
    #[default]
    Markdown,
    Json,
}

impl FromStr for ChangelogFormat {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(ChangelogFormat::Markdown),
            "json" => Ok(ChangelogFormat::Json),
            other => Err(ReleaseError::config(format!(
                "unknown changelog format '{}'",
                other
            ))),
        }
    }
}

/// A rendered changelog
#[derive(Debug, Clone, PartialEq)]
pub struct ChangelogDocument {
    pub version: Version,
    pub milestone: Milestone,
    pub generated_on: NaiveDate,
    pub format: ChangelogFormat,
    pub content: String,
}

impl ChangelogDocument {
    /// Write the document to `path`, replacing any previous content
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, &self.content)?;
        info!(path = %path.display(), version = %self.version, "wrote changelog");
        Ok(())
    }
}

/// Everything mined from history for one release
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseHistory {
    pub previous_tag: Option<String>,
    pub commits: Vec<CommitRecord>,
    pub categorized: CategorizedCommits,
    pub contributors: Vec<String>,
}

impl ReleaseHistory {
    pub fn from_commits(previous_tag: Option<String>, commits: Vec<CommitRecord>) -> Self {
        ReleaseHistory {
            categorized: categorize(&commits),
            contributors: contributors(&commits),
            previous_tag,
            commits,
        }
    }
}

/// A commit as listed in the JSON changelog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitEntry {
    /// Abbreviated to 8 characters
    pub hash: String,
    pub subject: String,
    pub author: String,
    /// `YYYY-MM-DD HH:MM:SS +0000`, as `git log --date=iso` prints it
    pub date: String,
}

impl From<&CommitRecord> for CommitEntry {
    fn from(commit: &CommitRecord) -> Self {
        CommitEntry {
            hash: commit.short_hash().to_string(),
            subject: commit.subject.clone(),
            author: commit.author.clone(),
            date: commit.timestamp.format("%Y-%m-%d %H:%M:%S %z").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitSummary {
    pub total: usize,
    pub by_category: BTreeMap<CommitCategory, usize>,
    pub details: BTreeMap<CommitCategory, Vec<CommitEntry>>,
}

/// Structured form of a changelog, emitted by the JSON format
#[derive(Debug, Clone, Serialize)]
pub struct ChangelogSummary {
    pub version: String,
    pub milestone: String,
    pub release_date: String,
    pub previous_tag: Option<String>,
    pub commits: CommitSummary,
    pub contributors: Vec<String>,
}

/// Generator for release notes
pub struct ChangelogGenerator<'a, H: History + ?Sized> {
    miner: HistoryMiner<'a, H>,
    project: &'a ProjectConfig,
}

impl<'a, H: History + ?Sized> ChangelogGenerator<'a, H> {
    pub fn new(history: &'a H, project: &'a ProjectConfig) -> Self {
        ChangelogGenerator {
            miner: HistoryMiner::new(history),
            project,
        }
    }

    /// Mine the previous tag and the commits since it
    ///
    /// Without a previous tag this is a first release and no commits are
    /// listed, the same as when history is unavailable.
    pub fn collect(&self) -> ReleaseHistory {
        let previous_tag = self.miner.latest_tag();
        let commits = match previous_tag.as_deref() {
            Some(tag) => self.miner.commits_since(Some(tag)),
            None => Vec::new(),
        };
        ReleaseHistory::from_commits(previous_tag, commits)
    }

    /// Markdown changelog dated today (UTC)
    pub fn generate(&self, version: &Version, milestone: Milestone) -> ChangelogDocument {
        self.generate_at(version, milestone, Utc::now().date_naive())
    }

    /// Markdown changelog for a pinned date
    pub fn generate_at(
        &self,
        version: &Version,
        milestone: Milestone,
        date: NaiveDate,
    ) -> ChangelogDocument {
        let history = self.collect();
        ChangelogDocument {
            version: version.clone(),
            milestone,
            generated_on: date,
            format: ChangelogFormat::Markdown,
            content: render_markdown(self.project, version, milestone, date, &history),
        }
    }

    /// Changelog in the requested format for a pinned date
    pub fn generate_format_at(
        &self,
        version: &Version,
        milestone: Milestone,
        format: ChangelogFormat,
        date: NaiveDate,
    ) -> Result<ChangelogDocument> {
        match format {
            ChangelogFormat::Markdown => Ok(self.generate_at(version, milestone, date)),
            ChangelogFormat::Json => {
                let summary = summarize(version, milestone, date, self.collect());
                Ok(ChangelogDocument {
                    version: version.clone(),
                    milestone,
                    generated_on: date,
                    format,
                    content: serde_json::to_string_pretty(&summary)?,
                })
            }
        }
    }
}

pub fn summarize(
    version: &Version,
    milestone: Milestone,
    date: NaiveDate,
    history: ReleaseHistory,
) -> ChangelogSummary {
    ChangelogSummary {
        version: version.to_string(),
        milestone: milestone.to_string(),
        release_date: date.format("%Y-%m-%d").to_string(),
        previous_tag: history.previous_tag,
        commits: CommitSummary {
            total: history.commits.len(),
            by_category: history
                .categorized
                .iter()
                .map(|(category, commits)| (*category, commits.len()))
                .collect(),
            details: history
                .categorized
                .iter()
                .map(|(category, commits)| {
                    (*category, commits.iter().map(CommitEntry::from).collect())
                })
                .collect(),
        },
        contributors: history.contributors,
    }
}

/// Container name derived from the last path segment of the image
fn container_name(image: &str) -> &str {
    image.rsplit('/').next().unwrap_or(image)
}

/// Render the Markdown release notes
pub fn render_markdown(
    project: &ProjectConfig,
    version: &Version,
    milestone: Milestone,
    date: NaiveDate,
    history: &ReleaseHistory,
) -> String {
    let mut out = String::new();

    render_header(&mut out, project, version, milestone, date);
    render_progress(&mut out, project, milestone);
    render_installation(&mut out, project, version);

    match history.previous_tag.as_deref() {
        Some(tag) if !history.commits.is_empty() => {
            render_changes(&mut out, version, tag, history)
        }
        _ => render_initial_release(&mut out),
    }

    render_footer(&mut out, project, version, milestone, history.previous_tag.as_deref());
    out
}

fn render_header(
    out: &mut String,
    project: &ProjectConfig,
    version: &Version,
    milestone: Milestone,
    date: NaiveDate,
) {
    let release_type = if version.is_pre_release() {
        "Pre-release"
    } else {
        "Stable Release"
    };
    out.push_str(&format!("# {} {}\n\n", project.name, version));
    out.push_str(&format!("**Milestone**: {}\n", milestone));
    out.push_str(&format!("**Release Date**: {}\n", date.format("%Y-%m-%d")));
    out.push_str(&format!("**Release Type**: {}\n\n", release_type));
}

fn render_progress(out: &mut String, project: &ProjectConfig, current: Milestone) {
    out.push_str("## 🎯 Milestone Progress\n\n");
    out.push_str(&format!(
        "{} follows a structured development roadmap with clear milestones:\n\n",
        project.name
    ));
    for milestone in Milestone::all() {
        out.push_str(&format!(
            "- **{} ({})**: {} {}\n",
            milestone,
            milestone.name(),
            milestone.summary(),
            milestone.status_relative_to(current).marker()
        ));
    }
    out.push_str(&format!("\nCurrent status: **{} Phase**\n\n", current));
}

fn render_installation(out: &mut String, project: &ProjectConfig, version: &Version) {
    let name = container_name(&project.image);
    out.push_str("## 📦 Installation\n\n");
    out.push_str("### Quick Start\n```bash\n");
    out.push_str(&format!("docker run -d --name {} --restart unless-stopped \\\n", name));
    out.push_str("  -p 8080:8080 \\\n");
    out.push_str("  -v /var/run/docker.sock:/var/run/docker.sock:ro \\\n");
    out.push_str(&format!("  -v {}-data:/app/data \\\n", name));
    out.push_str(&format!("  {}:{}\n", project.image, version));
    out.push_str("```\n\n");

    out.push_str("### Docker Compose\n```yaml\nservices:\n");
    out.push_str(&format!("  {}:\n", name));
    out.push_str(&format!("    image: {}:{}\n", project.image, version));
    out.push_str(&format!("    container_name: {}\n", name));
    out.push_str("    restart: unless-stopped\n");
    out.push_str("    ports:\n      - \"8080:8080\"\n");
    out.push_str("    volumes:\n");
    out.push_str("      - /var/run/docker.sock:/var/run/docker.sock:ro\n");
    out.push_str(&format!("      - {}_data:/app/data\n", name));
    out.push_str(&format!("\nvolumes:\n  {}_data:\n", name));
    out.push_str("```\n\n");
}

fn render_changes(
    out: &mut String,
    version: &Version,
    previous_tag: &str,
    history: &ReleaseHistory,
) {
    out.push_str(&format!("## 🌟 What's New in {}\n\n", version));
    out.push_str(&format!("### 📄 Changes Since {}\n\n", previous_tag));

    for category in CommitCategory::RENDER_ORDER {
        let Some(commits) = history.categorized.get(&category) else {
            continue;
        };
        if commits.is_empty() {
            continue;
        }
        out.push_str(&format!("#### {}\n", category.heading()));
        for commit in commits {
            out.push_str(&format!("- {} ({})\n", commit.subject, commit.short_hash()));
        }
        out.push('\n');
    }

    if !history.contributors.is_empty() {
        out.push_str("### 👥 Contributors\n\n");
        for contributor in &history.contributors {
            out.push_str(&format!("- {}\n", contributor));
        }
        out.push('\n');
    }
}

const INITIAL_RELEASE: &str = "### 🎉 Initial Release Features

- ✅ Zero-configuration deployment for home labs
- ✅ SQLite database with automatic migrations
- ✅ Profile-based configuration (homelab, development, production)
- ✅ Health checks and monitoring endpoints
- ✅ Complete CI/CD pipeline with multi-stage testing
- ✅ Security scanning and vulnerability detection
- ✅ Multi-architecture Docker images

### 🏗️ Foundation Complete

This release completes the M0 (Foundation) milestone, establishing:
- Project structure and contribution workflow
- Automated testing and security scanning
- Production-ready Docker images and deployment configurations
- An architecture ready for M1 feature development

";

fn render_initial_release(out: &mut String) {
    out.push_str(INITIAL_RELEASE);
}

fn render_footer(
    out: &mut String,
    project: &ProjectConfig,
    version: &Version,
    current: Milestone,
    previous_tag: Option<&str>,
) {
    if let Some(next) = current.next() {
        out.push_str("## 🛣️ What's Next\n\n");
        out.push_str(&format!("### {} Milestone ({})\n", next, next.name()));
        out.push_str(&format!("- {}\n\n", next.summary()));

        let later: Vec<Milestone> = Milestone::all().filter(|m| *m > next).collect();
        if !later.is_empty() {
            out.push_str("### Future Milestones\n");
            for milestone in later {
                out.push_str(&format!("- **{}**: {}\n", milestone, milestone.summary()));
            }
            out.push('\n');
        }
    }

    out.push_str("---\n\n");
    match previous_tag {
        Some(tag) => {
            out.push_str(&format!(
                "**Full Changelog**: {}/compare/{}...{}\n",
                project.repository.trim_end_matches('/'),
                tag,
                project.tag_for(version.as_str())
            ));
        }
        None => {
            out.push_str(&format!("**Repository**: {}\n", project.repository));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn commit(hash: &str, subject: &str, author: &str) -> CommitRecord {
        CommitRecord::new(
            hash,
            subject,
            author,
            DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn test_header_and_progress() {
        let project = ProjectConfig::default();
        let version = Version::parse("0.3.0-rc.1").unwrap();
        let history = ReleaseHistory::from_commits(None, Vec::new());
        let out = render_markdown(&project, &version, Milestone::M2, date(), &history);

        assert!(out.starts_with("# Harbor Container Updater 0.3.0-rc.1\n"));
        assert!(out.contains("**Release Date**: 2024-03-01"));
        assert!(out.contains("**Release Type**: Pre-release"));
        assert!(out.contains("- **M1 (Discovery)**: Container discovery and registry integration ✅"));
        assert!(out.contains("- **M2 (Updates)**: Safe update engine with rollback capability 🚧"));
        assert!(out.contains("- **M3 (Automation)**: Scheduling and web interface 📋"));
        assert!(out.contains("ghcr.io/deusextaco/harbor:0.3.0-rc.1"));
        assert!(out.contains("### M3 Milestone (Automation)"));
    }

    #[test]
    fn test_empty_history_renders_initial_release() {
        let project = ProjectConfig::default();
        let version = Version::new(0, 1, 0);
        let history = ReleaseHistory::from_commits(None, Vec::new());
        let out = render_markdown(&project, &version, Milestone::M0, date(), &history);

        assert!(out.contains("### 🎉 Initial Release Features"));
        assert!(!out.contains("What's New"));
        assert!(!out.contains("Contributors"));
        assert!(out.contains("**Repository**: https://github.com/DeusExTaco/harbor"));
        assert!(out.contains("**Release Type**: Stable Release"));
    }

    #[test]
    fn test_sections_in_fixed_order_and_empty_ones_omitted() {
        let project = ProjectConfig::default();
        let version = Version::new(0, 2, 0);
        let commits = vec![
            commit("fffffffff1", "fix: crash on start", "Zoe"),
            commit("aaaaaaaaa2", "feat: add discovery", "Ada"),
            commit("bbbbbbbbb3", "drop python 3.10, breaking", "Ada"),
        ];
        let history = ReleaseHistory::from_commits(Some("v0.1.0".to_string()), commits);
        let out = render_markdown(&project, &version, Milestone::M1, date(), &history);

        let breaking = out.find("#### 💥 Breaking Changes").unwrap();
        let features = out.find("#### ✨ New Features").unwrap();
        let fixes = out.find("#### 🐛 Bug Fixes").unwrap();
        assert!(breaking < features && features < fixes);
        assert!(!out.contains("#### 📚 Documentation"));
        assert!(!out.contains("#### 📄 Other Changes"));
        assert!(out.contains("- feat: add discovery (aaaaaaaa)"));
        assert!(out.contains("### 📄 Changes Since v0.1.0"));
        assert!(out.contains("### 👥 Contributors\n\n- Ada\n- Zoe\n"));
        assert!(out.contains(
            "**Full Changelog**: https://github.com/DeusExTaco/harbor/compare/v0.1.0...v0.2.0"
        ));
    }

    #[test]
    fn test_last_milestone_has_no_whats_next() {
        let project = ProjectConfig::default();
        let version = Version::new(1, 0, 0);
        let history = ReleaseHistory::from_commits(None, Vec::new());
        let out = render_markdown(&project, &version, Milestone::M6, date(), &history);
        assert!(!out.contains("What's Next"));
        assert!(out.contains("- **M6 (Release)**: Community launch and documentation 🚧"));
    }

    #[test]
    fn test_summary_counts() {
        let version = Version::new(0, 2, 0);
        let commits = vec![
            commit("1111111111", "feat: a", "Ada"),
            commit("2222222222", "docs: b", "Bob"),
        ];
        let history = ReleaseHistory::from_commits(Some("v0.1.0".to_string()), commits);
        let summary = summarize(&version, Milestone::M1, date(), history);
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["version"], "0.2.0");
        assert_eq!(value["milestone"], "M1");
        assert_eq!(value["release_date"], "2024-03-01");
        assert_eq!(value["previous_tag"], "v0.1.0");
        assert_eq!(value["commits"]["total"], 2);
        assert_eq!(value["commits"]["by_category"]["feature"], 1);
        assert_eq!(value["commits"]["by_category"]["other"], 0);
        let docs = &value["commits"]["details"]["docs"][0];
        assert_eq!(docs["subject"], "docs: b");
        assert_eq!(docs["hash"], "22222222");
        assert_eq!(docs["author"], "Bob");
        assert_eq!(docs["date"], "2023-11-14 22:13:20 +0000");
        assert!(docs.get("timestamp").is_none());
        assert_eq!(value["contributors"], serde_json::json!(["Ada", "Bob"]));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(
            "markdown".parse::<ChangelogFormat>().unwrap(),
            ChangelogFormat::Markdown
        );
        assert_eq!("JSON".parse::<ChangelogFormat>().unwrap(), ChangelogFormat::Json);
        assert!("html".parse::<ChangelogFormat>().is_err());
    }

    #[test]
    fn test_container_name() {
        assert_eq!(container_name("ghcr.io/deusextaco/harbor"), "harbor");
        assert_eq!(container_name("harbor"), "harbor");
    }
}
