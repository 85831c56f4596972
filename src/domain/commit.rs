use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A commit mined from the version-control history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    /// Full commit hash
    pub hash: String,
    /// First line of the commit message
    pub subject: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

impl CommitRecord {
    pub fn new(
        hash: impl Into<String>,
        subject: impl Into<String>,
        author: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        CommitRecord {
            hash: hash.into(),
            subject: subject.into(),
            author: author.into(),
            timestamp,
        }
    }

    /// First 8 characters of the hash
    pub fn short_hash(&self) -> &str {
        match self.hash.char_indices().nth(8) {
            Some((idx, _)) => &self.hash[..idx],
            None => &self.hash,
        }
    }

    pub fn category(&self) -> CommitCategory {
        classify_subject(&self.subject)
    }
}

/// Changelog category of a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitCategory {
    Breaking,
    Feature,
    Fix,
    Docs,
    Chore,
    Other,
}

impl CommitCategory {
    /// Categories in changelog rendering order
    pub const RENDER_ORDER: [CommitCategory; 6] = [
        CommitCategory::Breaking,
        CommitCategory::Feature,
        CommitCategory::Fix,
        CommitCategory::Docs,
        CommitCategory::Chore,
        CommitCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitCategory::Breaking => "breaking",
            CommitCategory::Feature => "feature",
            CommitCategory::Fix => "fix",
            CommitCategory::Docs => "docs",
            CommitCategory::Chore => "chore",
            CommitCategory::Other => "other",
        }
    }

    /// Section heading used in the Markdown changelog
    pub fn heading(&self) -> &'static str {
        match self {
            CommitCategory::Breaking => "💥 Breaking Changes",
            CommitCategory::Feature => "✨ New Features",
            CommitCategory::Fix => "🐛 Bug Fixes",
            CommitCategory::Docs => "📚 Documentation",
            CommitCategory::Chore => "🔧 Maintenance",
            CommitCategory::Other => "📄 Other Changes",
        }
    }
}

impl fmt::Display for CommitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a classification rule inspects the lower-cased subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectMatcher {
    /// Subject starts with one of the type tokens followed by `:` or `!:`
    TypePrefix(&'static [&'static str]),
    ContainsAny(&'static [&'static str]),
}

impl SubjectMatcher {
    pub fn matches(&self, lowered_subject: &str) -> bool {
        match self {
            SubjectMatcher::TypePrefix(types) => types.iter().any(|t| {
                lowered_subject
                    .strip_prefix(t)
                    .map(|rest| rest.starts_with(':') || rest.starts_with("!:"))
                    .unwrap_or(false)
            }),
            SubjectMatcher::ContainsAny(needles) => {
                needles.iter().any(|n| lowered_subject.contains(n))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationRule {
    pub matcher: SubjectMatcher,
    pub category: CommitCategory,
}

/// Classification rules in priority order. The first match wins, so the
/// breaking-change heuristic only applies to subjects without a known type
/// prefix (`feat!: ...` is a feature).
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        matcher: SubjectMatcher::TypePrefix(&["feat", "feature"]),
        category: CommitCategory::Feature,
    },
    ClassificationRule {
        matcher: SubjectMatcher::TypePrefix(&["fix", "bugfix"]),
        category: CommitCategory::Fix,
    },
    ClassificationRule {
        matcher: SubjectMatcher::TypePrefix(&["docs", "doc"]),
        category: CommitCategory::Docs,
    },
    ClassificationRule {
        matcher: SubjectMatcher::TypePrefix(&["chore", "ci", "build", "test"]),
        category: CommitCategory::Chore,
    },
    ClassificationRule {
        matcher: SubjectMatcher::ContainsAny(&["breaking", "!"]),
        category: CommitCategory::Breaking,
    },
];

/// Classify a subject line against [`CLASSIFICATION_RULES`]
pub fn classify_subject(subject: &str) -> CommitCategory {
    classify_with(CLASSIFICATION_RULES, subject)
}

pub fn classify_with(rules: &[ClassificationRule], subject: &str) -> CommitCategory {
    let lowered = subject.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.matcher.matches(&lowered))
        .map(|rule| rule.category)
        .unwrap_or(CommitCategory::Other)
}

pub fn classify(commit: &CommitRecord) -> CommitCategory {
    classify_subject(&commit.subject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_prefixes() {
        assert_eq!(classify_subject("feat: add x"), CommitCategory::Feature);
        assert_eq!(classify_subject("Feature: add y"), CommitCategory::Feature);
        assert_eq!(classify_subject("fix: y"), CommitCategory::Fix);
        assert_eq!(classify_subject("bugfix: z"), CommitCategory::Fix);
        assert_eq!(classify_subject("docs: readme"), CommitCategory::Docs);
        assert_eq!(classify_subject("doc: typo"), CommitCategory::Docs);
        assert_eq!(classify_subject("ci: cache"), CommitCategory::Chore);
        assert_eq!(classify_subject("build: bump deps"), CommitCategory::Chore);
        assert_eq!(classify_subject("test: cover parser"), CommitCategory::Chore);
        assert_eq!(classify_subject("chore: tidy"), CommitCategory::Chore);
    }

    #[test]
    fn test_bang_after_prefix_stays_feature() {
        assert_eq!(
            classify_subject("feat!: breaking change"),
            CommitCategory::Feature
        );
        assert_eq!(
            classify_subject("feat!: drop legacy flag"),
            CommitCategory::Feature
        );
        assert_eq!(classify_subject("fix!: change default"), CommitCategory::Fix);
        assert_eq!(
            classify_subject("feat: drop legacy flag!"),
            CommitCategory::Feature
        );
        assert_eq!(
            classify_subject("fix: breaking regression in parser"),
            CommitCategory::Fix
        );
    }

    #[test]
    fn test_breaking_heuristic() {
        assert_eq!(
            classify_subject("Remove BREAKING option"),
            CommitCategory::Breaking
        );
        assert_eq!(classify_subject("refactor!: rewrite"), CommitCategory::Breaking);
    }

    #[test]
    fn test_other() {
        assert_eq!(classify_subject("random commit"), CommitCategory::Other);
        assert_eq!(classify_subject("featuring nothing"), CommitCategory::Other);
        assert_eq!(classify_subject("feat(api): scoped"), CommitCategory::Other);
        assert_eq!(classify_subject("refactor: split module"), CommitCategory::Other);
    }

    #[test]
    fn test_rules_in_isolation() {
        let only_docs = [ClassificationRule {
            matcher: SubjectMatcher::TypePrefix(&["docs"]),
            category: CommitCategory::Docs,
        }];
        assert_eq!(classify_with(&only_docs, "feat: x"), CommitCategory::Other);
        assert_eq!(classify_with(&only_docs, "DOCS: x"), CommitCategory::Docs);
    }

    #[test]
    fn test_short_hash() {
        let commit = CommitRecord::new(
            "0123456789abcdef",
            "feat: add x",
            "Ada",
            DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
        );
        assert_eq!(commit.short_hash(), "01234567");
        assert_eq!(commit.category(), CommitCategory::Feature);

        let short = CommitRecord::new("abc", "x", "Ada", commit.timestamp);
        assert_eq!(short.short_hash(), "abc");
    }
}
