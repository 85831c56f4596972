//! Development milestones and their mapping from version numbers.
//!
//! Each milestone owns exactly one `(major, minor)` pair. Versions whose pair
//! is not in [`MILESTONE_TABLE`] fall back to the first entry.

use crate::domain::version::Version;
use std::fmt;
use std::str::FromStr;

/// Named development stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Milestone {
    M0,
    M1,
    M2,
    M3,
    M4,
    M5,
    M6,
}

/// One row of the milestone table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneEntry {
    pub major: u64,
    pub minor: u64,
    pub milestone: Milestone,
    pub name: &'static str,
    pub summary: &'static str,
}

/// Ordered milestone table; the first entry is the default.
pub const MILESTONE_TABLE: &[MilestoneEntry] = &[
    MilestoneEntry {
        major: 0,
        minor: 1,
        milestone: Milestone::M0,
        name: "Foundation",
        summary: "Project infrastructure, CI/CD, basic app structure",
    },
    MilestoneEntry {
        major: 0,
        minor: 2,
        milestone: Milestone::M1,
        name: "Discovery",
        summary: "Container discovery and registry integration",
    },
    MilestoneEntry {
        major: 0,
        minor: 3,
        milestone: Milestone::M2,
        name: "Updates",
        summary: "Safe update engine with rollback capability",
    },
    MilestoneEntry {
        major: 0,
        minor: 4,
        milestone: Milestone::M3,
        name: "Automation",
        summary: "Scheduling and web interface",
    },
    MilestoneEntry {
        major: 0,
        minor: 5,
        milestone: Milestone::M4,
        name: "Observability",
        summary: "Monitoring and metrics",
    },
    MilestoneEntry {
        major: 0,
        minor: 6,
        milestone: Milestone::M5,
        name: "Production",
        summary: "Security hardening and performance",
    },
    MilestoneEntry {
        major: 1,
        minor: 0,
        milestone: Milestone::M6,
        name: "Release",
        summary: "Community launch and documentation",
    },
];

/// Progress of a milestone relative to the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Complete,
    InProgress,
    Pending,
}

impl StageStatus {
    pub fn marker(&self) -> &'static str {
        match self {
            StageStatus::Complete => "✅",
            StageStatus::InProgress => "🚧",
            StageStatus::Pending => "📋",
        }
    }
}

impl Milestone {
    /// All milestones in roadmap order
    pub fn all() -> impl Iterator<Item = Milestone> {
        MILESTONE_TABLE.iter().map(|entry| entry.milestone)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Milestone::M0 => "M0",
            Milestone::M1 => "M1",
            Milestone::M2 => "M2",
            Milestone::M3 => "M3",
            Milestone::M4 => "M4",
            Milestone::M5 => "M5",
            Milestone::M6 => "M6",
        }
    }

    fn entry(&self) -> &'static MilestoneEntry {
        MILESTONE_TABLE
            .iter()
            .find(|entry| entry.milestone == *self)
            .unwrap_or(&MILESTONE_TABLE[0])
    }

    pub fn name(&self) -> &'static str {
        self.entry().name
    }

    pub fn summary(&self) -> &'static str {
        self.entry().summary
    }

    /// Status of `self` when `current` is the active milestone
    pub fn status_relative_to(&self, current: Milestone) -> StageStatus {
        match self.cmp(&current) {
            std::cmp::Ordering::Less => StageStatus::Complete,
            std::cmp::Ordering::Equal => StageStatus::InProgress,
            std::cmp::Ordering::Greater => StageStatus::Pending,
        }
    }

    /// The milestone that follows this one on the roadmap
    pub fn next(&self) -> Option<Milestone> {
        Milestone::all().find(|m| m > self)
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Milestone {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Milestone::all()
            .find(|m| m.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown milestone: '{}'", s))
    }
}

/// Map a version to its milestone; unmapped pairs yield the default (M0)
///
/// Total by construction. The pre-release tag is ignored.
pub fn milestone_for(version: &Version) -> Milestone {
    milestone_for_pair(version.major(), version.minor())
}

pub fn milestone_for_pair(major: u64, minor: u64) -> Milestone {
    MILESTONE_TABLE
        .iter()
        .find(|entry| entry.major == major && entry.minor == minor)
        .unwrap_or(&MILESTONE_TABLE[0])
        .milestone
}
