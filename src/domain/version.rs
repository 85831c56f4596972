use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Grammar accepted for project versions: `major.minor.patch[-pre]`, where the
/// pre-release is an alphanumeric identifier with an optional `.N` counter.
const VERSION_PATTERN: &str = r"^(\d+)\.(\d+)\.(\d+)(?:-([a-zA-Z0-9]+(?:\.[0-9]+)?))?$";

const RC_PATTERN: &str = r"^rc\.(\d+)$";

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VERSION_PATTERN).expect("version grammar is a valid regex"))
}

fn rc_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(RC_PATTERN).expect("rc pattern is a valid regex"))
}

/// Value of an all-digit string, clamped to `u64::MAX`
fn saturating_number(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}

/// Semantic version representation
///
/// The canonical text is kept exactly as parsed, so `"01.2.3"` stays `"01.2.3"`.
/// Equality compares the canonical text, not pre-release precedence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    pre_release: Option<String>,
    text: String,
}

impl Version {
    /// Create a new release version without a pre-release tag
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self::with_pre_release(major, minor, patch, None)
    }

    /// Create a version with an optional pre-release tag
    ///
    /// The pre-release is not validated here; use [`Version::parse`] for untrusted input.
    pub fn with_pre_release(major: u64, minor: u64, patch: u64, pre_release: Option<String>) -> Self {
        let text = match &pre_release {
            Some(pre) => format!("{}.{}.{}-{}", major, minor, patch, pre),
            None => format!("{}.{}.{}", major, minor, patch),
        };
        Version {
            major,
            minor,
            patch,
            pre_release,
            text,
        }
    }

    /// Parse a version string, e.g. `"0.1.0"` or `"1.0.0-rc.1"`
    ///
    /// Any deviation from the grammar yields [`ReleaseError::InvalidVersionFormat`]
    /// carrying the offending string. No trimming, case folding or leading-zero
    /// stripping is performed. Components too large for `u64` are accepted and
    /// read as `u64::MAX`; the text is still kept verbatim.
    pub fn parse(raw: &str) -> Result<Self> {
        let captures = version_regex()
            .captures(raw)
            .ok_or_else(|| ReleaseError::invalid_version(raw))?;

        let number = |index: usize| -> Result<u64> {
            captures
                .get(index)
                .map(|m| saturating_number(m.as_str()))
                .ok_or_else(|| ReleaseError::invalid_version(raw))
        };

        Ok(Version {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            pre_release: captures.get(4).map(|m| m.as_str().to_string()),
            text: raw.to_string(),
        })
    }

    /// Whether `raw` is accepted by [`Version::parse`]
    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn pre_release(&self) -> Option<&str> {
        self.pre_release.as_deref()
    }

    pub fn is_pre_release(&self) -> bool {
        self.pre_release.is_some()
    }

    /// The canonical string form
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The `major.minor.patch` triple, ignoring any pre-release tag
    pub fn core(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }

    /// Compute the next version under `policy`
    ///
    /// - `Major`, `Minor`, `Patch`: bump that component, zero the lower ones
    ///   and clear the pre-release.
    /// - `Rc`: keep the numeric core; `rc.N` becomes `rc.N+1`, anything else
    ///   becomes `rc.1`.
    pub fn increment(&self, policy: IncrementPolicy) -> Self {
        match policy {
            IncrementPolicy::Major => Version::new(self.major.saturating_add(1), 0, 0),
            IncrementPolicy::Minor => Version::new(self.major, self.minor.saturating_add(1), 0),
            IncrementPolicy::Patch => {
                Version::new(self.major, self.minor, self.patch.saturating_add(1))
            }
            IncrementPolicy::Rc => {
                let next = self
                    .pre_release
                    .as_deref()
                    .and_then(|pre| rc_regex().captures(pre))
                    .and_then(|c| c.get(1))
                    .map(|m| saturating_number(m.as_str()).saturating_add(1))
                    .unwrap_or(1);
                Version::with_pre_release(
                    self.major,
                    self.minor,
                    self.patch,
                    Some(format!("rc.{}", next)),
                )
            }
        }
    }
}

impl FromStr for Version {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Version increment policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementPolicy {
    Major,
    Minor,
    Patch,
    Rc,
}

impl IncrementPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncrementPolicy::Major => "major",
            IncrementPolicy::Minor => "minor",
            IncrementPolicy::Patch => "patch",
            IncrementPolicy::Rc => "rc",
        }
    }
}

impl FromStr for IncrementPolicy {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "major" => Ok(IncrementPolicy::Major),
            "minor" => Ok(IncrementPolicy::Minor),
            "patch" => Ok(IncrementPolicy::Patch),
            "rc" => Ok(IncrementPolicy::Rc),
            _ => Err(ReleaseError::UnknownIncrementPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for IncrementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute the next version for a policy given by name
pub fn increment(current: &Version, policy: &str) -> Result<Version> {
    let policy: IncrementPolicy = policy.parse()?;
    Ok(current.increment(policy))
}
