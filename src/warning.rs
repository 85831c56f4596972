use std::fmt;

/// Non-fatal findings reported to the user alongside errors.
///
/// Warnings never make a validation fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseWarning {
    /// Declared milestone differs from the one the version maps to
    MilestoneMismatch {
        declared: String,
        expected: String,
        version: String,
    },
    /// No tag is reachable from HEAD
    NoPriorTag,
    /// Remote tags could not be listed
    RemoteUnavailable { remote: String, reason: String },
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::MilestoneMismatch {
                declared,
                expected,
                version,
            } => write!(
                f,
                "Milestone mismatch: app has {}, expected {} for version {}",
                declared, expected, version
            ),
            ReleaseWarning::NoPriorTag => {
                write!(f, "No previous tag found; treating this as the first release")
            }
            ReleaseWarning::RemoteUnavailable { remote, reason } => {
                write!(f, "Could not list tags on remote '{}': {}", remote, reason)
            }
        }
    }
}
