//! Domain logic - pure release rules independent of files and git

pub mod commit;
pub mod milestone;
pub mod version;

pub use commit::{classify, classify_subject, CommitCategory, CommitRecord};
pub use milestone::{milestone_for, Milestone, StageStatus, MILESTONE_TABLE};
pub use version::{increment, IncrementPolicy, Version};
