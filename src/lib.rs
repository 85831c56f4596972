pub mod changelog;
pub mod config;
pub mod consistency;
pub mod declaration;
pub mod domain;
pub mod error;
pub mod history;
pub mod release;
pub mod ui;
pub mod vcs;
pub mod warning;

pub use error::{ReleaseError, Result};
