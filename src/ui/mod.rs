//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and user input handling

use std::io::{self, Write};

use anyhow::Result;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_error, display_manual_push_instruction, display_status, display_status_report,
    display_success, display_validation, display_warning, format_status, format_validation,
    format_versions,
};

/// Prompts user to confirm an action with a yes/no prompt.
///
/// Accepts "y" or "yes" (case-insensitive); anything else, including Enter,
/// means no.
pub fn confirm_action(prompt: &str) -> Result<bool> {
    print!("\n{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_affirmative(&input))
}

fn is_affirmative(input: &str) -> bool {
    let response = input.trim().to_lowercase();
    response == "y" || response == "yes"
}
