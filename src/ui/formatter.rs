//! Pure formatting functions for UI output.
//!
//! Text is built by `format_*` functions so it can be tested; `display_*`
//! functions print it.

use console::style;

use crate::consistency::ValidationResult;
use crate::release::{StatusReport, VersionsReport};
use crate::warning::ReleaseWarning;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Print a soft warning to stderr.
pub fn display_warning(warning: &ReleaseWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Human-readable validation report.
///
/// Info is always included, even for a failed run, followed by errors and
/// warnings as separate lists.
pub fn format_validation(result: &ValidationResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", style("🔍 Harbor Version Validation").bold()));
    out.push_str(&format!("{}\n", "=".repeat(30)));

    if result.is_valid() {
        out.push_str(&format!("{}\n", style("✅ All validation checks passed!").green()));
    } else {
        out.push_str(&format!("{}\n", style("❌ Validation failed!").red()));
    }

    out.push_str("📦 Project Information:\n");
    for (key, value) in result.info().entries() {
        out.push_str(&format!("   {}: {}\n", key, value));
    }

    if !result.errors().is_empty() {
        out.push_str(&format!("{}\n", style("❌ Errors:").red()));
        for error in result.errors() {
            out.push_str(&format!("   • {}\n", error));
        }
    }

    if !result.warnings().is_empty() {
        out.push_str(&format!("{}\n", style("⚠️  Warnings:").yellow()));
        for warning in result.warnings() {
            out.push_str(&format!("   • {}\n", warning));
        }
    }
    out
}

pub fn display_validation(result: &ValidationResult) {
    print!("{}", format_validation(result));
}

pub fn format_status(report: &StatusReport) -> String {
    let unknown = "unknown".to_string();
    let info = report.validation.info();
    let mut out = String::new();

    out.push_str(&format!("{}\n", style("Release status").bold()));
    out.push_str(&format!(
        "  Branch:            {}\n",
        report.branch.as_deref().unwrap_or("(detached)")
    ));
    let tree = match report.clean {
        Some(true) => style("clean".to_string()).green(),
        Some(false) => style("dirty".to_string()).red(),
        None => style(unknown.clone()).dim(),
    };
    out.push_str(&format!("  Working tree:      {}\n", tree));
    out.push_str(&format!(
        "  Manifest version:  {}\n",
        info.pyproject_version.as_ref().unwrap_or(&unknown)
    ));
    out.push_str(&format!(
        "  App version:       {}\n",
        info.app_version.as_ref().unwrap_or(&unknown)
    ));
    out.push_str(&format!(
        "  Milestone:         {} (expected {})\n",
        info.app_milestone.as_ref().unwrap_or(&unknown),
        info.expected_milestone.as_ref().unwrap_or(&unknown)
    ));
    match &report.latest_tag {
        Some(tag) => {
            out.push_str(&format!(
                "  Latest tag:        {} ({} commits since)\n",
                tag,
                report.commits_since_tag
            ));
        }
        None => {
            out.push_str(&format!(
                "  Latest tag:        none ({} commits in history)\n",
                report.commits_since_tag
            ));
        }
    }

    for error in report.validation.errors() {
        out.push_str(&format!("  {} {}\n", style("✗").red(), error));
    }
    for warning in report.validation.warnings() {
        out.push_str(&format!("  {} {}\n", style("⚠").yellow(), warning));
    }
    out
}

pub fn display_status_report(report: &StatusReport) {
    print!("{}", format_status(report));
}

/// Local tags, then remote tags when they could be listed
pub fn format_versions(report: &VersionsReport, remote: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", style("Local tags:").bold()));
    if report.local.is_empty() {
        out.push_str("  (none)\n");
    }
    for tag in &report.local {
        out.push_str(&format!("  - {}\n", tag));
    }

    if let Ok(remote_tags) = &report.remote {
        out.push_str(&format!("{}\n", style(format!("Remote tags ({}):", remote)).bold()));
        if remote_tags.is_empty() {
            out.push_str("  (none)\n");
        }
        for tag in remote_tags {
            let marker = if report.local.contains(tag) { "" } else { " (remote only)" };
            out.push_str(&format!("  - {}{}\n", tag, marker));
        }
    }
    out
}

/// Display manual push instruction for a tag.
pub fn display_manual_push_instruction(tag: &str, remote: &str) {
    println!(
        "\n{} To push this tag later, run:\n  {}",
        style("→").yellow(),
        style(format!("git push {} {}", remote, tag)).cyan()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::ValidationResult;

    fn plain(text: &str) -> String {
        console::strip_ansi_codes(text).to_string()
    }

    #[test]
    fn test_format_validation_failure_keeps_info() {
        let mut result = ValidationResult::new();
        result.info_mut().pyproject_version = Some("0.1.0".to_string());
        result.add_error("Version mismatch: a (0.1.0) != b (0.2.0)");
        result.add_warning("Milestone mismatch");

        let out = plain(&format_validation(&result));
        assert!(out.contains("❌ Validation failed!"));
        assert!(out.contains("   pyproject_version: 0.1.0"));
        assert!(out.contains("   • Version mismatch"));
        assert!(out.contains("   • Milestone mismatch"));
        assert!(out.find("Errors").unwrap() < out.find("Warnings").unwrap());
    }

    #[test]
    fn test_format_validation_success() {
        let out = plain(&format_validation(&ValidationResult::new()));
        assert!(out.contains("All validation checks passed"));
        assert!(!out.contains("Errors"));
    }

    #[test]
    fn test_format_versions_marks_remote_only() {
        let report = VersionsReport {
            local: vec!["v0.1.0".to_string()],
            remote: Ok(vec!["v0.2.0".to_string(), "v0.1.0".to_string()]),
        };
        let out = plain(&format_versions(&report, "origin"));
        assert!(out.contains("Remote tags (origin):"));
        assert!(out.contains("- v0.2.0 (remote only)"));
        assert!(out.contains("- v0.1.0\n"));
    }

    #[test]
    fn test_format_versions_exact_lines() {
        let report = VersionsReport {
            local: vec!["v0.2.0".to_string(), "v0.1.0".to_string()],
            remote: Ok(Vec::new()),
        };
        let out = plain(&format_versions(&report, "origin"));
        assert_eq!(
            out,
            "Local tags:\n  - v0.2.0\n  - v0.1.0\nRemote tags (origin):\n  (none)\n"
        );
    }

    #[test]
    fn test_format_versions_without_remote() {
        let report = VersionsReport {
            local: Vec::new(),
            remote: Err("offline".to_string()),
        };
        let out = plain(&format_versions(&report, "origin"));
        assert!(out.contains("(none)"));
        assert!(!out.contains("Remote tags"));
    }
}
