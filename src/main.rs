use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use harbor_release::changelog::{ChangelogFormat, ChangelogGenerator};
use harbor_release::config::{load_config, Config};
use harbor_release::consistency::ConsistencyChecker;
use harbor_release::domain::{milestone_for, Milestone, Version};
use harbor_release::release::{next_version, PrepareOptions, ReleaseManager};
use harbor_release::ui;
use harbor_release::vcs::{Git2Repository, History, NoRepository};
use harbor_release::warning::ReleaseWarning;

#[derive(Parser)]
#[command(
    name = "harbor-release",
    about = "Validate version declarations and generate release notes"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, global = true, default_value = ".", help = "Project root directory")]
    root: PathBuf,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the version declarations agree
    Validate {
        #[arg(long, help = "Version the declarations must match")]
        target: Option<String>,

        #[arg(long, help = "Print the result as JSON")]
        json: bool,
    },
    /// Generate release notes from the commits since the last tag
    Changelog {
        #[arg(long, help = "Version being released")]
        version: String,

        #[arg(long, help = "Milestone label (default: derived from the version)")]
        milestone: Option<Milestone>,

        #[arg(long, help = "Write to this file instead of stdout")]
        output: Option<PathBuf>,

        #[arg(long, default_value = "markdown", help = "markdown or json")]
        format: ChangelogFormat,
    },
    /// Show branch, working tree, declared versions and latest tag
    Status,
    /// List local and remote release tags
    Versions,
    /// Print the next version under a policy (major, minor, patch, rc)
    Increment { policy: String },
    /// Update the declarations to a version and write its release notes
    Prepare {
        version: String,

        #[arg(long, help = "Allow uncommitted changes in the working tree")]
        allow_dirty: bool,

        #[arg(long, help = "Leave the changes uncommitted")]
        no_commit: bool,
    },
    /// Create and push the release tag for a version
    Tag {
        version: String,

        #[arg(short, long, help = "Skip confirmation prompt")]
        yes: bool,

        #[arg(long, help = "Create the tag locally only")]
        no_push: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the verbosity flag
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config =
        load_config(args.config.as_deref(), &args.root).context("Error loading config")?;

    match args.command {
        Command::Validate { target, json } => {
            run_validate(&args.root, &config, target.as_deref(), json)
        }
        Command::Changelog {
            version,
            milestone,
            output,
            format,
        } => run_changelog(&args.root, &config, &version, milestone, output, format),
        Command::Status => run_status(&args.root, &config),
        Command::Versions => run_versions(&args.root, &config),
        Command::Increment { policy } => run_increment(&args.root, &config, &policy),
        Command::Prepare {
            version,
            allow_dirty,
            no_commit,
        } => run_prepare(
            &args.root,
            &config,
            &version,
            PrepareOptions {
                allow_dirty,
                commit: !no_commit,
            },
        ),
        Command::Tag {
            version,
            yes,
            no_push,
        } => run_tag(&args.root, &config, &version, yes, no_push),
    }
}

fn open_repository(root: &Path) -> Result<Git2Repository> {
    Git2Repository::open(root).context("Git repository error")
}

fn run_validate(root: &Path, config: &Config, target: Option<&str>, json: bool) -> Result<ExitCode> {
    let result = ConsistencyChecker::new(root, &config.files).validate_consistency(target);

    if json {
        println!("{}", result.to_json()?);
    } else {
        ui::display_validation(&result);
    }
    Ok(exit_code(result.is_valid()))
}

fn run_changelog(
    root: &Path,
    config: &Config,
    version: &str,
    milestone: Option<Milestone>,
    output: Option<PathBuf>,
    format: ChangelogFormat,
) -> Result<ExitCode> {
    let version = match Version::parse(version) {
        Ok(v) => v,
        Err(e) => {
            ui::display_error(&e.to_string());
            eprintln!("Expected format: X.Y.Z or X.Y.Z-prerelease");
            return Ok(ExitCode::FAILURE);
        }
    };
    let milestone = milestone.unwrap_or_else(|| milestone_for(&version));

    // History is best-effort: outside a repository the changelog has no commits
    let history: Box<dyn History> = match Git2Repository::open(root) {
        Ok(repo) => Box::new(repo),
        Err(e) => {
            debug!(error = %e, "no repository, generating without history");
            Box::new(NoRepository::new(e.to_string()))
        }
    };

    let document = ChangelogGenerator::new(history.as_ref(), &config.project).generate_format_at(
        &version,
        milestone,
        format,
        Utc::now().date_naive(),
    )?;

    match output {
        Some(path) => {
            document.write_to(&path)?;
            ui::display_success(&format!("Changelog written to: {}", path.display()));
        }
        None => println!("{}", document.content),
    }
    Ok(ExitCode::SUCCESS)
}

fn run_status(root: &Path, config: &Config) -> Result<ExitCode> {
    let repo = open_repository(root)?;
    let manager = ReleaseManager::new(root, config, &repo);

    let report = manager.status();
    ui::display_status_report(&report);
    if report.latest_tag.is_none() {
        ui::display_warning(&ReleaseWarning::NoPriorTag);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_versions(root: &Path, config: &Config) -> Result<ExitCode> {
    let repo = open_repository(root)?;
    let manager = ReleaseManager::new(root, config, &repo);

    let report = manager.versions()?;
    print!("{}", ui::format_versions(&report, &config.project.remote));
    if let Err(reason) = &report.remote {
        ui::display_warning(&ReleaseWarning::RemoteUnavailable {
            remote: config.project.remote.clone(),
            reason: reason.clone(),
        });
    }
    Ok(ExitCode::SUCCESS)
}

fn run_increment(root: &Path, config: &Config, policy: &str) -> Result<ExitCode> {
    let next = next_version(root, &config.files, policy)?;
    println!("{}", next);
    Ok(ExitCode::SUCCESS)
}

fn run_prepare(
    root: &Path,
    config: &Config,
    version: &str,
    options: PrepareOptions,
) -> Result<ExitCode> {
    let repo = open_repository(root)?;
    let manager = ReleaseManager::new(root, config, &repo);

    ui::display_status(&format!("Preparing release {}", version));
    let outcome = manager.prepare(version, options)?;

    ui::display_success(&format!(
        "Updated version declarations to {} ({})",
        outcome.version, outcome.milestone
    ));
    for warning in outcome.validation.warnings() {
        ui::display_status(&format!("Warning: {}", warning));
    }
    ui::display_success(&format!(
        "Release notes written to: {}",
        outcome.release_notes.display()
    ));
    match &outcome.commit {
        Some(hash) => ui::display_success(&format!(
            "Committed {}",
            hash.get(..8).unwrap_or(hash)
        )),
        None => ui::display_status("Changes left uncommitted"),
    }
    Ok(ExitCode::SUCCESS)
}

fn run_tag(root: &Path, config: &Config, version: &str, yes: bool, no_push: bool) -> Result<ExitCode> {
    let repo = open_repository(root)?;
    let manager = ReleaseManager::new(root, config, &repo);

    let plan = manager.plan_tag(version)?;
    ui::display_status(&format!("Tag {}: {}", plan.tag, plan.message));

    if !yes && !ui::confirm_action(&format!("Create tag {}?", plan.tag))? {
        println!("Tag creation cancelled by user.");
        return Ok(ExitCode::SUCCESS);
    }

    manager.create_tag(&plan)?;
    ui::display_success(&format!("Created tag: {}", plan.tag));

    if no_push {
        ui::display_manual_push_instruction(&plan.tag, &config.project.remote);
        return Ok(ExitCode::SUCCESS);
    }

    ui::display_status(&format!(
        "Pushing tag: {} to {}",
        plan.tag, config.project.remote
    ));
    if let Err(e) = manager.push_tag(&plan) {
        ui::display_error(&format!("Failed to push tag '{}': {}", plan.tag, e));
        ui::display_manual_push_instruction(&plan.tag, &config.project.remote);
        return Ok(ExitCode::FAILURE);
    }
    ui::display_success(&format!(
        "Pushed tag: {} to {}",
        plan.tag, config.project.remote
    ));
    Ok(ExitCode::SUCCESS)
}
