//! Archive command implementation.

use colored::Colorize;
use serde::Serialize;

use crate::cli::Cli;
use crate::config::{ArchiveConfig, Credentials, resolve_api_url, resolve_git_url};
use crate::error::{Error, Result};
use crate::sync::{Archiver, MirrorStatus, ResourceStats, RunReport};

#[derive(Serialize)]
struct SummaryOutput<'a> {
    success: bool,
    total: usize,
    #[serde(flatten)]
    report: &'a RunReport,
}

/// Build the run configuration from parsed arguments.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] or [`Error::Config`] if the
/// arguments do not describe a usable run.
pub fn build_config(cli: &Cli) -> Result<ArchiveConfig> {
    let credentials = Credentials::new(cli.token_user.as_str(), cli.token.as_str());
    let mut config = ArchiveConfig::new(credentials, cli.owner.as_str())
        .with_dl_dir(cli.dl_dir.clone())
        .with_api_url(&resolve_api_url(cli.api_url.as_deref()))
        .with_git_url(&resolve_git_url(cli.git_url.as_deref()))
        .with_git_mirrors(!cli.no_git);
    if let Some(repo) = &cli.repo {
        config = config.with_repo(repo.as_str());
    }

    config.validate()?;
    Ok(config)
}

/// Execute the archive command.
///
/// # Errors
///
/// Returns the first error of a single-repository run, a fatal error of an
/// owner-wide run, or [`Error::PartialFailure`] once an owner-wide run has
/// finished with at least one failed repository.
pub fn execute(cli: &Cli) -> Result<()> {
    let config = build_config(cli)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Config(format!("Failed to create async runtime: {e}")))?;
    let report = rt.block_on(async {
        let archiver = Archiver::new(config)?;
        archiver.run().await
    })?;

    if cli.json {
        let output = SummaryOutput {
            success: report.is_success(),
            total: report.total(),
            report: &report,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if !cli.quiet {
        print_summary(&report);
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(Error::PartialFailure {
            failed: report.failures.len(),
            total: report.total(),
        })
    }
}

fn print_summary(report: &RunReport) {
    for repo in &report.repositories {
        let stats = &repo.stats;
        println!();
        println!("{}", format!("{}/{}", repo.owner, repo.repo).cyan().bold());
        match &stats.issues {
            Some(issues) => print_parent("Issues", issues),
            None => println!("  {:<12} {}", "Issues:", "disabled".dimmed()),
        }
        print_parent("Pulls", &stats.pulls);
        print_flat("Labels", &stats.labels);
        print_flat("Milestones", &stats.milestones);
        print_parent("Releases", &stats.releases);
        print_mirror("Source", &stats.source);
        print_mirror("Wiki", &stats.wiki);
    }

    if !report.failures.is_empty() {
        println!();
        println!("{}", "Failed".red().bold());
        for failure in &report.failures {
            println!(
                "  {}/{} {} {}",
                failure.owner,
                failure.repo,
                format!("[{}]", failure.code).yellow(),
                failure.error
            );
        }
    }

    println!();
    let synced = report.repositories.len();
    if report.is_success() {
        println!("{} {synced} repositories synced", "✓".green());
    } else {
        println!(
            "{} {synced} synced, {} failed",
            "!".yellow(),
            report.failures.len()
        );
    }
}

fn print_parent(label: &str, stats: &ResourceStats) {
    println!(
        "  {:<12} {} fetched, {} skipped, {} full, {} delta, {} written, {} children",
        format!("{label}:"),
        stats.fetched,
        stats.skipped,
        stats.full,
        stats.delta,
        stats.written,
        stats.children
    );
}

fn print_flat(label: &str, stats: &ResourceStats) {
    println!(
        "  {:<12} {} fetched, {} written",
        format!("{label}:"),
        stats.fetched,
        stats.written
    );
}

fn print_mirror(label: &str, status: &MirrorStatus) {
    let shown = match status {
        MirrorStatus::Skipped => "skipped".dimmed().to_string(),
        MirrorStatus::Cloned => "cloned".green().to_string(),
        MirrorStatus::Updated => "updated".green().to_string(),
        MirrorStatus::Failed { error } => format!("{} {error}", "failed".red()),
    };
    println!("  {:<12} {shown}", format!("{label}:"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_build_config_single_repository() {
        let cli = Cli::parse_from([
            "github-dl",
            "me",
            "tok",
            "octocat",
            "hello",
            "--api-url",
            "https://ghe.example.com/api/v3/",
            "--git-url",
            "https://ghe.example.com",
            "--no-git",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.repo.as_deref(), Some("hello"));
        assert_eq!(config.api_url, "https://ghe.example.com/api/v3");
        assert!(!config.mirror_git);
    }

    #[test]
    fn test_build_config_rejects_bad_owner() {
        let cli = Cli::parse_from(["github-dl", "me", "tok", "../etc"]);
        let err = build_config(&cli).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
