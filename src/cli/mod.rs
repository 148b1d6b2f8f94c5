//! CLI definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Log verbosity, named the way operators of the archive cron jobs know it.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Only failures that stop the run
    Critical,
    /// Errors, including repositories skipped in an owner-wide run
    Error,
    /// Warnings such as failed mirrors
    Warning,
    /// Progress and rate-limit waits (default)
    #[default]
    Info,
    /// Every skip/full/delta decision and request
    Debug,
    /// Everything, including dependencies
    Trace,
}

impl LogLevel {
    /// `EnvFilter` directive for this level.
    #[must_use]
    pub const fn filter(self) -> &'static str {
        match self {
            Self::Critical | Self::Error => "error",
            Self::Warning => "warn",
            Self::Info => "info",
            Self::Debug => "debug,hyper=info,reqwest=info",
            Self::Trace => "trace",
        }
    }
}

/// Archive a GitHub repository (or every repository of an owner) into a
/// re-runnable local snapshot: git mirrors plus issues, pull requests,
/// comments, labels, milestones, releases and their assets.
#[derive(Parser, Debug)]
#[command(name = "github-dl", author, version, about, long_about = None)]
pub struct Cli {
    /// Login the token belongs to (used for git authentication)
    pub token_user: String,

    /// Personal access token
    pub token: String,

    /// User or organization that owns the repositories
    pub owner: String,

    /// Repository to archive; every repository of OWNER when omitted
    pub repo: Option<String>,

    /// Log level
    #[arg(short, long, value_enum, default_value_t)]
    pub loglevel: LogLevel,

    /// Snapshot root; data lands in <DL_DIR>/<OWNER>/<REPO>/
    #[arg(short, long, env = "GITHUB_DL_DIR", default_value = ".")]
    pub dl_dir: PathBuf,

    /// REST API base (default: https://api.github.com)
    #[arg(long, env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    /// Git clone base (default: https://github.com)
    #[arg(long, env = "GITHUB_GIT_URL")]
    pub git_url: Option<String>,

    /// Skip the source and wiki git mirrors
    #[arg(long)]
    pub no_git: bool,

    /// Print the run summary (or error) as JSON
    #[arg(long)]
    pub json: bool,

    /// Quiet mode (no output except errors)
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}
